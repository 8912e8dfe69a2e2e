//! # Communications interface crate.
//!
//! Provides the messages passed across the position executor's ports: pose data coming in from the
//! odometry source, velocity demands going out to the base, and the goal telecommands (plus their
//! results) exchanged with whatever transport delivers goals.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Goal telecommands and their results
pub mod tc;

/// Message definitions for equipment (odometry source, velocity sink)
pub mod eqpt;
