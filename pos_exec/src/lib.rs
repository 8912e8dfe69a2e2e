//! # Position executable library.
//!
//! This library allows other crates in the workspace to access items defined inside the position
//! executable crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Command sinks - where velocity commands produced by goal execution are sent
pub mod cmd_sink;

/// Planar geometry - distance and heading error helpers
pub mod geom;

/// Goal execution - accepts goals and drives each one to a terminal outcome
pub mod goal_exec;

/// Localisation module - holds the latest pose of the base
pub mod loc;

/// Position control module - converts the pose and goal into a velocity command each tick
pub mod pos_ctrl;

/// Simulation client - a kinematic simulation acting as both pose source and command sink
pub mod sim_client;

/// Telecommand processor - routes goal telecommands to the goal server
pub mod tc_processor;
