//! # Position control module
//!
//! Position control computes, once per tick, the velocity command which drives the base towards a
//! single target point. There is no path: the base turns towards the point and drives at it at the
//! same time.
//!
//! The distance error is the length of the path vector, the vector from the current position to
//! the target. The heading error is the signed angle between the direction the base is facing and
//! the path vector, positive meaning the base must turn anticlockwise. Both errors are used
//! directly as the linear and angular velocity demands, saturated to the platform limits. Once the
//! distance error is within tolerance the goal is reached and a stop is issued instead.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod params;
pub mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use params::Params;
pub use state::*;
