//! # Velocity Command Messages

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use chrono::{serde::ts_milliseconds, DateTime, Utc};
use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A timestamped velocity demand sent to the mobile base.
///
/// A command with both velocities at zero is the canonical stop demand.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct CmdVel {
    /// UTC timestamp at which the command was issued
    #[serde(with = "ts_milliseconds")]
    pub timestamp: DateTime<Utc>,

    /// Speed along the base's forward (X+) axis.
    ///
    /// Units: meters/second
    pub linear_x_ms: f64,

    /// Turn rate about the base's Z+ (upwards) axis. Follows the right hand rule, so positive rates
    /// turn the base to the left.
    ///
    /// Units: radians/second
    pub angular_z_rads: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl CmdVel {
    /// Create a new command timestamped now.
    pub fn new(linear_x_ms: f64, angular_z_rads: f64) -> Self {
        Self {
            timestamp: Utc::now(),
            linear_x_ms,
            angular_z_rads,
        }
    }

    /// Create a stop command timestamped now.
    pub fn stop() -> Self {
        Self::new(0.0, 0.0)
    }

    /// Returns true if this command demands zero motion.
    pub fn is_stop(&self) -> bool {
        self.linear_x_ms == 0.0 && self.angular_z_rads == 0.0
    }
}

impl Default for CmdVel {
    fn default() -> Self {
        Self::stop()
    }
}
