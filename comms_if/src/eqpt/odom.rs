//! # Odometry Equipment Messages

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use chrono::{serde::ts_milliseconds, DateTime, Utc};
use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A pose message delivered by the odometry (or localisation) source.
///
/// Only the planar part of the pose is carried. The orientation is expected to be a unit
/// quaternion but this is not checked on receipt.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct OdomMsg {
    /// UTC timestamp at which the pose was measured
    #[serde(with = "ts_milliseconds")]
    pub timestamp: DateTime<Utc>,

    /// Position of the base in the odometry frame, `[x, y]`.
    ///
    /// Units: meters
    pub position_m: [f64; 2],

    /// Orientation of the base in the odometry frame as a quaternion, `[x, y, z, w]`.
    pub orientation_q: [f64; 4],
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl OdomMsg {
    /// Build a message timestamped now.
    pub fn now(position_m: [f64; 2], orientation_q: [f64; 4]) -> Self {
        Self {
            timestamp: Utc::now(),
            position_m,
            orientation_q,
        }
    }

    /// Build a message for a planar pose with the given heading, timestamped now.
    ///
    /// The orientation is the pure yaw rotation `[0, 0, sin(h/2), cos(h/2)]`.
    pub fn from_heading(position_m: [f64; 2], heading_rad: f64) -> Self {
        let half = 0.5 * heading_rad;
        Self::now(position_m, [0.0, 0.0, half.sin(), half.cos()])
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_odom_json() {
        let msg = OdomMsg::from_heading([1.0, -2.0], 0.0);

        let json = serde_json::to_string(&msg).unwrap();
        let back: OdomMsg = serde_json::from_str(&json).unwrap();

        assert_eq!(back.position_m, [1.0, -2.0]);
        assert_eq!(back.orientation_q, [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(
            back.timestamp.timestamp_millis(),
            msg.timestamp.timestamp_millis()
        );
    }
}
