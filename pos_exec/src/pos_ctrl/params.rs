//! Position control parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};
use std::time::Duration;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for position control
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Params {
    /// Maximum magnitude of the linear velocity demand
    pub max_linear_velocity_ms: f64,

    /// Maximum magnitude of the angular velocity demand
    pub max_angular_velocity_rads: f64,

    /// Distance from the target within which the goal is considered reached
    pub max_distance_error_m: f64,

    /// Rate at which the control loop runs
    pub rate_hz: f64,

    /// Misalignment tolerated when working out the sense of the heading error.
    ///
    /// After rotating the heading by the unsigned error, anything further than this from the path
    /// means the rotation should have been clockwise.
    pub heading_align_tol_rad: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Params {
    /// Time between two control ticks.
    ///
    /// Only meaningful for a positive, finite `rate_hz`, which `PosCtrl::new` checks.
    pub fn tick_period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.rate_hz)
    }
}

impl Default for Params {
    fn default() -> Self {
        Self {
            max_linear_velocity_ms: 2.0,
            max_angular_velocity_rads: 1.0,
            max_distance_error_m: 0.1,
            rate_hz: 5.0,
            heading_align_tol_rad: 1e-6,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_params_defaults() {
        // Missing keys fall back to the defaults
        let p: Params = toml::from_str("rate_hz = 10.0").unwrap();

        assert_eq!(p.rate_hz, 10.0);
        assert_eq!(p.max_linear_velocity_ms, 2.0);
        assert_eq!(p.max_angular_velocity_rads, 1.0);
        assert_eq!(p.max_distance_error_m, 0.1);
        assert_eq!(p.tick_period(), Duration::from_millis(100));
        assert_eq!(Params::default().tick_period(), Duration::from_millis(200));
    }
}
