//! # Localisation module
//!
//! This module holds the latest pose of the base as delivered by the pose source. No estimation is
//! performed here, the last received value is simply kept and handed to whoever asks for it.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::sync::{Arc, RwLock};

use comms_if::eqpt::odom::OdomMsg;
use nalgebra::{Quaternion, Vector2};
use serde::{Deserialize, Serialize};

use crate::geom;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The current pose (position and attitude in the odometry frame) of the base.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    /// The position in the odometry frame
    pub position_m: Vector2<f64>,

    /// The attitude of the base in the odometry frame. This is kept exactly as received and is
    /// not normalised.
    pub attitude_q: Quaternion<f64>,
}

/// Shared cache of the most recent pose.
///
/// Cloning the cache gives another handle onto the same pose. Writers overwrite the whole pose,
/// readers take a copy, so neither side ever waits on the other for longer than a copy.
#[derive(Debug, Clone, Default)]
pub struct PoseCache {
    pose: Arc<RwLock<Pose>>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Pose {
    pub fn new(position_m: Vector2<f64>, attitude_q: Quaternion<f64>) -> Self {
        Self {
            position_m,
            attitude_q,
        }
    }

    /// Return the heading (angle to the positive X axis) of the base in radians.
    pub fn get_heading(&self) -> f64 {
        geom::heading_from_quaternion(&self.attitude_q)
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            position_m: Vector2::zeros(),
            attitude_q: Quaternion::identity(),
        }
    }
}

impl From<&OdomMsg> for Pose {
    fn from(msg: &OdomMsg) -> Self {
        let [x, y, z, w] = msg.orientation_q;

        Self {
            position_m: Vector2::new(msg.position_m[0], msg.position_m[1]),
            attitude_q: Quaternion::new(w, x, y, z),
        }
    }
}

impl PoseCache {
    pub fn new(initial: Pose) -> Self {
        Self {
            pose: Arc::new(RwLock::new(initial)),
        }
    }

    /// Pose update handler, replaces the cached pose with the one in the message.
    pub fn on_odom(&self, msg: &OdomMsg) {
        self.set_pose(Pose::from(msg));
    }

    pub fn set_pose(&self, pose: Pose) {
        // A poisoned lock still holds a whole pose, since writes are a single copy
        let mut guard = match self.pose.write() {
            Ok(g) => g,
            Err(e) => e.into_inner(),
        };
        *guard = pose;
    }

    /// Get a snapshot of the latest pose.
    pub fn get_pose(&self) -> Pose {
        match self.pose.read() {
            Ok(g) => *g,
            Err(e) => *e.into_inner(),
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_pose_from_odom() {
        let msg = OdomMsg::now([1.5, -0.5], [0.0, 0.0, 1.0, 0.0]);
        let pose = Pose::from(&msg);

        assert_eq!(pose.position_m, Vector2::new(1.5, -0.5));
        assert_eq!(pose.attitude_q.w, 0.0);
        assert_eq!(pose.attitude_q.k, 1.0);
        assert!((pose.get_heading().abs() - std::f64::consts::PI).abs() < 1e-12);
    }

    #[test]
    fn test_pose_cache_overwrites() {
        let cache = PoseCache::default();
        assert_eq!(cache.get_pose(), Pose::default());
        assert_eq!(cache.get_pose().get_heading(), 0.0);

        let other = cache.clone();
        other.on_odom(&OdomMsg::from_heading([3.0, 4.0], 0.25));
        other.on_odom(&OdomMsg::from_heading([5.0, 6.0], -1.0));

        let pose = cache.get_pose();
        assert_eq!(pose.position_m, Vector2::new(5.0, 6.0));
        assert!((pose.get_heading() + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_pose_cache_initial() {
        // Quarter turn about Z, (w, i, j, k)
        let half = std::f64::consts::FRAC_PI_4;
        let initial = Pose::new(
            Vector2::new(-2.0, 0.5),
            Quaternion::new(half.cos(), 0.0, 0.0, half.sin()),
        );

        let cache = PoseCache::new(initial);
        assert_eq!(cache.get_pose(), initial);
        assert!((cache.get_pose().get_heading() - std::f64::consts::FRAC_PI_2).abs() < 1e-12);

        cache.set_pose(Pose::default());
        assert_eq!(cache.get_pose().position_m, Vector2::zeros());
    }
}
