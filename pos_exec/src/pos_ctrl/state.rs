//! Position control module state

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;
use nalgebra::Vector2;
use serde::Serialize;

// Internal
use super::*;
use crate::{geom, loc::Pose};
use comms_if::eqpt::cmd_vel::CmdVel;
use util::maths::clamp_abs;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

pub struct PosCtrl {
    params: Params,

    report: StatusReport,
}

/// Input data to a single processing tick.
#[derive(Debug, Copy, Clone)]
pub struct InputData {
    /// Latest known pose of the base
    pub pose: Pose,

    /// Point the base is being driven to
    pub target_m: Vector2<f64>,
}

/// The status report containing the monitoring quantities of the last tick.
#[derive(Debug, Default, Copy, Clone, Serialize)]
pub struct StatusReport {
    /// Distance between the base and the target
    pub dist_error_m: f64,

    /// Heading of the base
    pub heading_rad: f64,

    /// Signed heading error to the path vector, positive anticlockwise
    pub head_error_rad: f64,

    /// If true the linear demand was saturated to the limit
    pub linear_limit_exceeded: bool,

    /// If true the angular demand was saturated to the limit
    pub angular_limit_exceeded: bool,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Output of a processing tick.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum PosCtrlOutput {
    /// The base is outside tolerance, drive with this command
    Drive(CmdVel),

    /// The base is within tolerance of the target
    Reached,
}

/// Potential errors that can occur during processing of the module.
#[derive(Debug, thiserror::Error)]
pub enum PosCtrlError {
    /// A limit or rate parameter is zero, negative or not finite.
    #[error("Invalid parameter {0} = {1}, must be positive and finite")]
    InvalidParam(&'static str, f64),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PosCtrl {
    /// Initialise the PosCtrl module from the given parameters.
    pub fn new(params: Params) -> Result<Self, PosCtrlError> {
        let checks = [
            ("max_linear_velocity_ms", params.max_linear_velocity_ms),
            ("max_angular_velocity_rads", params.max_angular_velocity_rads),
            ("max_distance_error_m", params.max_distance_error_m),
            ("rate_hz", params.rate_hz),
        ];

        for &(name, value) in checks.iter() {
            if !value.is_finite() || value <= 0.0 {
                return Err(PosCtrlError::InvalidParam(name, value));
            }
        }

        // Zero is allowed here, it means exact alignment is required
        if !params.heading_align_tol_rad.is_finite() || params.heading_align_tol_rad < 0.0 {
            return Err(PosCtrlError::InvalidParam(
                "heading_align_tol_rad",
                params.heading_align_tol_rad,
            ));
        }

        Ok(Self {
            params,
            report: StatusReport::default(),
        })
    }

    /// Process position control for one tick.
    ///
    /// Processing involves:
    ///  1. Computing the path vector and distance error to the target.
    ///  1. If outside tolerance, computing the signed heading error and saturating both errors
    ///     into a velocity command.
    ///
    /// A NaN distance error is never greater than the tolerance, so a NaN pose reports `Reached`.
    pub fn proc(&mut self, input: &InputData) -> (PosCtrlOutput, StatusReport) {
        self.report = StatusReport::default();

        let path = geom::subtract(&input.target_m, &input.pose.position_m);
        let dist_error_m = geom::length(&path);
        self.report.dist_error_m = dist_error_m;

        if dist_error_m.is_nan() || dist_error_m <= self.params.max_distance_error_m {
            trace!("Within tolerance, distance error {:.4} m", dist_error_m);
            return (PosCtrlOutput::Reached, self.report);
        }

        let heading_rad = input.pose.get_heading();
        let head_error_rad = geom::signed_heading_error(
            &geom::heading_vector(heading_rad),
            &path,
            self.params.heading_align_tol_rad,
        );
        self.report.heading_rad = heading_rad;
        self.report.head_error_rad = head_error_rad;

        let linear_ms = clamp_abs(dist_error_m, self.params.max_linear_velocity_ms);
        let angular_rads = clamp_abs(head_error_rad, self.params.max_angular_velocity_rads);
        self.report.linear_limit_exceeded = linear_ms != dist_error_m;
        self.report.angular_limit_exceeded = angular_rads != head_error_rad;

        trace!(
            "dist_err = {:.4} m, head_err = {:.4} rad, cmd = ({:.4} m/s, {:.4} rad/s)",
            dist_error_m,
            head_error_rad,
            linear_ms,
            angular_rads
        );

        (
            PosCtrlOutput::Drive(CmdVel::new(linear_ms, angular_rads)),
            self.report,
        )
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use comms_if::eqpt::odom::OdomMsg;
    use std::f64::consts::FRAC_PI_2;

    fn input(position: [f64; 2], heading_rad: f64, target: [f64; 2]) -> InputData {
        InputData {
            pose: Pose::from(&OdomMsg::from_heading(position, heading_rad)),
            target_m: Vector2::new(target[0], target[1]),
        }
    }

    fn drive(out: PosCtrlOutput) -> CmdVel {
        match out {
            PosCtrlOutput::Drive(c) => c,
            PosCtrlOutput::Reached => panic!("Expected a drive command, got Reached"),
        }
    }

    #[test]
    fn test_saturation() -> Result<(), PosCtrlError> {
        let mut ctrl = PosCtrl::new(Params::default())?;

        // 5 m ahead, linear saturates to 2 m/s
        let (out, rpt) = ctrl.proc(&input([0.0, 0.0], 0.0, [5.0, 0.0]));
        let cmd = drive(out);
        assert_eq!(cmd.linear_x_ms, 2.0);
        assert!(cmd.angular_z_rads.abs() < 1e-9);
        assert!(rpt.linear_limit_exceeded);
        assert!(!rpt.angular_limit_exceeded);
        assert_eq!(rpt.dist_error_m, 5.0);

        // Target behind and slightly to the right gives a heading error near -3 rad, saturated
        // to -1 rad/s
        let (out, rpt) = ctrl.proc(&input([0.0, 0.0], 0.0, [-1.0, -0.142]));
        let cmd = drive(out);
        assert!((rpt.head_error_rad + 3.0).abs() < 0.01);
        assert_eq!(cmd.angular_z_rads, -1.0);
        assert!(rpt.angular_limit_exceeded);

        // Inside the limits nothing is clamped
        let (out, rpt) = ctrl.proc(&input([0.0, 0.0], 0.0, [0.5, 0.0]));
        assert_eq!(drive(out).linear_x_ms, 0.5);
        assert!(!rpt.linear_limit_exceeded);

        Ok(())
    }

    #[test]
    fn test_turn_direction() -> Result<(), PosCtrlError> {
        let mut ctrl = PosCtrl::new(Params {
            max_angular_velocity_rads: 2.0,
            ..Default::default()
        })?;

        let (out, _) = ctrl.proc(&input([0.0, 0.0], 0.0, [0.0, 1.0]));
        assert!((drive(out).angular_z_rads - FRAC_PI_2).abs() < 1e-9);

        let (out, _) = ctrl.proc(&input([0.0, 0.0], 0.0, [0.0, -1.0]));
        assert!((drive(out).angular_z_rads + FRAC_PI_2).abs() < 1e-9);

        // Facing +Y, a target along +X needs a clockwise turn
        let (out, _) = ctrl.proc(&input([1.0, 1.0], FRAC_PI_2, [3.0, 1.0]));
        assert!((drive(out).angular_z_rads + FRAC_PI_2).abs() < 1e-9);

        Ok(())
    }

    #[test]
    fn test_reached() -> Result<(), PosCtrlError> {
        let mut ctrl = PosCtrl::new(Params::default())?;

        let (out, rpt) = ctrl.proc(&input([0.0, 0.0], 0.0, [0.05, 0.0]));
        assert_eq!(out, PosCtrlOutput::Reached);
        assert_eq!(rpt.dist_error_m, 0.05);

        // Exactly on the tolerance is reached
        let (out, _) = ctrl.proc(&input([0.0, 0.0], 1.0, [0.1, 0.0]));
        assert_eq!(out, PosCtrlOutput::Reached);

        // A NaN pose cannot exceed the tolerance
        let (out, rpt) = ctrl.proc(&input([f64::NAN, 0.0], 0.0, [1.0, 0.0]));
        assert_eq!(out, PosCtrlOutput::Reached);
        assert!(rpt.dist_error_m.is_nan());

        Ok(())
    }

    #[test]
    fn test_invalid_params() {
        assert!(matches!(
            PosCtrl::new(Params {
                rate_hz: 0.0,
                ..Default::default()
            }),
            Err(PosCtrlError::InvalidParam("rate_hz", _))
        ));
        assert!(matches!(
            PosCtrl::new(Params {
                max_linear_velocity_ms: f64::INFINITY,
                ..Default::default()
            }),
            Err(PosCtrlError::InvalidParam("max_linear_velocity_ms", _))
        ));
        assert!(PosCtrl::new(Params {
            heading_align_tol_rad: 0.0,
            ..Default::default()
        })
        .is_ok());
    }
}
