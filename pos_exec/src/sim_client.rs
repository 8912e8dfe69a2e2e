//! # Simulation Client
//!
//! The SimClient provides a simple kinematic simulation of the base so that goals can be executed
//! without any hardware. It is to be used for testing and development rather than actual driving.
//! The client acts as both:
//!
//! - the pose source, publishing an `OdomMsg` into the pose cache every step, and
//! - the command sink, with `SimClient::sink` giving a `CmdSink` whose commands are applied from
//!   the next step onwards.
//!
//! The base is modelled as a unicycle driven by the latest velocity command. Position and heading
//! are integrated with a fixed step at `SimParams::rate_hz` in a background thread.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use comms_if::eqpt::{cmd_vel::CmdVel, odom::OdomMsg};
use log::{debug, info, trace, warn};
use serde::Deserialize;
use util::maths::wrap_pi;

use crate::{cmd_sink::CmdSink, loc::PoseCache};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters for the simulation
#[derive(Debug, Clone, Deserialize)]
pub struct SimParams {
    /// Integration rate of the simulation
    pub rate_hz: f64,

    /// Position the base starts at
    #[serde(default)]
    pub initial_position_m: [f64; 2],

    /// Heading the base starts at
    #[serde(default)]
    pub initial_heading_rad: f64,
}

pub struct SimClient {
    bg_jh: Option<JoinHandle<()>>,
    bg_run: Arc<AtomicBool>,
    dems: Arc<Mutex<CmdVel>>,
}

/// Command sink feeding velocity commands into the simulation.
#[derive(Clone)]
pub struct SimCmdSink {
    dems: Arc<Mutex<CmdVel>>,
}

/// Simulated state of the base.
#[derive(Debug, Clone, Copy)]
struct SimState {
    position_m: [f64; 2],
    heading_rad: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SimClientError {
    #[error("Invalid simulation rate {0} Hz, must be positive and finite")]
    InvalidRate(f64),

    #[error("Could not spawn the simulation thread: {0}")]
    SpawnError(std::io::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SimClient {
    /// Start the simulation, publishing poses into `pose_cache`.
    ///
    /// The initial pose is published before this function returns.
    pub fn start(params: SimParams, pose_cache: PoseCache) -> Result<Self, SimClientError> {
        if !params.rate_hz.is_finite() || params.rate_hz <= 0.0 {
            return Err(SimClientError::InvalidRate(params.rate_hz));
        }

        let state = SimState {
            position_m: params.initial_position_m,
            heading_rad: wrap_pi(params.initial_heading_rad),
        };
        pose_cache.on_odom(&state.to_odom());

        // Create the data shared objects
        let bg_run = Arc::new(AtomicBool::new(true));
        let dems = Arc::new(Mutex::new(CmdVel::stop()));

        // Create clones of these to pass to the bg thread
        let bg_run_clone = bg_run.clone();
        let dems_clone = dems.clone();
        let period = Duration::from_secs_f64(1.0 / params.rate_hz);

        // Start BG thread
        let bg_jh = thread::Builder::new()
            .name("sim_client::bg".into())
            .spawn(move || bg_thread(state, period, pose_cache, bg_run_clone, dems_clone))
            .map_err(SimClientError::SpawnError)?;

        info!(
            "SimClient started at {:.1} Hz from ({:.3}, {:.3}), heading {:.3} rad",
            params.rate_hz, state.position_m[0], state.position_m[1], state.heading_rad
        );

        Ok(Self {
            bg_jh: Some(bg_jh),
            bg_run,
            dems,
        })
    }

    /// Get a command sink which drives the simulated base.
    pub fn sink(&self) -> SimCmdSink {
        SimCmdSink {
            dems: self.dems.clone(),
        }
    }

    /// Stop the simulation, waiting for the background thread to exit.
    pub fn stop(&mut self) {
        self.bg_run.store(false, Ordering::Relaxed);

        if let Some(jh) = self.bg_jh.take() {
            if jh.join().is_err() {
                warn!("SimClient background thread panicked");
            }
            info!("SimClient stopped");
        }
    }
}

impl Drop for SimClient {
    fn drop(&mut self) {
        self.stop();
    }
}

impl CmdSink for SimCmdSink {
    fn send(&mut self, cmd: &CmdVel) {
        let mut dems = match self.dems.lock() {
            Ok(d) => d,
            Err(e) => e.into_inner(),
        };
        *dems = *cmd;
    }
}

impl SimState {
    /// Advance the state by `dt_s` under the given command.
    fn step(&mut self, cmd: &CmdVel, dt_s: f64) {
        self.position_m[0] += cmd.linear_x_ms * self.heading_rad.cos() * dt_s;
        self.position_m[1] += cmd.linear_x_ms * self.heading_rad.sin() * dt_s;
        self.heading_rad = wrap_pi(self.heading_rad + cmd.angular_z_rads * dt_s);
    }

    fn to_odom(&self) -> OdomMsg {
        OdomMsg::from_heading(self.position_m, self.heading_rad)
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Background thread, steps the simulation and publishes the new pose.
fn bg_thread(
    mut state: SimState,
    period: Duration,
    pose_cache: PoseCache,
    run: Arc<AtomicBool>,
    dems: Arc<Mutex<CmdVel>>,
) {
    let dt_s = period.as_secs_f64();
    let mut next_step = Instant::now() + period;

    // While instructed to run
    while run.load(Ordering::Relaxed) {
        let now = Instant::now();
        if next_step > now {
            thread::sleep(next_step - now);
        }
        next_step += period;

        let cmd = match dems.lock() {
            Ok(d) => *d,
            Err(e) => *e.into_inner(),
        };

        state.step(&cmd, dt_s);
        pose_cache.on_odom(&state.to_odom());

        trace!(
            "Sim pose ({:.4}, {:.4}, {:.4} rad)",
            state.position_m[0],
            state.position_m[1],
            state.heading_rad
        );
    }

    debug!("SimClient background thread exiting");
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::{goal_exec::GoalServer, pos_ctrl::Params};
    use comms_if::tc::{GoalOutcome, PosGoal};
    use std::f64::consts::FRAC_PI_2;

    fn params() -> SimParams {
        SimParams {
            rate_hz: 100.0,
            initial_position_m: [0.0, 0.0],
            initial_heading_rad: 0.0,
        }
    }

    #[test]
    fn test_sim_step() {
        let mut state = SimState {
            position_m: [0.0, 0.0],
            heading_rad: 0.0,
        };

        state.step(&CmdVel::new(1.0, 0.0), 0.5);
        assert!((state.position_m[0] - 0.5).abs() < 1e-12);
        assert!(state.position_m[1].abs() < 1e-12);

        state.step(&CmdVel::new(0.0, 1.0), FRAC_PI_2);
        assert!((state.heading_rad - FRAC_PI_2).abs() < 1e-12);

        state.step(&CmdVel::new(2.0, 0.0), 1.0);
        assert!((state.position_m[0] - 0.5).abs() < 1e-9);
        assert!((state.position_m[1] - 2.0).abs() < 1e-9);

        // Heading stays wrapped
        state.step(&CmdVel::new(0.0, 3.0), 1.0);
        assert!(state.heading_rad <= std::f64::consts::PI);
        assert!(state.heading_rad > -std::f64::consts::PI);
    }

    #[test]
    fn test_sim_publishes_pose() -> Result<(), SimClientError> {
        let cache = PoseCache::default();
        let mut sim = SimClient::start(
            SimParams {
                initial_position_m: [1.0, 2.0],
                initial_heading_rad: FRAC_PI_2,
                ..params()
            },
            cache.clone(),
        )?;

        let pose = cache.get_pose();
        assert_eq!(pose.position_m[0], 1.0);
        assert_eq!(pose.position_m[1], 2.0);
        assert!((pose.get_heading() - FRAC_PI_2).abs() < 1e-9);

        // Drive along +Y
        sim.sink().send(&CmdVel::new(1.0, 0.0));
        thread::sleep(Duration::from_millis(200));
        sim.sink().send(&CmdVel::stop());
        thread::sleep(Duration::from_millis(50));

        let pose = cache.get_pose();
        assert!((pose.position_m[0] - 1.0).abs() < 1e-6);
        assert!(pose.position_m[1] > 2.05);

        sim.stop();

        // No more updates once stopped
        let stopped = cache.get_pose();
        sim.sink().send(&CmdVel::new(1.0, 0.0));
        thread::sleep(Duration::from_millis(50));
        assert_eq!(cache.get_pose(), stopped);

        Ok(())
    }

    #[test]
    fn test_invalid_rate() {
        assert!(matches!(
            SimClient::start(
                SimParams {
                    rate_hz: 0.0,
                    ..params()
                },
                PoseCache::default()
            ),
            Err(SimClientError::InvalidRate(_))
        ));
    }

    #[test]
    fn test_goal_reached_in_sim() {
        let cache = PoseCache::default();
        let mut sim = SimClient::start(params(), cache.clone()).unwrap();

        let server = GoalServer::new(
            Params {
                rate_hz: 20.0,
                ..Default::default()
            },
            cache.clone(),
            sim.sink(),
        )
        .unwrap();

        let target = PosGoal { x_m: 0.6, y_m: 0.3 };
        let id = server.send_goal(target).unwrap();

        let result = server
            .recv_result_timeout(Duration::from_secs(15))
            .unwrap();
        assert_eq!(result.id, id);
        assert_eq!(result.outcome, GoalOutcome::Succeeded);

        let pose = cache.get_pose();
        let dx = target.x_m - pose.position_m[0];
        let dy = target.y_m - pose.position_m[1];
        assert!((dx * dx + dy * dy).sqrt() < 0.15);
        assert!(server.last_cmd().unwrap().is_stop());

        server.shutdown().unwrap();
        sim.stop();
    }
}
