//! Main position executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise the session, logging and parameters
//!     - Start the simulation client, which provides the pose and accepts velocity commands
//!     - Start the goal server, which executes goals on its own thread
//!     - Main loop:
//!         - Telecommand processing from the goal script
//!         - Collection and archiving of goal results
//!     - Once the script has ended wait for the active goal, then shut everything down
//!
//! Position control itself does not run in the main loop, it runs at its own rate inside the goal
//! server.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Report};
use log::{debug, info, warn};
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};
use structopt::StructOpt;

// Internal
use comms_if::tc::GoalResult;
use pos_lib::{
    goal_exec::{GoalServer, GoalServerError},
    loc::PoseCache,
    pos_ctrl::Params,
    sim_client::{SimClient, SimParams},
    tc_processor,
};
use util::{
    logger::{logger_init, LevelFilter},
    raise_error,
    script_interpreter::{PendingTcs, ScriptInterpreter},
    session::{self, Session},
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Target period of one cycle.
const CYCLE_PERIOD_S: f64 = 0.10;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Command line options
#[derive(Debug, StructOpt)]
#[structopt(name = "pos_exec", about = "Drives the base to position goals read from a script")]
struct Opts {
    /// Path to the goal script
    #[structopt(parse(from_os_str))]
    script: PathBuf,

    /// Time to wait for the active goal to finish once the script has ended, in seconds
    #[structopt(long, default_value = "30")]
    end_timeout: f64,

    /// Minimum level of log messages, one of info, debug or trace
    #[structopt(long, default_value = "debug")]
    log_level: LevelFilter,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let opts = Opts::from_args();

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("pos_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(opts.log_level, &session).wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Position Goal Executable\n");
    info!("Session directory: {:?}\n", session.session_root);
    debug!("CLI options: {:?}", opts);

    // ---- LOAD PARAMETERS ----

    let pos_ctrl_params: Params =
        util::params::load("pos_ctrl.toml").wrap_err("Could not load pos_ctrl params")?;
    let sim_params: SimParams =
        util::params::load("sim.toml").wrap_err("Could not load sim params")?;

    info!("Exec parameters loaded");
    debug!("PosCtrl params: {:#?}", pos_ctrl_params);

    // ---- LOAD SCRIPT ----

    info!("Loading script from {:?}", opts.script);

    let mut si = ScriptInterpreter::new(&opts.script).wrap_err("Failed to load script")?;

    info!(
        "Loaded script lasts {:.02} s and contains {} TCs\n",
        si.get_duration(),
        si.get_num_tcs()
    );

    // ---- INITIALISE MODULES ----

    info!("Initialising modules...");

    let pose_cache = PoseCache::default();

    let mut sim_client = SimClient::start(sim_params, pose_cache.clone())
        .wrap_err("Failed to start the SimClient")?;
    info!("SimClient initialised");

    let server = GoalServer::new(pos_ctrl_params, pose_cache, sim_client.sink())
        .wrap_err("Failed to start the GoalServer")?;
    info!("GoalServer initialised");

    info!("Module initialisation complete\n");

    // ---- MAIN LOOP ----

    info!("Begining main loop\n");

    let mut end_of_script: Option<Instant> = None;
    let end_timeout = Duration::from_secs_f64(opts.end_timeout.max(0.0));

    loop {
        let cycle_start_instant = Instant::now();

        // ---- TELECOMMAND PROCESSING ----

        match si.get_pending_tcs() {
            PendingTcs::None => (),
            PendingTcs::Some(tcs) => {
                for tc in tcs.iter() {
                    match tc_processor::exec(&server, tc) {
                        Ok(_) => (),
                        Err(GoalServerError::NonFiniteGoal(x, y)) => {
                            warn!("Rejected goal with non-finite target ({}, {})", x, y)
                        }
                        Err(e) => raise_error!("Goal server failed: {}", e),
                    }
                }
            }
            PendingTcs::EndOfScript => {
                if end_of_script.is_none() {
                    info!("End of script reached");
                    end_of_script = Some(Instant::now());
                }
            }
        }

        // ---- GOAL RESULTS ----

        while let Some(result) = server.try_recv_result() {
            handle_result(result);
        }

        if let Some(report) = server.last_report() {
            debug!(
                "dist_err = {:.3} m, head_err = {:.3} rad",
                report.dist_error_m, report.head_error_rad
            );
        }

        // ---- END OF EXECUTION ----

        if let Some(eos) = end_of_script {
            match server.active_goal() {
                None => break,
                Some(id) if eos.elapsed() > end_timeout => {
                    warn!(
                        "Goal {} still active {:.1} s after the end of the script",
                        id,
                        end_timeout.as_secs_f64()
                    );
                    break;
                }
                Some(_) => (),
            }
        }

        // ---- CYCLE MANAGEMENT ----

        let cycle_dur = Instant::now() - cycle_start_instant;

        // Get sleep duration
        match Duration::from_secs_f64(CYCLE_PERIOD_S).checked_sub(cycle_dur) {
            Some(d) => thread::sleep(d),
            None => warn!(
                "Cycle overran by {:.06} s",
                cycle_dur.as_secs_f64() - CYCLE_PERIOD_S
            ),
        }
    }

    // ---- SHUTDOWN ----

    info!("Shutting down");

    for result in server.shutdown().wrap_err("Failed to shut down the GoalServer")? {
        handle_result(result);
    }

    sim_client.stop();

    info!("End of execution");

    session.exit();

    Ok(())
}

/// Log a goal result and archive it in the session.
fn handle_result(result: GoalResult) {
    info!(
        "Goal {} {} after {:.2} s, target ({:.3}, {:.3})",
        result.id, result.outcome, result.elapsed_s, result.target.x_m, result.target.y_m
    );

    session::save(format!("goals/goal_{}.json", result.id.0), result);
}
