//! Executor thread, runs each accepted goal to its terminal outcome one at a time.

// -----------------------------------------------------------------------------------------------
// INCLUDES
// -----------------------------------------------------------------------------------------------

use std::{
    collections::VecDeque,
    sync::{
        atomic::Ordering,
        mpsc::{Receiver, RecvTimeoutError, Sender},
        Arc,
    },
    time::Instant,
};

use comms_if::{
    eqpt::cmd_vel::CmdVel,
    tc::{GoalOutcome, GoalResult},
};
use log::{debug, info, warn};
use nalgebra::Vector2;

use crate::pos_ctrl::{InputData, PosCtrl, PosCtrlOutput};

use super::{GoalHandle, GoalServerError, Shared};

// -----------------------------------------------------------------------------------------------
// ENUMS
// -----------------------------------------------------------------------------------------------

/// Signals from the server to the executor. Any signal wakes the executor from its tick wait.
#[derive(Debug)]
pub(crate) enum ExecSignal {
    /// A goal has been accepted and should be executed once the current one is done
    Goal(GoalHandle),

    /// The current goal has been cancelled
    Cancel,

    /// The server is shutting down
    Shutdown,
}

// -----------------------------------------------------------------------------------------------
// FUNCTIONS
// -----------------------------------------------------------------------------------------------

pub(super) fn worker_thread(
    shared: Arc<Shared>,
    mut pos_ctrl: PosCtrl,
    signal_receiver: Receiver<ExecSignal>,
    result_sender: Sender<GoalResult>,
) -> Result<(), GoalServerError> {
    // Goals which arrived while another was executing
    let mut pending: VecDeque<GoalHandle> = VecDeque::new();

    loop {
        if is_shutdown(&shared) {
            break;
        }

        let handle = match pending.pop_front() {
            Some(h) => h,
            None => match signal_receiver.recv() {
                Ok(ExecSignal::Goal(h)) => h,
                Ok(ExecSignal::Cancel) => continue,
                // A dropped server is treated the same as a shutdown
                Ok(ExecSignal::Shutdown) | Err(_) => break,
            },
        };

        if is_shutdown(&shared) {
            pending.push_front(handle);
            break;
        }

        // Goals superseded before they started never drive
        let outcome = if handle.is_preempted() {
            GoalOutcome::Preempted
        } else {
            info!("Executing goal {}", handle.id);
            execute(&shared, &mut pos_ctrl, &handle, &signal_receiver, &mut pending)?
        };

        finish(&shared, &result_sender, &handle, outcome, true)?;
    }

    // Collect any goals still in the channel so they get a result too
    while let Ok(signal) = signal_receiver.try_recv() {
        if let ExecSignal::Goal(h) = signal {
            pending.push_back(h);
        }
    }

    for handle in pending.drain(..) {
        finish(&shared, &result_sender, &handle, GoalOutcome::Aborted, false)?;
    }

    debug!("Executor thread exiting");

    Ok(())
}

/// Run the control loop for a single goal until it reaches a terminal outcome.
///
/// The loop has exactly one exit, the returned outcome. Stops are not issued here, `finish` does
/// that once the outcome is final.
fn execute(
    shared: &Shared,
    pos_ctrl: &mut PosCtrl,
    handle: &GoalHandle,
    signal_receiver: &Receiver<ExecSignal>,
    pending: &mut VecDeque<GoalHandle>,
) -> Result<GoalOutcome, GoalServerError> {
    let target_m = Vector2::new(handle.target.x_m, handle.target.y_m);
    let period = shared.params.tick_period();
    let mut next_tick = Instant::now();

    let outcome = loop {
        let input = InputData {
            pose: shared.pose_cache.get_pose(),
            target_m,
        };
        let (output, report) = pos_ctrl.proc(&input);
        *shared.report.lock()? = Some(report);

        if handle.is_preempted() {
            break GoalOutcome::Preempted;
        }
        if is_shutdown(shared) {
            break GoalOutcome::Aborted;
        }

        match output {
            PosCtrlOutput::Drive(cmd) => {
                let mut cmd_out = shared.output.lock()?;

                // Checked again under the lock, a stop may have been sent since the check above
                if handle.is_preempted() {
                    break GoalOutcome::Preempted;
                }

                cmd_out.emit(cmd);
            }
            PosCtrlOutput::Reached => break GoalOutcome::Succeeded,
        }

        // ---- TICK MANAGEMENT ----

        next_tick += period;

        let now = Instant::now();
        if next_tick <= now {
            warn!(
                "Goal {} tick overran by {:.06} s",
                handle.id,
                (now - next_tick).as_secs_f64()
            );
            next_tick = now;
        } else {
            wait_until(next_tick, shared, handle, signal_receiver, pending);
        }
    };

    Ok(outcome)
}

/// Wait for the tick deadline, returning early if the goal is preempted or the server is shut
/// down.
fn wait_until(
    deadline: Instant,
    shared: &Shared,
    handle: &GoalHandle,
    signal_receiver: &Receiver<ExecSignal>,
    pending: &mut VecDeque<GoalHandle>,
) {
    loop {
        let now = Instant::now();
        if now >= deadline {
            return;
        }

        match signal_receiver.recv_timeout(deadline - now) {
            Ok(ExecSignal::Goal(h)) => pending.push_back(h),
            Ok(ExecSignal::Cancel) | Ok(ExecSignal::Shutdown) => (),
            Err(RecvTimeoutError::Timeout) => return,
            Err(RecvTimeoutError::Disconnected) => {
                shared.shutdown.store(true, Ordering::SeqCst);
                return;
            }
        }

        if handle.is_preempted() || is_shutdown(shared) {
            return;
        }
    }
}

/// Make the outcome final and report it.
///
/// A goal preempted at any point before this reports `Preempted`, since the stop for it has
/// already gone out. Otherwise a stop is issued if the goal was executing.
fn finish(
    shared: &Shared,
    result_sender: &Sender<GoalResult>,
    handle: &GoalHandle,
    outcome: GoalOutcome,
    executed: bool,
) -> Result<(), GoalServerError> {
    let outcome = {
        let mut current = shared.current.lock()?;

        let outcome = {
            let mut cmd_out = shared.output.lock()?;

            if handle.is_preempted() {
                GoalOutcome::Preempted
            } else {
                if executed {
                    cmd_out.emit(CmdVel::stop());
                }
                outcome
            }
        };

        if current.as_ref().map(|c| c.id) == Some(handle.id) {
            *current = None;
        }

        outcome
    };

    *shared.report.lock()? = None;

    let result = GoalResult {
        id: handle.id,
        target: handle.target,
        outcome,
        elapsed_s: handle.accepted_at.elapsed().as_secs_f64(),
    };

    match outcome {
        GoalOutcome::Succeeded => info!("Goal {} succeeded in {:.3} s", result.id, result.elapsed_s),
        GoalOutcome::Preempted => info!("Goal {} preempted", result.id),
        GoalOutcome::Aborted => warn!("Goal {} aborted", result.id),
    }

    if result_sender.send(result).is_err() {
        debug!("Result receiver dropped, goal {} result discarded", handle.id);
    }

    Ok(())
}

fn is_shutdown(shared: &Shared) -> bool {
    shared.shutdown.load(Ordering::SeqCst)
}
