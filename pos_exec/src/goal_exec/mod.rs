//! # Goal execution
//!
//! The goal server accepts position goals from the goal transport and drives each one to exactly
//! one terminal outcome. Execution happens on a dedicated worker thread which runs position
//! control at a fixed tick rate, so that the transport and the pose source are never blocked by
//! the control loop.
//!
//! Each goal moves through `Running -> {Succeeded, Preempted, Aborted}`:
//!
//! - `Succeeded` once the base is within tolerance of the target, a stop is issued.
//! - `Preempted` when the goal is cancelled or a newer goal is accepted. The stop is issued by the
//!   caller of `cancel` or `send_goal` at the moment of preemption, not at the next tick.
//! - `Aborted` when the server is shut down, a stop is issued if the goal was running.
//!
//! Only one goal executes at a time. Goals accepted while another is executing preempt it and are
//! started once it has reported.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use std::{
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        mpsc::{channel, Receiver, SendError, Sender},
        Arc, Mutex, PoisonError,
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use comms_if::{
    eqpt::cmd_vel::CmdVel,
    tc::{GoalId, GoalResult, PosGoal},
};
use log::{info, warn};

use crate::{
    cmd_sink::CmdSink,
    loc::PoseCache,
    pos_ctrl::{Params, PosCtrl, PosCtrlError, StatusReport},
};

use self::worker::{worker_thread, ExecSignal};

// -----------------------------------------------------------------------------------------------
// MODULES
// -----------------------------------------------------------------------------------------------

mod worker;

// -----------------------------------------------------------------------------------------------
// STRUCTS
// -----------------------------------------------------------------------------------------------

/// The goal server, which owns the executor thread and the command output.
pub struct GoalServer {
    shared: Arc<Shared>,

    worker_jh: JoinHandle<Result<(), GoalServerError>>,

    worker_sender: Sender<ExecSignal>,
    result_receiver: Receiver<GoalResult>,

    next_id: AtomicU64,
}

/// Everything the server and its worker both need access to.
///
/// Locks are always taken in the order `current` then `output`, the worker's tick only ever takes
/// `output`.
struct Shared {
    params: Params,

    pose_cache: PoseCache,

    /// The most recently accepted goal which has not yet reported
    current: Mutex<Option<GoalHandle>>,

    output: Mutex<CmdOutput>,

    /// Status report from the latest tick of the executing goal
    report: Mutex<Option<StatusReport>>,

    shutdown: AtomicBool,
}

/// The command sink along with the last command sent to it.
struct CmdOutput {
    sink: Box<dyn CmdSink>,
    last_cmd: Option<CmdVel>,
}

/// An accepted goal.
#[derive(Debug, Clone)]
pub(crate) struct GoalHandle {
    pub id: GoalId,
    pub target: PosGoal,
    pub accepted_at: Instant,
    preempted: Arc<AtomicBool>,
}

// -----------------------------------------------------------------------------------------------
// ENUMS
// -----------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum GoalServerError {
    #[error("PosCtrl error: {0}")]
    PosCtrlError(PosCtrlError),

    #[error("Goal target ({0}, {1}) is not finite")]
    NonFiniteGoal(f64, f64),

    #[error("Sync primitive is poisoned")]
    PoisonError,

    #[error("Failed to send a signal to the executor, it has already stopped")]
    SendError,

    #[error("Could not spawn the executor thread: {0}")]
    WorkerSpawnError(std::io::Error),

    #[error("The executor thread panicked")]
    WorkerPanicked,
}

// -----------------------------------------------------------------------------------------------
// IMPLS
// -----------------------------------------------------------------------------------------------

impl GoalServer {
    /// Create a new goal server, starting the executor thread.
    ///
    /// Commands are sent to `sink` and poses are read from `pose_cache` once per tick.
    pub fn new<S>(params: Params, pose_cache: PoseCache, sink: S) -> Result<Self, GoalServerError>
    where
        S: CmdSink + 'static,
    {
        // Validates the parameters before anything is started
        let pos_ctrl = PosCtrl::new(params.clone())?;

        let shared = Arc::new(Shared {
            params,
            pose_cache,
            current: Mutex::new(None),
            output: Mutex::new(CmdOutput {
                sink: Box::new(sink),
                last_cmd: None,
            }),
            report: Mutex::new(None),
            shutdown: AtomicBool::new(false),
        });
        let shared_worker = shared.clone();

        // Create channels
        let (worker_sender, rx) = channel();
        let (tx, result_receiver) = channel();

        // Start worker thread
        let worker_jh = thread::Builder::new()
            .name("goal_exec::worker".into())
            .spawn(move || worker_thread(shared_worker, pos_ctrl, rx, tx))
            .map_err(GoalServerError::WorkerSpawnError)?;

        Ok(Self {
            shared,
            worker_jh,
            worker_sender,
            result_receiver,
            next_id: AtomicU64::new(0),
        })
    }

    /// Accept a new goal.
    ///
    /// If a goal is already executing it is preempted first, which issues a stop immediately.
    pub fn send_goal(&self, target: PosGoal) -> Result<GoalId, GoalServerError> {
        if !target.x_m.is_finite() || !target.y_m.is_finite() {
            return Err(GoalServerError::NonFiniteGoal(target.x_m, target.y_m));
        }

        let handle = GoalHandle::new(
            GoalId(self.next_id.fetch_add(1, Ordering::Relaxed)),
            target,
        );
        let id = handle.id;

        {
            let mut current = self.shared.current.lock()?;

            if let Some(ref old) = *current {
                info!("Goal {} preempted by new goal {}", old.id, id);
                self.shared.preempt(old)?;
            }

            *current = Some(handle.clone());
        }

        info!("Goal {} accepted, target ({:.3}, {:.3})", id, target.x_m, target.y_m);

        self.worker_sender.send(ExecSignal::Goal(handle))?;

        Ok(id)
    }

    /// Cancel the executing goal, if there is one.
    ///
    /// The stop is issued before this function returns.
    pub fn cancel(&self) -> Result<(), GoalServerError> {
        let cancelled = {
            let mut current = self.shared.current.lock()?;

            match current.take() {
                Some(handle) => {
                    self.shared.preempt(&handle)?;
                    Some(handle.id)
                }
                None => None,
            }
        };

        match cancelled {
            Some(id) => {
                info!("Goal {} cancelled", id);
                // Wake the executor so it reports without waiting for the tick
                self.worker_sender.send(ExecSignal::Cancel)?;
            }
            None => info!("Cancel requested with no active goal"),
        }

        Ok(())
    }

    /// Get the next terminal result, if one is available.
    pub fn try_recv_result(&self) -> Option<GoalResult> {
        self.result_receiver.try_recv().ok()
    }

    /// Wait up to `timeout` for the next terminal result.
    pub fn recv_result_timeout(&self, timeout: Duration) -> Option<GoalResult> {
        self.result_receiver.recv_timeout(timeout).ok()
    }

    /// The most recently accepted goal which has not yet reported.
    pub fn active_goal(&self) -> Option<GoalId> {
        match self.shared.current.lock() {
            Ok(c) => c.as_ref().map(|h| h.id),
            Err(_) => None,
        }
    }

    /// The last command sent to the sink.
    pub fn last_cmd(&self) -> Option<CmdVel> {
        match self.shared.output.lock() {
            Ok(o) => o.last_cmd,
            Err(_) => None,
        }
    }

    /// The status report from the latest tick of the executing goal.
    pub fn last_report(&self) -> Option<StatusReport> {
        match self.shared.report.lock() {
            Ok(r) => *r,
            Err(_) => None,
        }
    }

    /// Shut the server down.
    ///
    /// The executing goal, and any goal waiting to execute, ends `Aborted`. Returns all results
    /// which had not yet been received.
    pub fn shutdown(self) -> Result<Vec<GoalResult>, GoalServerError> {
        info!("Shutting down goal server");

        self.shared.shutdown.store(true, Ordering::SeqCst);

        // The worker may have already stopped if it hit an error, in which case the join below
        // reports it.
        if self.worker_sender.send(ExecSignal::Shutdown).is_err() {
            warn!("Executor thread stopped before shutdown was requested");
        }

        match self.worker_jh.join() {
            Ok(r) => r?,
            Err(_) => return Err(GoalServerError::WorkerPanicked),
        }

        Ok(self.result_receiver.try_iter().collect())
    }
}

impl Shared {
    /// Mark the goal preempted and issue a stop.
    ///
    /// Must be called with the `current` lock held. Holding `output` while the flag is set means
    /// the worker cannot send a motion command between the flag and the stop.
    fn preempt(&self, handle: &GoalHandle) -> Result<(), GoalServerError> {
        let mut output = self.output.lock()?;

        handle.preempted.store(true, Ordering::SeqCst);
        output.emit(CmdVel::stop());

        Ok(())
    }
}

impl CmdOutput {
    fn emit(&mut self, cmd: CmdVel) {
        self.sink.send(&cmd);
        self.last_cmd = Some(cmd);
    }
}

impl GoalHandle {
    fn new(id: GoalId, target: PosGoal) -> Self {
        Self {
            id,
            target,
            accepted_at: Instant::now(),
            preempted: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_preempted(&self) -> bool {
        self.preempted.load(Ordering::SeqCst)
    }
}

impl From<PosCtrlError> for GoalServerError {
    fn from(e: PosCtrlError) -> Self {
        Self::PosCtrlError(e)
    }
}

impl<G> From<PoisonError<G>> for GoalServerError {
    fn from(_: PoisonError<G>) -> Self {
        Self::PoisonError
    }
}

impl<T> From<SendError<T>> for GoalServerError {
    fn from(_: SendError<T>) -> Self {
        Self::SendError
    }
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------
