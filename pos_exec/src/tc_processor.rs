//! # Telecommand processor module
//!
//! The telecommand processor handles goal TCs coming from any source.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::debug;

// Internal
use crate::goal_exec::{GoalServer, GoalServerError};
use comms_if::tc::{GoalId, Tc};

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Execute a telecommand.
///
/// Returns the ID assigned to the goal if the TC was a new goal.
pub fn exec(server: &GoalServer, tc: &Tc) -> Result<Option<GoalId>, GoalServerError> {
    // Handle different Tcs
    match tc {
        Tc::Goal(goal) => {
            debug!("Recieved Goal command: {:?}", goal);
            server.send_goal(*goal).map(Some)
        }
        Tc::Cancel => {
            debug!("Recieved Cancel command");
            server.cancel().map(|_| None)
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::{loc::PoseCache, pos_ctrl::Params};
    use comms_if::{
        eqpt::cmd_vel::CmdVel,
        tc::{GoalOutcome, PosGoal},
    };
    use std::{sync::mpsc::channel, time::Duration};

    #[test]
    fn test_exec_tcs() {
        let (tx, rx) = channel::<CmdVel>();
        let params = Params {
            rate_hz: 1.0,
            ..Default::default()
        };
        let server = GoalServer::new(params, PoseCache::default(), tx).unwrap();

        let tc = Tc::from_json(r#"{"Goal": {"x_m": 3.0, "y_m": 0.0}}"#).unwrap();
        let id = exec(&server, &tc).unwrap();
        assert!(id.is_some());
        assert_eq!(tc, Tc::Goal(PosGoal { x_m: 3.0, y_m: 0.0 }));

        assert!(!rx.recv_timeout(Duration::from_secs(2)).unwrap().is_stop());

        assert_eq!(exec(&server, &Tc::Cancel).unwrap(), None);
        assert!(rx.try_recv().unwrap().is_stop());

        let result = server.recv_result_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(Some(result.id), id);
        assert_eq!(result.outcome, GoalOutcome::Preempted);

        server.shutdown().unwrap();
    }
}
