//! # Goal telecommands and results

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::fmt;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A position goal in the odometry frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PosGoal {
    /// The x-coordinate of the point to drive to.
    ///
    /// Units: meters
    pub x_m: f64,

    /// The y-coordinate of the point to drive to.
    ///
    /// Units: meters
    pub y_m: f64,
}

/// Identifier assigned to a goal when it is accepted. Identifiers increase monotonically over the
/// life of a server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GoalId(pub u64);

/// The terminal result of a single goal, reported once per accepted goal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GoalResult {
    /// The goal this result belongs to
    pub id: GoalId,

    /// The goal's target
    pub target: PosGoal,

    /// How the execution ended
    pub outcome: GoalOutcome,

    /// Time between the goal being accepted and its outcome being decided.
    ///
    /// Units: seconds
    pub elapsed_s: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// The terminal outcome of one goal execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GoalOutcome {
    /// The goal position was reached within tolerance and the base was stopped.
    Succeeded,

    /// The goal was cancelled, either explicitly or by a newer goal.
    Preempted,

    /// The executor was shut down while the goal was executing.
    Aborted,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl fmt::Display for GoalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl fmt::Display for GoalOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GoalOutcome::Succeeded => "succeeded",
            GoalOutcome::Preempted => "preempted",
            GoalOutcome::Aborted => "aborted",
        };
        f.write_str(s)
    }
}
