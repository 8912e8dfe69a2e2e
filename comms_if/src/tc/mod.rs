//! # Telecommand module
//!
//! This module provides the goal telecommands accepted by the position executor, and the results
//! it reports back once a goal has finished.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod goal;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};
use thiserror::Error;

// Internal
pub use goal::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// A telecommand, i.e. an instruction sent to the executor by the goal transport.
///
/// In JSON a goal is written `{"Goal": {"x_m": 1.0, "y_m": 2.0}}` and a cancel is `"Cancel"`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Tc {
    /// Drive to the given position. Any goal currently executing is preempted.
    Goal(PosGoal),

    /// Cancel the currently executing goal.
    Cancel,
}

/// Possible parsing errors.
#[derive(Debug, Error)]
pub enum TcParseError {
    #[error("TC contains invalid JSON: {0}")]
    InvalidJson(serde_json::Error),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Tc {
    /// Parse a new TC from a JSON packet.
    ///
    /// JSON has no NaN or infinity literals and out of range numbers are rejected, so a parsed goal
    /// is always finite.
    pub fn from_json(json_str: &str) -> Result<Self, TcParseError> {
        serde_json::from_str(json_str).map_err(TcParseError::InvalidJson)
    }

    /// Serialise the TC into a JSON packet
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_tc_from_json() {
        assert_eq!(
            Tc::from_json(r#"{"Goal": {"x_m": 1.5, "y_m": -2.0}}"#).unwrap(),
            Tc::Goal(PosGoal { x_m: 1.5, y_m: -2.0 })
        );
        assert_eq!(Tc::from_json(r#""Cancel""#).unwrap(), Tc::Cancel);

        assert!(matches!(
            Tc::from_json(r#"{"Goto": {"x_m": 1.5}}"#),
            Err(TcParseError::InvalidJson(_))
        ));
        assert!(matches!(
            Tc::from_json(r#"{"Goal": {"x_m": 1.5}}"#),
            Err(TcParseError::InvalidJson(_))
        ));

        // Non-finite targets cannot be written in JSON
        assert!(matches!(
            Tc::from_json(r#"{"Goal": {"x_m": NaN, "y_m": 0.0}}"#),
            Err(TcParseError::InvalidJson(_))
        ));
        assert!(matches!(
            Tc::from_json(r#"{"Goal": {"x_m": 1e400, "y_m": 0.0}}"#),
            Err(TcParseError::InvalidJson(_))
        ));
    }

    #[test]
    fn test_tc_to_json() {
        assert_eq!(Tc::Cancel.to_json().unwrap(), r#""Cancel""#);

        let goal = Tc::Goal(PosGoal { x_m: 0.25, y_m: -4.0 });
        let json = goal.to_json().unwrap();
        assert_eq!(json, r#"{"Goal":{"x_m":0.25,"y_m":-4.0}}"#);
        assert_eq!(Tc::from_json(&json).unwrap(), goal);
    }
}
