//! Logging setup for the executor.
//!
//! Every record goes to stdout and to the `<exec>.log` file in the session directory, prefixed
//! with the session-relative time and a short level tag. Records at debug and trace also carry
//! their target so that executor, simulation and control output can be told apart.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use colored::{ColoredString, Colorize};
use fern::FormatCallback;
use log::{info, Level, Record};
use thiserror::Error;

// Internal imports
use crate::session;

// Re-exports
pub use log::LevelFilter;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Target of the simulation client, which logs every integration step at trace.
const SIM_TARGET: &str = "pos_lib::sim_client";

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors associated with initialising the logger.
#[derive(Debug, Error)]
pub enum LoggerInitError {
    #[error("Log level `{0}` would hide goal outcomes, use `INFO` or more verbose")]
    InvalidMinLogLevel(LevelFilter),

    #[error("Could not open the session log file: {0}")]
    LogFileInitError(std::io::Error),

    #[error("A logger has already been set: {0}")]
    FernInitError(log::SetLoggerError),
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Start logging to stdout and the session log file.
///
/// `min_level` must be `INFO` or more verbose. The simulation client never logs below `DEBUG`
/// whatever `min_level` is.
///
/// Only one logger can exist per process, a second call returns `FernInitError`.
pub fn logger_init(
    min_level: LevelFilter,
    session: &session::Session,
) -> Result<(), LoggerInitError> {
    if min_level < Level::Info {
        return Err(LoggerInitError::InvalidMinLogLevel(min_level));
    }

    let log_file = fern::log_file(&session.log_file_path)
        .map_err(LoggerInitError::LogFileInitError)?;

    fern::Dispatch::new()
        .format(format_record)
        .level(min_level)
        .level_for(SIM_TARGET, min_level.min(LevelFilter::Debug))
        .chain(std::io::stdout())
        .chain(log_file)
        .apply()
        .map_err(LoggerInitError::FernInitError)?;

    info!("Logging to {:?} at {:?}", session.log_file_path, min_level);
    info!("    Session epoch: {}", session::get_epoch());

    Ok(())
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn format_record(out: FormatCallback, message: &std::fmt::Arguments, record: &Record) {
    let elapsed_s = session::get_elapsed_seconds();
    let tag = level_tag(record.level());

    if record.level() > Level::Info {
        out.finish(format_args!(
            "[{:10.6} {}] {}: {}",
            elapsed_s,
            tag,
            record.target(),
            message
        ))
    } else {
        out.finish(format_args!("[{:10.6} {}] {}", elapsed_s, tag, message))
    }
}

/// Three letter tag for the level, coloured by severity.
fn level_tag(level: Level) -> ColoredString {
    match level {
        Level::Trace => "TRC".dimmed().italic(),
        Level::Debug => "DBG".dimmed(),
        Level::Info => "INF".normal(),
        Level::Warn => "WRN".yellow(),
        Level::Error => "ERR".red().bold(),
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_level_tag() {
        colored::control::set_override(false);

        assert_eq!(level_tag(Level::Info).to_string(), "INF");
        assert_eq!(level_tag(Level::Warn).to_string(), "WRN");
        assert_eq!(level_tag(Level::Trace).to_string(), "TRC");
    }
}
