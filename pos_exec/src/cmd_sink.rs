//! # Command sinks
//!
//! A command sink is wherever the velocity commands produced by goal execution end up, usually a
//! mechanisms interface or a simulation. Sinks are owned by the goal server and only ever called
//! with the server's output lock held, so they need not be thread safe beyond `Send`.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::sync::mpsc::Sender;

use comms_if::eqpt::cmd_vel::CmdVel;
use log::warn;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A destination for velocity commands.
///
/// Sending must not block for longer than it takes to hand the command over, since a stop issued
/// on preemption goes through the same call.
pub trait CmdSink: Send {
    fn send(&mut self, cmd: &CmdVel);
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl CmdSink for Sender<CmdVel> {
    fn send(&mut self, cmd: &CmdVel) {
        if let Err(e) = Sender::send(self, *cmd) {
            warn!("Could not send command, receiver has disconnected: {:?}", e.0);
        }
    }
}
