//! # Equipment Interface
//!
//! This module defines the interface structures which are exchanged with the equipment around the
//! executor, i.e. the pose source and the velocity command sink.

// -----------------------------------------------------------------------------------------------
// MODULES
// -----------------------------------------------------------------------------------------------

pub mod cmd_vel;
pub mod odom;
