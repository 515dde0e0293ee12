// SPDX-License-Identifier: MIT

//! Error kinds that end one connection's handler loop (spec §7). All of
//! them are connection-local: none ever tear down the tracker process.

use thiserror::Error;

use tracker_wire::FramingError;

use crate::job::NotRegistered;

/// Protocol fault: an unknown command, or a command arriving in the wrong
/// state (e.g. `barrier` before `start`). Closes the connection; logged
/// at warn level by the caller.
#[derive(Debug, Error)]
pub enum ProtocolFault {
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error("command requires a completed `start` first")]
    NotStarted,

    #[error("name was never registered")]
    NotRegistered(#[from] NotRegistered),
}

/// Any fault that ends a connection's dispatch loop.
#[derive(Debug, Error)]
pub enum DaemonConnError {
    #[error("framing fault: {0}")]
    Framing(#[from] FramingError),

    #[error("protocol fault: {0}")]
    Protocol(#[from] ProtocolFault),
}
