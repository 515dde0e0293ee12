// SPDX-License-Identifier: MIT

//! Command vocabulary recognized by the dispatcher (spec §4.C/D).

use std::fmt;

/// A command word received as a UTF-8 string at the start of each
/// exchange. An unrecognized verb is not representable here: the
/// dispatcher treats a parse failure as a protocol fault and drops the
/// connection (spec §4.D: "Unknown commands transition to UNKNOWN and
/// the connection is dropped").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Restart,
    Register,
    Barrier,
    Exclude,
    Unexclude,
    Heartbeat,
    Print,
    Checkpoint,
    LoadCheckpoint,
    Shutdown,
}

impl Command {
    pub fn parse(verb: &str) -> Option<Command> {
        Some(match verb {
            "start" => Command::Start,
            "restart" => Command::Restart,
            "register" => Command::Register,
            "barrier" => Command::Barrier,
            "exclude" => Command::Exclude,
            "unexclude" => Command::Unexclude,
            "heartbeat" => Command::Heartbeat,
            "print" => Command::Print,
            "checkpoint" => Command::Checkpoint,
            "load_checkpoint" => Command::LoadCheckpoint,
            "shutdown" => Command::Shutdown,
            _ => return None,
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Command::Start => "start",
            Command::Restart => "restart",
            Command::Register => "register",
            Command::Barrier => "barrier",
            Command::Exclude => "exclude",
            Command::Unexclude => "unexclude",
            Command::Heartbeat => "heartbeat",
            Command::Print => "print",
            Command::Checkpoint => "checkpoint",
            Command::LoadCheckpoint => "load_checkpoint",
            Command::Shutdown => "shutdown",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
