// SPDX-License-Identifier: MIT

//! `trackerd`'s command-line surface.
//!
//! Spec's Non-goals keep `hostfile`/`config.ini` parsing for *launchers*
//! out of scope; these are the daemon's own bootstrap knobs — the handful
//! a launcher needs to pass positionally — mirrored on the teacher's
//! `clap`-derived `ojd`/`oj` argument structs.

use std::time::Duration;

use clap::Parser;

use crate::hostip::HostIpMode;

#[derive(Debug, Parser)]
#[command(name = "trackerd", version, about = "Collective-communication rendezvous tracker")]
pub struct Args {
    /// Target world size. Grows on an elastic `restart`.
    #[arg(long)]
    pub nworker: u32,

    /// How to resolve the host address advertised to workers.
    #[arg(long, value_enum, default_value_t)]
    pub host_ip: HostIpMode,

    /// TCP port to listen on. Omit, or pass `-1`, to let the OS assign a
    /// free port (spec §4.H).
    #[arg(long, allow_hyphen_values = true)]
    pub port: Option<i32>,

    /// Milliseconds between expected worker heartbeats.
    #[arg(long, default_value_t = 5000)]
    pub heartbeat_interval_ms: u64,
}

impl Args {
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }

    /// `None` (the wire protocol's "pick a free port") unless a
    /// non-negative port was given.
    pub fn requested_port(&self) -> Option<u16> {
        match self.port {
            Some(p) if p >= 0 => Some(p as u16),
            _ => None,
        }
    }
}

#[cfg(test)]
mod cli_tests;
