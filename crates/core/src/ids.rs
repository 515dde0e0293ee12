// SPDX-License-Identifier: MIT

//! Rank and worker-connection identifiers.

use std::fmt;

/// Stable participant identity in `[0, N)`, assigned for the life of a job.
///
/// Ranks are ordered so that `BTreeMap<Rank, _>` / `BTreeSet<Rank>` iterate
/// ascending by construction — several rendezvous replies (`start`'s
/// connect/accept partition, the dead-set in heartbeat replies) depend on
/// that ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Rank(pub u32);

impl Rank {
    pub fn new(r: u32) -> Self {
        Self(r)
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for Rank {
    fn from(r: u32) -> Self {
        Self(r)
    }
}

/// Connection ordinal assigned by the server loop when it accepts a socket.
///
/// Distinct from [`Rank`]: a `WorkerId` is stamped the instant a TCP
/// connection is accepted, before the worker has sent anything; a `Rank`
/// only exists once the worker has been through `start`/`restart`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WorkerId(pub u32);

impl WorkerId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "worker#{}", self.0)
    }
}

/// Sentinel a worker sends in place of a rank to ask the tracker to
/// allocate one (source: `rank = -1`, kept as the literal wire value
/// rather than wrapped in `Option<Rank>` since the protocol itself
/// transmits it as a plain signed int).
pub const UNASSIGNED_RANK: i32 = -1;
