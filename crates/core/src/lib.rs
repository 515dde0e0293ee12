// SPDX-License-Identifier: MIT

//! Shared primitives for the rendezvous tracker: identifiers, overlay
//! topology, and the generic N-party rendezvous point.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod ids;
pub mod rendezvous;
pub mod topology;

pub use ids::{Rank, WorkerId, UNASSIGNED_RANK};
pub use rendezvous::Rendezvous;
pub use topology::Topology;
