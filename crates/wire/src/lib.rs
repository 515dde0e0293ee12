// SPDX-License-Identifier: MIT

//! Wire protocol between the tracker and worker processes: a length-prefixed
//! int/string/byte-blob framing (§4.A) plus the command vocabulary (§4.C/D)
//! exchanged over it.
//!
//! Every value is little-endian (the source is host-native, a documented
//! interop hazard this rewrite fixes) and every connection opens with a
//! single protocol-version byte the dispatcher validates before entering
//! the command loop.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

mod codec;
mod command;
mod error;

pub use codec::{FramedStream, PROTOCOL_VERSION};
pub use command::Command;
pub use error::FramingError;

#[cfg(test)]
mod command_tests;
