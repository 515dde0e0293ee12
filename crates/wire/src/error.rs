// SPDX-License-Identifier: MIT

use thiserror::Error;

/// A framing fault: the decoder saw a short read, a negative length
/// prefix, or a malformed byte count. Per spec §7, a framing fault closes
/// the connection and never mutates job state.
#[derive(Debug, Error)]
pub enum FramingError {
    #[error("connection closed")]
    Eof,

    #[error("negative length prefix: {0}")]
    NegativeLength(i32),

    #[error("string payload was not valid UTF-8")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    #[error("unsupported protocol version {got}, expected {expected}")]
    VersionMismatch { got: u8, expected: u8 },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl FramingError {
    /// Short reads are the one decode fault spec §4.A calls out as EOF
    /// rather than a malformed-framing fault.
    pub(crate) fn from_io(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::UnexpectedEof {
            FramingError::Eof
        } else {
            FramingError::Io(err)
        }
    }
}
