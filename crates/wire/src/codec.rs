// SPDX-License-Identifier: MIT

//! Length-prefixed int/string/byte-blob framing over an async stream,
//! generalized from `original_source/tracker/tracker.py`'s `ExSocket`.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::FramingError;

/// Current wire protocol version. Bumped whenever a breaking change is
/// made to the framing or command set; the dispatcher rejects any other
/// value at connection start.
pub const PROTOCOL_VERSION: u8 = 1;

/// Wraps an async duplex stream with the tracker's framing primitives.
///
/// Every value shape — `int`, `string`, `bytes` — is prefixed by a 4-byte
/// little-endian signed length/value. A short read anywhere is reported
/// as [`FramingError::Eof`] (the connection was torn); anything else
/// decode-shaped is a framing fault that should close the connection
/// without touching job state.
pub struct FramedStream<S> {
    inner: S,
}

impl<S> FramedStream<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: AsyncRead + Unpin> FramedStream<S> {
    /// Read the single protocol-version byte that opens every connection.
    pub async fn read_version(&mut self) -> Result<u8, FramingError> {
        let mut buf = [0u8; 1];
        self.inner.read_exact(&mut buf).await.map_err(FramingError::from_io)?;
        Ok(buf[0])
    }

    pub async fn recv_int(&mut self) -> Result<i32, FramingError> {
        let mut buf = [0u8; 4];
        self.inner.read_exact(&mut buf).await.map_err(FramingError::from_io)?;
        Ok(i32::from_le_bytes(buf))
    }

    pub async fn recv_string(&mut self) -> Result<String, FramingError> {
        let bytes = self.recv_bytes().await?;
        Ok(String::from_utf8(bytes)?)
    }

    pub async fn recv_bytes(&mut self) -> Result<Vec<u8>, FramingError> {
        let len = self.recv_int().await?;
        if len < 0 {
            return Err(FramingError::NegativeLength(len));
        }
        let mut buf = vec![0u8; len as usize];
        self.inner.read_exact(&mut buf).await.map_err(FramingError::from_io)?;
        Ok(buf)
    }
}

impl<S: AsyncWrite + Unpin> FramedStream<S> {
    pub async fn write_version(&mut self, version: u8) -> Result<(), FramingError> {
        self.inner.write_all(&[version]).await.map_err(FramingError::from_io)
    }

    pub async fn send_int(&mut self, n: i32) -> Result<(), FramingError> {
        self.inner.write_all(&n.to_le_bytes()).await.map_err(FramingError::from_io)
    }

    pub async fn send_string(&mut self, s: &str) -> Result<(), FramingError> {
        self.send_bytes(s.as_bytes()).await
    }

    pub async fn send_bytes(&mut self, b: &[u8]) -> Result<(), FramingError> {
        self.send_int(b.len() as i32).await?;
        self.inner.write_all(b).await.map_err(FramingError::from_io)
    }

    pub async fn flush(&mut self) -> Result<(), FramingError> {
        self.inner.flush().await.map_err(FramingError::from_io)
    }
}
