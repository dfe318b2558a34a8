//! In-memory store
//!
//! `Bytes` is the read side; `MemSink` builds one.

use bytes::{Bytes, BytesMut};

use crate::error::Result;

use super::{ByteSink, ByteSource};

impl ByteSource for Bytes {
    fn len(&self) -> Result<u64> {
        Ok(Bytes::len(self) as u64)
    }

    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<()> {
        let start = usize::try_from(offset).unwrap_or(usize::MAX);
        match start.checked_add(buf.len()) {
            Some(end) if end <= Bytes::len(self) => {
                buf.copy_from_slice(&self[start..end]);
                Ok(())
            }
            _ => Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                format!(
                    "read of {} bytes at {} past end of {}-byte buffer",
                    buf.len(),
                    offset,
                    Bytes::len(self)
                ),
            )
            .into()),
        }
    }
}

/// Growable in-memory sink
#[derive(Debug, Default)]
pub struct MemSink {
    buf: BytesMut,
}

impl MemSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Freeze the written bytes into a readable source
    pub fn into_bytes(self) -> Bytes {
        self.buf.freeze()
    }
}

impl ByteSink for MemSink {
    fn append(&mut self, bytes: &[u8]) -> Result<()> {
        self.buf.extend_from_slice(bytes);
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}
