//! Byte Store Module
//!
//! The random-access byte source a [`Reader`](crate::Reader) reads from and
//! the append-only sink a [`Writer`](crate::Writer) writes to.
//!
//! ## Implementations
//! - [`FileSource`] / [`FileSink`]: local files
//! - [`bytes::Bytes`] / [`MemSink`]: in-memory buffers

mod file;
mod memory;

pub use file::{FileSink, FileSource};
pub use memory::MemSink;

use crate::error::Result;

/// Random-access, read-only byte source.
///
/// Must tolerate concurrent `read_at` calls: a single reader is shared by
/// every scanner it hands out.
pub trait ByteSource: Send + Sync {
    /// Total length in bytes
    fn len(&self) -> Result<u64>;

    /// Fill `buf` with the bytes starting at `offset`.
    /// A range past the end is an `UnexpectedEof` I/O error.
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<()>;

    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

/// Append-only byte sink
pub trait ByteSink {
    /// Append bytes at the end.
    ///
    /// A failed append must either leave the sink unchanged, so the call can
    /// be retried, or refuse every later append.
    fn append(&mut self, bytes: &[u8]) -> Result<()>;

    /// Flush and release the underlying handle
    fn close(&mut self) -> Result<()>;
}

impl<T: ByteSource + ?Sized> ByteSource for Box<T> {
    fn len(&self) -> Result<u64> {
        (**self).len()
    }

    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<()> {
        (**self).read_at(offset, buf)
    }
}

impl<T: ByteSink + ?Sized> ByteSink for Box<T> {
    fn append(&mut self, bytes: &[u8]) -> Result<()> {
        (**self).append(bytes)
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}
