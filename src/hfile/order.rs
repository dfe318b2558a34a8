//! Key order tracking
//!
//! Remembers the last key seen so a caller can reject keys that go
//! backwards. Scanners use it for query order, the writer for write order.

use crate::error::Result;
use crate::HFileError;

/// The last key seen, if any
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderedKeys {
    last: Option<Vec<u8>>,
}

impl OrderedKeys {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail with `OutOfOrder` if `key` sorts before the remembered key.
    /// Nothing is remembered on failure.
    pub fn check(&self, key: &[u8]) -> Result<()> {
        match &self.last {
            Some(prev) if key < prev.as_slice() => Err(HFileError::OutOfOrder {
                previous: prev.clone(),
                key: key.to_vec(),
            }),
            _ => Ok(()),
        }
    }

    /// [`check`](Self::check), then remember `key`
    pub fn check_and_update(&mut self, key: &[u8]) -> Result<()> {
        self.check(key)?;
        self.update(key);
        Ok(())
    }

    /// Remember `key` unconditionally, reusing the allocation
    pub fn update(&mut self, key: &[u8]) {
        match &mut self.last {
            Some(prev) => {
                prev.clear();
                prev.extend_from_slice(key);
            }
            None => self.last = Some(key.to_vec()),
        }
    }

    pub fn last(&self) -> Option<&[u8]> {
        self.last.as_deref()
    }

    /// Forget the remembered key
    pub fn clear(&mut self) {
        self.last = None;
    }
}
