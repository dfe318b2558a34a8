//! Scanner
//!
//! Stateful cursor for point and multi-value lookups. Queries are expected
//! in non-decreasing key order: the scanner then only ever moves forward,
//! reusing the loaded block and the position inside it.
//!
//! ## States
//! ```text
//!   Idle ──get_first/get_all──▶ Positioned ──reset/release──▶ Idle
//! ```

use crate::error::Result;

use super::block::{scan_records, BlockBuffer, ScanMode};
use super::order::OrderedKeys;
use super::reader::Reader;
use super::BLOCK_HEADER_SIZE;

/// Everything a scanner owns apart from its reader. This is what the
/// reader's pool stores between uses.
#[derive(Debug, Default)]
pub(crate) struct ScanState {
    /// Index of the loaded (or, when idle, the hinted) block
    block: usize,
    /// Whether `buf` holds block `block`
    loaded: bool,
    /// Offset of the next unread record in the loaded block
    pos: usize,
    buf: BlockBuffer,
    order: OrderedKeys,
    enforce_key_order: bool,
}

impl ScanState {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            buf: BlockBuffer::with_capacity(capacity),
            enforce_key_order: true,
            ..Self::default()
        }
    }

    pub(crate) fn set_enforce_key_order(&mut self, enforce: bool) {
        self.enforce_key_order = enforce;
    }

    /// Back to Idle; the buffer is kept
    fn reset(&mut self) {
        self.block = 0;
        self.loaded = false;
        self.pos = 0;
        self.order.clear();
    }
}

/// Single-owner lookup cursor over a [`Reader`].
///
/// Obtained from [`Reader::scanner`]; dropping it (or calling
/// [`release`](Self::release)) resets it and returns it to the reader's
/// pool. Not meant to be shared: every method takes `&mut self`.
pub struct Scanner<'r> {
    reader: &'r Reader,
    state: ScanState,
}

impl<'r> Scanner<'r> {
    pub(crate) fn new(reader: &'r Reader, state: ScanState) -> Self {
        Self { reader, state }
    }

    /// First value stored under `key`, `None` if absent.
    ///
    /// The cursor moves past the returned record, so a later query for the
    /// same key continues with the next duplicate.
    pub fn get_first(&mut self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        if !self.locate_block_for(key)? {
            return Ok(None);
        }
        let scan = scan_records(self.state.buf.data(), self.state.pos, key, ScanMode::First)?;
        self.state.pos = scan.pos;
        Ok(scan.values.into_iter().next())
    }

    /// Every value stored under `key`, in write order; empty if absent
    pub fn get_all(&mut self, key: &[u8]) -> Result<Vec<Vec<u8>>> {
        if !self.locate_block_for(key)? {
            return Ok(Vec::new());
        }
        let scan = scan_records(self.state.buf.data(), self.state.pos, key, ScanMode::All)?;
        self.state.pos = scan.pos;
        Ok(scan.values)
    }

    /// Whether queries that go backwards are rejected
    pub fn enforce_key_order(&self) -> bool {
        self.state.enforce_key_order
    }

    /// Turning enforcement off skips the order check; out-of-order queries
    /// may then return wrong results instead of an error.
    pub fn set_enforce_key_order(&mut self, enforce: bool) {
        self.state.enforce_key_order = enforce;
    }

    /// Back to Idle: no block loaded, no remembered key.
    /// Required after a `Decode` error.
    pub fn reset(&mut self) {
        self.state.reset();
    }

    /// Hand the scanner back to its reader's pool
    pub fn release(self) {
        drop(self);
    }

    /// Block currently loaded, if any
    pub fn current_block(&self) -> Option<usize> {
        self.state.loaded.then_some(self.state.block)
    }

    /// Bytes reserved for decoded blocks
    pub fn buffer_capacity(&self) -> usize {
        self.state.buf.capacity()
    }

    /// Make sure the block that may hold `key` is loaded.
    ///
    /// `Ok(false)` means `key` cannot be in the file (no I/O was done).
    /// On `Ok(true)` the block sits in `state.buf` and `state.pos` is the
    /// cursor to scan from.
    fn locate_block_for(&mut self, key: &[u8]) -> Result<bool> {
        let state = &mut self.state;
        if state.enforce_key_order {
            state.order.check_and_update(key)?;
        }

        let index = self.reader.index();
        match index.get(state.block) {
            None => return Ok(false),
            Some(entry) if entry.is_after(key) => return Ok(false),
            Some(_) => {}
        }

        let block = self.reader.find_block(state.block, key);
        if block != state.block || !state.loaded {
            state.loaded = false;
            self.reader.get_block(block, &mut state.buf)?;
            state.block = block;
            state.pos = BLOCK_HEADER_SIZE;
            state.loaded = true;
        }
        Ok(true)
    }
}

impl Drop for Scanner<'_> {
    fn drop(&mut self) {
        let mut state = std::mem::take(&mut self.state);
        state.reset();
        self.reader.recycle(state);
    }
}
