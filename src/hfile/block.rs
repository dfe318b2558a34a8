//! Data Blocks
//!
//! Block building on the write side, and header verification plus record
//! decoding on the read side. Record scanning takes the cursor as input and
//! hands the new cursor back, so overshoot rewinds are explicit.

use std::cmp::Ordering;

use bytes::{Buf, BufMut};

use crate::error::Result;
use crate::HFileError;

use super::{BLOCK_HEADER_SIZE, RECORD_HEADER_SIZE};

// =============================================================================
// Write Side
// =============================================================================

/// Up-front reservation cap; larger blocks grow on demand
const MAX_PREALLOCATED: usize = 1024 * 1024;

/// Accumulates records for the block currently being written
pub(crate) struct BlockBuilder {
    /// Header placeholder followed by serialized records
    buf: Vec<u8>,
    first_key: Option<Vec<u8>>,
    records: usize,
}

impl BlockBuilder {
    pub(crate) fn new(capacity: usize) -> Self {
        let mut buf = Vec::with_capacity(capacity.min(MAX_PREALLOCATED) + BLOCK_HEADER_SIZE);
        buf.resize(BLOCK_HEADER_SIZE, 0);
        Self {
            buf,
            first_key: None,
            records: 0,
        }
    }

    pub(crate) fn add(&mut self, key: &[u8], value: &[u8]) {
        if self.first_key.is_none() {
            self.first_key = Some(key.to_vec());
        }
        self.buf.put_u32(key.len() as u32);
        self.buf.put_u32(value.len() as u32);
        self.buf.put_slice(key);
        self.buf.put_slice(value);
        self.records += 1;
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.records == 0
    }

    /// Bytes of serialized records (header excluded)
    pub(crate) fn payload_len(&self) -> usize {
        self.buf.len() - BLOCK_HEADER_SIZE
    }

    /// Key of the first record in the block
    pub(crate) fn first_key(&self) -> Option<&[u8]> {
        self.first_key.as_deref()
    }

    /// Fill in the header and return the sealed block bytes.
    /// Records stay in the builder until [`clear`](Self::clear), so a block
    /// that fails to reach the sink can be sealed again.
    pub(crate) fn seal(&mut self) -> Result<&[u8]> {
        let payload_len = u32::try_from(self.payload_len()).map_err(|_| {
            HFileError::Format(format!(
                "Block payload of {} bytes does not fit a u32 length",
                self.payload_len()
            ))
        })?;
        let crc = crc32fast::hash(&self.buf[BLOCK_HEADER_SIZE..]);

        let mut header: &mut [u8] = &mut self.buf[..BLOCK_HEADER_SIZE];
        header.put_u32(payload_len);
        header.put_u32(crc);

        Ok(&self.buf)
    }

    /// Drop the sealed block's bytes, keeping the allocation
    pub(crate) fn clear(&mut self) {
        self.buf.truncate(BLOCK_HEADER_SIZE);
        self.buf[..BLOCK_HEADER_SIZE].fill(0);
        self.first_key = None;
        self.records = 0;
    }
}

// =============================================================================
// Read Side
// =============================================================================

/// Reusable buffers for fetching blocks.
///
/// `compressed` holds raw bytes read from the store when a codec is active;
/// `decoded` holds the block handed to callers. Both only ever grow.
#[derive(Debug, Default)]
pub struct BlockBuffer {
    pub(crate) compressed: Vec<u8>,
    pub(crate) decoded: Vec<u8>,
}

impl BlockBuffer {
    /// Buffer whose decoded side starts with `capacity` bytes reserved
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            compressed: Vec::new(),
            decoded: Vec::with_capacity(capacity),
        }
    }

    /// The most recently fetched block, header included
    pub fn data(&self) -> &[u8] {
        &self.decoded
    }

    /// Capacity currently reserved for decoded blocks
    pub fn capacity(&self) -> usize {
        self.decoded.capacity()
    }
}

/// Check a decoded block's header against its payload
pub(crate) fn verify_block(block: &[u8]) -> Result<()> {
    if block.len() < BLOCK_HEADER_SIZE {
        return Err(HFileError::Decode(format!(
            "Block of {} bytes is shorter than its header",
            block.len()
        )));
    }

    let mut header = &block[..BLOCK_HEADER_SIZE];
    let payload_len = header.get_u32() as usize;
    let crc = header.get_u32();
    let payload = &block[BLOCK_HEADER_SIZE..];

    if payload_len != payload.len() {
        return Err(HFileError::Decode(format!(
            "Block header says {} payload bytes, found {}",
            payload_len,
            payload.len()
        )));
    }
    let actual = crc32fast::hash(payload);
    if actual != crc {
        return Err(HFileError::Decode(format!(
            "Block checksum mismatch: expected {:08x}, got {:08x}",
            crc, actual
        )));
    }
    Ok(())
}

/// One record decoded in place
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Record<'a> {
    pub key: &'a [u8],
    pub value: &'a [u8],
    /// Offset of the record that follows
    pub next: usize,
}

/// Decode the record starting at `pos`.
///
/// `Ok(None)` at the exact end of the block. Length fields pointing past
/// the end, or a trailing fragment shorter than a record header, are
/// decode errors.
pub(crate) fn read_record(block: &[u8], pos: usize) -> Result<Option<Record<'_>>> {
    let remaining = block.len().saturating_sub(pos);
    if remaining == 0 {
        return Ok(None);
    }
    if remaining < RECORD_HEADER_SIZE {
        return Err(HFileError::Decode(format!(
            "Truncated record header at offset {}: {} bytes left",
            pos, remaining
        )));
    }

    let mut header = &block[pos..pos + RECORD_HEADER_SIZE];
    let key_len = header.get_u32() as usize;
    let val_len = header.get_u32() as usize;

    let key_start = pos + RECORD_HEADER_SIZE;
    let record_end = key_start
        .checked_add(key_len)
        .and_then(|n| n.checked_add(val_len))
        .filter(|&end| end <= block.len())
        .ok_or_else(|| {
            HFileError::Decode(format!(
                "Record at offset {} (key {} bytes, value {} bytes) runs past block end {}",
                pos,
                key_len,
                val_len,
                block.len()
            ))
        })?;

    let value_start = key_start + key_len;
    Ok(Some(Record {
        key: &block[key_start..value_start],
        value: &block[value_start..record_end],
        next: record_end,
    }))
}

/// Whether a scan stops at the first match or collects every match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScanMode {
    First,
    All,
}

/// Outcome of [`scan_records`]
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct Scan {
    /// Cursor to resume from on the next call
    pub pos: usize,
    /// Values of matching records, in file order
    pub values: Vec<Vec<u8>>,
}

/// Scan forward from `pos` for records equal to `key`.
///
/// Smaller records are skipped and matches consumed. The first greater
/// record stops the scan and is left unconsumed: the returned cursor points
/// at its start.
pub(crate) fn scan_records(block: &[u8], mut pos: usize, key: &[u8], mode: ScanMode) -> Result<Scan> {
    let mut values = Vec::new();

    while let Some(record) = read_record(block, pos)? {
        match record.key.cmp(key) {
            Ordering::Less => pos = record.next,
            Ordering::Equal => {
                values.push(record.value.to_vec());
                pos = record.next;
                if mode == ScanMode::First {
                    break;
                }
            }
            Ordering::Greater => break,
        }
    }

    Ok(Scan { pos, values })
}
