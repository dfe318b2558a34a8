//! Block Index
//!
//! Maps the first key of every data block to the block's location.
//! Built by the writer, decoded once by the reader and immutable after.

use bytes::{Buf, BufMut};

use crate::error::Result;
use crate::HFileError;

use super::INDEX_MAGIC;

/// How many entries past the hint are probed linearly before falling back
/// to binary search. Scanners mostly move forward by a block or two.
const LINEAR_PROBES: usize = 4;

/// Location of a block on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHandle {
    pub offset: u64,
    /// Stored (possibly compressed) length
    pub length: u32,
}

impl BlockHandle {
    pub fn end(&self) -> u64 {
        self.offset + self.length as u64
    }
}

/// One index entry: a block's first key and its location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub first_key: Vec<u8>,
    pub handle: BlockHandle,
}

impl IndexEntry {
    /// True if every key of this block sorts after `key`
    pub fn is_after(&self, key: &[u8]) -> bool {
        self.first_key.as_slice() > key
    }
}

/// Ordered sequence of index entries, one per data block
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockIndex {
    entries: Vec<IndexEntry>,
}

impl BlockIndex {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, first_key: Vec<u8>, handle: BlockHandle) {
        self.entries.push(IndexEntry { first_key, handle });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, block: usize) -> Option<&IndexEntry> {
        self.entries.get(block)
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    /// Find the only block that may contain `key`: the last entry whose
    /// first key is `<= key`, or block 0 when `key` precedes every block.
    ///
    /// `hint` (usually the block a scanner is on) only decides where the
    /// search starts; the result is the same for every hint.
    pub fn find_block(&self, hint: usize, key: &[u8]) -> usize {
        let n = self.entries.len();
        if n == 0 {
            return 0;
        }

        match self.entries.get(hint) {
            Some(entry) if !entry.is_after(key) => {
                let probe_end = (hint + LINEAR_PROBES).min(n - 1);
                let mut i = hint;
                while i < probe_end {
                    if self.entries[i + 1].is_after(key) {
                        return i;
                    }
                    i += 1;
                }
                self.search_from(i, key)
            }
            _ => self.search_from(0, key),
        }
    }

    /// Binary search over `entries[from..]`
    fn search_from(&self, from: usize, key: &[u8]) -> usize {
        let not_after = self.entries[from..].partition_point(|e| !e.is_after(key));
        from + not_after.saturating_sub(1)
    }

    // =========================================================================
    // Encoding
    // =========================================================================

    /// Serialize as magic + `[KeyLen u32][Key][Offset u64][Length u32]`
    /// entries. Returns the bytes and the CRC32 of everything after the
    /// magic.
    pub(crate) fn encode(&self) -> Result<(Vec<u8>, u32)> {
        let size: usize = INDEX_MAGIC.len()
            + self
                .entries
                .iter()
                .map(|e| 4 + e.first_key.len() + 8 + 4)
                .sum::<usize>();
        let mut buf = Vec::with_capacity(size);
        buf.put_slice(INDEX_MAGIC);

        for entry in &self.entries {
            let key_len = u32::try_from(entry.first_key.len()).map_err(|_| {
                HFileError::Format("Index key does not fit a u32 length".to_string())
            })?;
            buf.put_u32(key_len);
            buf.put_slice(&entry.first_key);
            buf.put_u64(entry.handle.offset);
            buf.put_u32(entry.handle.length);
        }

        let crc = crc32fast::hash(&buf[INDEX_MAGIC.len()..]);
        Ok((buf, crc))
    }

    /// Parse exactly `count` entries, checking magic, checksum and key order
    pub(crate) fn decode(data: &[u8], count: usize, expected_crc: u32) -> Result<Self> {
        if data.len() < INDEX_MAGIC.len() || &data[..INDEX_MAGIC.len()] != INDEX_MAGIC {
            return Err(HFileError::Format("Invalid block index magic".to_string()));
        }

        let body = &data[INDEX_MAGIC.len()..];
        let crc = crc32fast::hash(body);
        if crc != expected_crc {
            return Err(HFileError::Format(format!(
                "Block index checksum mismatch: expected {:08x}, got {:08x}",
                expected_crc, crc
            )));
        }

        let truncated = || HFileError::Format("Truncated block index".to_string());

        let mut buf = body;
        // Every entry takes at least 16 bytes, which bounds the allocation
        let mut entries: Vec<IndexEntry> = Vec::with_capacity(count.min(buf.len() / 16));
        for _ in 0..count {
            if buf.remaining() < 4 {
                return Err(truncated());
            }
            let key_len = buf.get_u32() as usize;
            if buf.remaining() < key_len + 12 {
                return Err(truncated());
            }
            let first_key = buf[..key_len].to_vec();
            buf.advance(key_len);
            let offset = buf.get_u64();
            let length = buf.get_u32();

            if let Some(prev) = entries.last() {
                if prev.first_key > first_key {
                    return Err(HFileError::Format(
                        "Block index keys are not sorted".to_string(),
                    ));
                }
            }
            entries.push(IndexEntry {
                first_key,
                handle: BlockHandle { offset, length },
            });
        }

        if buf.has_remaining() {
            return Err(HFileError::Format(format!(
                "{} trailing bytes after block index",
                buf.remaining()
            )));
        }

        Ok(Self { entries })
    }
}
