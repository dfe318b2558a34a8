//! HFile Writer
//!
//! Writes sorted key-value records into blocks, then seals the file with
//! file info, block index and trailer.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::config::Config;
use crate::error::Result;
use crate::store::{ByteSink, FileSink};
use crate::HFileError;

use super::block::BlockBuilder;
use super::index::{BlockHandle, BlockIndex};
use super::order::OrderedKeys;
use super::{FileInfo, FileSummary, Trailer, FORMAT_VERSION};

/// Builds a new file from records supplied in non-decreasing key order.
///
/// Nothing of a block reaches the sink before the block is sealed. A run of
/// equal keys always lands in a single block, even past `block_size`, so
/// every key lives in exactly one block.
pub struct Writer<S: ByteSink> {
    sink: S,
    config: Config,
    /// Block currently being filled
    block: BlockBuilder,
    index: BlockIndex,
    /// Last key written (checked only if `validate_write_order`)
    order: OrderedKeys,
    first_key: Option<Vec<u8>>,
    /// Bytes handed to the sink so far
    offset: u64,
    entry_count: u64,
    total_uncompressed_bytes: u64,
    key_bytes: u64,
    value_bytes: u64,
    user_info: BTreeMap<String, Vec<u8>>,
}

impl Writer<FileSink> {
    /// Create (or truncate) a file at `path`
    pub fn create(path: &Path, config: Config) -> Result<Self> {
        Self::new(FileSink::create(path)?, config)
    }
}

impl<S: ByteSink> Writer<S> {
    pub fn new(sink: S, config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            sink,
            block: BlockBuilder::new(config.block_size),
            config,
            index: BlockIndex::new(),
            order: OrderedKeys::new(),
            first_key: None,
            offset: 0,
            entry_count: 0,
            total_uncompressed_bytes: 0,
            key_bytes: 0,
            value_bytes: 0,
            user_info: BTreeMap::new(),
        })
    }

    /// Append one record.
    ///
    /// Fails with `OutOfOrder` (and writes nothing) if `key` sorts before
    /// the previous key while write order validation is on.
    pub fn write(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        if key.len() > u32::MAX as usize || value.len() > u32::MAX as usize {
            return Err(HFileError::Format(format!(
                "Record too large: key {} bytes, value {} bytes",
                key.len(),
                value.len()
            )));
        }
        if self.config.validate_write_order {
            self.order.check(key)?;
        }

        // Seal lazily so a duplicate run is never split across blocks
        let continues_run = self.order.last() == Some(key);
        if !self.block.is_empty() && self.block.payload_len() >= self.config.block_size && !continues_run {
            self.flush_block()?;
        }

        if self.first_key.is_none() {
            self.first_key = Some(key.to_vec());
        }
        self.block.add(key, value);
        self.order.update(key);
        self.entry_count += 1;
        self.key_bytes += key.len() as u64;
        self.value_bytes += value.len() as u64;
        Ok(())
    }

    /// Add a user entry to the file info section (last write wins)
    pub fn set_file_info(&mut self, name: impl Into<String>, value: impl Into<Vec<u8>>) {
        self.user_info.insert(name.into(), value.into());
    }

    pub fn entry_count(&self) -> u64 {
        self.entry_count
    }

    /// Blocks sealed so far
    pub fn block_count(&self) -> usize {
        self.index.len()
    }

    /// Seal the file and close the sink
    pub fn close(self) -> Result<FileSummary> {
        self.finish().map(|(_, summary)| summary)
    }

    /// Seal the file, close the sink and hand it back
    /// (e.g. to turn a [`MemSink`](crate::store::MemSink) into bytes)
    pub fn finish(mut self) -> Result<(S, FileSummary)> {
        if !self.block.is_empty() {
            self.flush_block()?;
        }

        let last_key = self.order.last().map(|k| k.to_vec());
        let block_count = u32::try_from(self.index.len())
            .map_err(|_| HFileError::Format("Too many blocks for one file".to_string()))?;

        // File info
        let file_info_offset = self.offset;
        let info = FileInfo {
            first_key: self.first_key.clone(),
            last_key: last_key.clone(),
            avg_key_len: self.average(self.key_bytes),
            avg_value_len: self.average(self.value_bytes),
            created_at_ms: now_millis(),
            user: std::mem::take(&mut self.user_info),
        };
        let info_bytes = info.encode()?;
        self.append(&info_bytes)?;

        // Block index
        let index_offset = self.offset;
        let (index_bytes, index_crc) = self.index.encode()?;
        self.append(&index_bytes)?;

        // Trailer
        let trailer = Trailer {
            version: FORMAT_VERSION,
            compression: self.config.compression,
            file_info_offset,
            index_offset,
            index_crc,
            block_count,
            entry_count: self.entry_count,
            total_uncompressed_bytes: self.total_uncompressed_bytes,
        };
        self.append(&trailer.encode())?;
        self.sink.close()?;

        tracing::info!(
            blocks = block_count,
            entries = self.entry_count,
            bytes = self.offset,
            compression = self.config.compression.name(),
            "Sealed hfile"
        );

        let summary = FileSummary {
            block_count,
            entry_count: self.entry_count,
            total_uncompressed_bytes: self.total_uncompressed_bytes,
            file_size: self.offset,
            first_key: self.first_key,
            last_key,
        };
        Ok((self.sink, summary))
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Seal the current block: header, compression, sink, index entry.
    /// On failure the block is left as it was, so the write can be retried.
    fn flush_block(&mut self) -> Result<()> {
        let raw = self.block.seal()?;
        let raw_len = raw.len() as u64;
        let stored = self.config.compression.compress(raw)?;

        let length = u32::try_from(stored.len()).map_err(|_| {
            HFileError::Format(format!("Block of {} bytes is too large", stored.len()))
        })?;
        let handle = BlockHandle {
            offset: self.offset,
            length,
        };

        self.sink.append(&stored)?;
        self.offset += stored.len() as u64;
        self.total_uncompressed_bytes += raw_len;
        let first_key = self.block.first_key().unwrap_or_default().to_vec();
        self.block.clear();

        tracing::debug!(
            block = self.index.len(),
            offset = handle.offset,
            stored = handle.length,
            uncompressed = raw_len,
            "Flushed block"
        );
        self.index.push(first_key, handle);
        Ok(())
    }

    fn append(&mut self, bytes: &[u8]) -> Result<()> {
        self.sink.append(bytes)?;
        self.offset += bytes.len() as u64;
        Ok(())
    }

    fn average(&self, total: u64) -> u32 {
        if self.entry_count == 0 {
            0
        } else {
            (total / self.entry_count).min(u32::MAX as u64) as u32
        }
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
