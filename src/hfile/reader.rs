//! HFile Reader
//!
//! Opens a sealed file, loads its block index, fetches blocks and hands out
//! pooled scanners.

use std::path::Path;

use bytes::Bytes;
use crossbeam::channel::{self, Receiver, Sender};

use crate::codec::Compression;
use crate::config::Config;
use crate::error::Result;
use crate::store::{ByteSource, FileSource};
use crate::HFileError;

use super::block::{verify_block, BlockBuffer};
use super::index::BlockIndex;
use super::iterator::HFileIterator;
use super::scanner::{ScanState, Scanner};
use super::{FileInfo, Trailer, TRAILER_SIZE};

/// Read side of a sealed file.
///
/// ## Concurrency
/// - `index`, `trailer`, `file_info`: immutable after `open`, shared freely
/// - `source`: `ByteSource` is `Sync`; concurrent block fetches are fine
/// - scanner pool: bounded channel, never blocks (miss → allocate, full → drop)
///
/// A `Reader` can be shared by reference across threads, each thread using
/// its own [`Scanner`].
pub struct Reader {
    source: Box<dyn ByteSource>,
    config: Config,
    trailer: Trailer,
    index: BlockIndex,
    file_info: FileInfo,
    /// Idle scanner states waiting for reuse
    pool_tx: Sender<ScanState>,
    pool_rx: Receiver<ScanState>,
}

impl Reader {
    /// Open a file from any byte source
    ///
    /// Reads, in order: trailer (from the tail), file info, block index.
    /// Anything that does not parse is a `Format` error.
    pub fn open(source: impl ByteSource + 'static, config: Config) -> Result<Self> {
        config.validate()?;
        let source: Box<dyn ByteSource> = Box::new(source);

        let file_len = source.len()?;
        if file_len < TRAILER_SIZE as u64 {
            return Err(HFileError::Format(format!(
                "File of {} bytes is too short for a trailer",
                file_len
            )));
        }

        let mut trailer_bytes = [0u8; TRAILER_SIZE];
        source.read_at(file_len - TRAILER_SIZE as u64, &mut trailer_bytes)?;
        let trailer = Trailer::decode(&trailer_bytes)?;
        trailer.validate(file_len)?;

        let mut info_bytes = vec![0u8; (trailer.index_offset - trailer.file_info_offset) as usize];
        source.read_at(trailer.file_info_offset, &mut info_bytes)?;
        let file_info = FileInfo::decode(&info_bytes)?;

        let index_len = file_len - TRAILER_SIZE as u64 - trailer.index_offset;
        let mut index_bytes = vec![0u8; index_len as usize];
        source.read_at(trailer.index_offset, &mut index_bytes)?;
        let index = BlockIndex::decode(&index_bytes, trailer.block_count as usize, trailer.index_crc)?;

        // Every block must sit inside the data section
        if let Some(entry) = index
            .entries()
            .iter()
            .find(|e| e.handle.end() > trailer.file_info_offset)
        {
            return Err(HFileError::Format(format!(
                "Block at {} (+{}) overlaps the file info section at {}",
                entry.handle.offset, entry.handle.length, trailer.file_info_offset
            )));
        }

        tracing::info!(
            blocks = trailer.block_count,
            entries = trailer.entry_count,
            compression = trailer.compression.name(),
            "Opened hfile"
        );

        let (pool_tx, pool_rx) = channel::bounded(config.scanner_pool_size);
        Ok(Self {
            source,
            config,
            trailer,
            index,
            file_info,
            pool_tx,
            pool_rx,
        })
    }

    /// Open a local file
    pub fn open_path(path: &Path, config: Config) -> Result<Self> {
        Self::open(FileSource::open(path)?, config)
    }

    /// Open a file held in memory
    pub fn from_bytes(bytes: impl Into<Bytes>, config: Config) -> Result<Self> {
        Self::open(bytes.into(), config)
    }

    // =========================================================================
    // Block Access
    // =========================================================================

    /// Index of the only block that may contain `key`, searching from
    /// `hint`. See [`BlockIndex::find_block`].
    pub fn find_block(&self, hint: usize, key: &[u8]) -> usize {
        self.index.find_block(hint, key)
    }

    /// Fetch and decode block `block` into `buf`, returning the decoded
    /// bytes (header included).
    ///
    /// Buffers are grown only when undersized. Store failures are `Io`
    /// errors; undecodable blocks are `Decode` errors.
    pub fn get_block<'b>(&self, block: usize, buf: &'b mut BlockBuffer) -> Result<&'b [u8]> {
        let entry = self.index.get(block).ok_or_else(|| {
            HFileError::Decode(format!(
                "Block {} out of range ({} blocks)",
                block,
                self.index.len()
            ))
        })?;
        let handle = entry.handle;
        let max_len = self.trailer.total_uncompressed_bytes as usize;

        match self.trailer.compression {
            Compression::None => {
                buf.decoded.resize(handle.length as usize, 0);
                self.source.read_at(handle.offset, &mut buf.decoded)?;
            }
            codec => {
                buf.compressed.resize(handle.length as usize, 0);
                self.source.read_at(handle.offset, &mut buf.compressed)?;
                codec.decompress_into(&buf.compressed, &mut buf.decoded, max_len)?;
            }
        }

        verify_block(&buf.decoded)?;
        Ok(&buf.decoded)
    }

    // =========================================================================
    // Scanner Pool
    // =========================================================================

    /// Take an idle scanner from the pool, or create one
    pub fn scanner(&self) -> Scanner<'_> {
        let mut state = match self.pool_rx.try_recv() {
            Ok(state) => state,
            Err(_) => {
                let capacity = self.scanner_buffer_capacity();
                tracing::debug!(capacity, "Scanner pool miss, allocating");
                ScanState::new(capacity)
            }
        };
        state.set_enforce_key_order(self.config.enforce_key_order);
        Scanner::new(self, state)
    }

    /// Return a (reset) scanner state to the pool, dropping it if full
    pub(crate) fn recycle(&self, state: ScanState) {
        if self.pool_tx.try_send(state).is_err() {
            tracing::trace!("Scanner pool full, dropping scanner");
        }
    }

    /// Idle scanners currently pooled
    pub fn idle_scanners(&self) -> usize {
        self.pool_rx.len()
    }

    /// Initial buffer size for new scanners: 1.5x the average decoded
    /// block size. Only an estimate; buffers grow when a block is larger.
    pub fn scanner_buffer_capacity(&self) -> usize {
        if self.trailer.block_count == 0 {
            return 0;
        }
        let average = self.trailer.total_uncompressed_bytes / self.trailer.block_count as u64;
        (average as f64 * 1.5) as usize
    }

    // =========================================================================
    // Metadata
    // =========================================================================

    /// Iterate over every record in file order
    pub fn iter(&self) -> HFileIterator<'_> {
        HFileIterator::new(self)
    }

    pub fn index(&self) -> &BlockIndex {
        &self.index
    }

    pub fn trailer(&self) -> &Trailer {
        &self.trailer
    }

    pub fn file_info(&self) -> &FileInfo {
        &self.file_info
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn compression(&self) -> Compression {
        self.trailer.compression
    }

    pub fn block_count(&self) -> usize {
        self.index.len()
    }

    pub fn entry_count(&self) -> u64 {
        self.trailer.entry_count
    }

    pub fn total_uncompressed_bytes(&self) -> u64 {
        self.trailer.total_uncompressed_bytes
    }
}
