//! HFile Module
//!
//! Immutable, sorted, block-compressed key-value files.
//!
//! ## File Format
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │ Data Blocks (repeated, each optionally compressed)          │
//! │   Header: PayloadLen u32 (4) | PayloadCRC32 u32 (4)         │
//! │   [KeyLen: u32][ValLen: u32][Key][Value] ... repeated       │
//! ├─────────────────────────────────────────────────────────────┤
//! │ File Info (bincode)                                         │
//! │   first/last key, avg key/value length, user entries        │
//! ├─────────────────────────────────────────────────────────────┤
//! │ Block Index                                                 │
//! │   Magic "IDXBLK)+" (8)                                      │
//! │   [KeyLen: u32][FirstKey][Offset: u64][Length: u32] ...     │
//! ├─────────────────────────────────────────────────────────────┤
//! │ Trailer (56 bytes)                                          │
//! │   Magic "TRABLK\"$" | Version | Codec | FileInfoOffset |    │
//! │   IndexOffset | IndexCRC | BlockCount | EntryCount |        │
//! │   TotalUncompressedBytes                                    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! All integers are big-endian. Keys compare as unsigned bytes, so integer
//! keys must be encoded big-endian for numeric order to match.

mod block;
mod file_info;
mod index;
mod iterator;
mod order;
mod reader;
mod scanner;
mod trailer;
mod writer;

pub use block::BlockBuffer;
pub use file_info::FileInfo;
pub use index::{BlockHandle, BlockIndex, IndexEntry};
pub use iterator::HFileIterator;
pub use order::OrderedKeys;
pub use reader::Reader;
pub use scanner::Scanner;
pub use trailer::Trailer;
pub use writer::Writer;

// =============================================================================
// Shared Constants (used by writer, reader, scanner)
// =============================================================================

/// Magic bytes opening the trailer
pub(crate) const TRAILER_MAGIC: &[u8; 8] = b"TRABLK\"$";

/// Magic bytes opening the block index
pub(crate) const INDEX_MAGIC: &[u8; 8] = b"IDXBLK)+";

/// Current file format version
pub(crate) const FORMAT_VERSION: u32 = 1;

/// Block header: PayloadLen (4) + PayloadCRC32 (4) = 8 bytes
pub(crate) const BLOCK_HEADER_SIZE: usize = 8;

/// Record header: KeyLen (4) + ValLen (4) = 8 bytes
pub(crate) const RECORD_HEADER_SIZE: usize = 8;

/// Trailer size, see [`Trailer`]
pub(crate) const TRAILER_SIZE: usize = 56;

// =============================================================================
// Write Summary
// =============================================================================

/// What a [`Writer`] produced, returned on close
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSummary {
    /// Number of data blocks
    pub block_count: u32,
    /// Number of records
    pub entry_count: u64,
    /// Sum of decoded block sizes (headers included)
    pub total_uncompressed_bytes: u64,
    /// Total bytes written, trailer included
    pub file_size: u64,
    /// Smallest key, `None` for an empty file
    pub first_key: Option<Vec<u8>>,
    /// Largest key, `None` for an empty file
    pub last_key: Option<Vec<u8>>,
}
