//! Trailer
//!
//! Fixed-size record at the very end of the file. Readers start here.

use bytes::{Buf, BufMut};

use crate::codec::Compression;
use crate::error::Result;
use crate::HFileError;

use super::{FORMAT_VERSION, TRAILER_MAGIC, TRAILER_SIZE};

/// File-level metadata, 56 bytes on disk:
///
/// ```text
/// Magic (8) | Version u32 | Codec u32 | FileInfoOffset u64 | IndexOffset u64 |
/// IndexCRC u32 | BlockCount u32 | EntryCount u64 | TotalUncompressedBytes u64
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trailer {
    pub version: u32,
    pub compression: Compression,
    pub file_info_offset: u64,
    pub index_offset: u64,
    pub index_crc: u32,
    pub block_count: u32,
    pub entry_count: u64,
    /// Sum of decoded block sizes, used to size scanner buffers
    pub total_uncompressed_bytes: u64,
}

impl Trailer {
    pub(crate) fn encode(&self) -> [u8; TRAILER_SIZE] {
        let mut out = [0u8; TRAILER_SIZE];
        let mut buf: &mut [u8] = &mut out;
        buf.put_slice(TRAILER_MAGIC);
        buf.put_u32(self.version);
        buf.put_u32(self.compression.id());
        buf.put_u64(self.file_info_offset);
        buf.put_u64(self.index_offset);
        buf.put_u32(self.index_crc);
        buf.put_u32(self.block_count);
        buf.put_u64(self.entry_count);
        buf.put_u64(self.total_uncompressed_bytes);
        out
    }

    pub(crate) fn decode(data: &[u8]) -> Result<Self> {
        if data.len() != TRAILER_SIZE {
            return Err(HFileError::Format(format!(
                "Trailer must be {} bytes, got {}",
                TRAILER_SIZE,
                data.len()
            )));
        }
        if &data[..TRAILER_MAGIC.len()] != TRAILER_MAGIC {
            return Err(HFileError::Format(format!(
                "Invalid trailer magic: {:?}",
                &data[..TRAILER_MAGIC.len()]
            )));
        }

        let mut buf = &data[TRAILER_MAGIC.len()..];
        let version = buf.get_u32();
        if version != FORMAT_VERSION {
            return Err(HFileError::Format(format!(
                "Unsupported format version: {}",
                version
            )));
        }

        Ok(Self {
            version,
            compression: Compression::try_from(buf.get_u32())?,
            file_info_offset: buf.get_u64(),
            index_offset: buf.get_u64(),
            index_crc: buf.get_u32(),
            block_count: buf.get_u32(),
            entry_count: buf.get_u64(),
            total_uncompressed_bytes: buf.get_u64(),
        })
    }

    /// Check the section offsets against the file length
    pub(crate) fn validate(&self, file_len: u64) -> Result<()> {
        let trailer_start = file_len - TRAILER_SIZE as u64;
        if self.file_info_offset > self.index_offset || self.index_offset > trailer_start {
            return Err(HFileError::Format(format!(
                "Section offsets out of range: file info {}, index {}, trailer {}",
                self.file_info_offset, self.index_offset, trailer_start
            )));
        }
        if (self.block_count == 0) != (self.entry_count == 0) {
            return Err(HFileError::Format(format!(
                "{} blocks but {} entries",
                self.block_count, self.entry_count
            )));
        }
        Ok(())
    }
}
