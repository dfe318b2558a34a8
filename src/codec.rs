//! Block Codecs
//!
//! Whole-block compression. The codec id is persisted in the trailer, so
//! the numeric values below are part of the file format.

use crate::error::{HFileError, Result};

/// Compression applied to each block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u32)]
pub enum Compression {
    /// Identity codec
    #[default]
    None = 0,
    /// Snappy raw format
    Snappy = 1,
}

impl TryFrom<u32> for Compression {
    type Error = HFileError;

    fn try_from(value: u32) -> Result<Self> {
        match value {
            0 => Ok(Compression::None),
            1 => Ok(Compression::Snappy),
            _ => Err(HFileError::Format(format!(
                "Unknown compression codec id: {}",
                value
            ))),
        }
    }
}

impl Compression {
    /// Stable id written to the trailer
    pub fn id(self) -> u32 {
        self as u32
    }

    pub fn name(self) -> &'static str {
        match self {
            Compression::None => "none",
            Compression::Snappy => "snappy",
        }
    }

    /// Compress a whole block
    pub fn compress(self, data: &[u8]) -> Result<Vec<u8>> {
        match self {
            Compression::None => Ok(data.to_vec()),
            Compression::Snappy => snap::raw::Encoder::new()
                .compress_vec(data)
                .map_err(|e| HFileError::Compression(format!("Snappy compression failed: {}", e))),
        }
    }

    /// Decompress `src` into `dst`, reusing its allocation.
    ///
    /// `dst` is resized to exactly the decoded length; its capacity only
    /// grows when undersized. A decoded length above `max_len` is rejected
    /// before anything is allocated. Returns the decoded length.
    pub fn decompress_into(self, src: &[u8], dst: &mut Vec<u8>, max_len: usize) -> Result<usize> {
        match self {
            Compression::None => {
                if src.len() > max_len {
                    return Err(HFileError::Decode(format!(
                        "Block length {} exceeds limit {}",
                        src.len(),
                        max_len
                    )));
                }
                dst.clear();
                dst.extend_from_slice(src);
                Ok(dst.len())
            }
            Compression::Snappy => {
                let len = snap::raw::decompress_len(src)
                    .map_err(|e| HFileError::Decode(format!("Snappy header: {}", e)))?;
                if len > max_len {
                    return Err(HFileError::Decode(format!(
                        "Decoded block length {} exceeds limit {}",
                        len, max_len
                    )));
                }
                dst.resize(len, 0);
                let written = snap::raw::Decoder::new()
                    .decompress(src, dst)
                    .map_err(|e| HFileError::Decode(format!("Snappy decompression failed: {}", e)))?;
                dst.truncate(written);
                Ok(written)
            }
        }
    }
}
