//! File Info
//!
//! Metadata section written between the data blocks and the block index.

use std::collections::BTreeMap;

use bincode::Options;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// File-level metadata: key range, average record shape and free-form
/// user entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    /// Smallest key in the file
    pub first_key: Option<Vec<u8>>,
    /// Largest key in the file
    pub last_key: Option<Vec<u8>>,
    pub avg_key_len: u32,
    pub avg_value_len: u32,
    /// Unix millis at close time
    pub created_at_ms: u64,
    /// Entries added with [`Writer::set_file_info`](crate::Writer::set_file_info)
    pub user: BTreeMap<String, Vec<u8>>,
}

impl FileInfo {
    /// Look up a user entry
    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.user.get(name).map(|v| v.as_slice())
    }

    pub(crate) fn encode(&self) -> Result<Vec<u8>> {
        Ok(Self::options().serialize(self)?)
    }

    /// Decode a section of known length. The length bounds every
    /// allocation bincode makes, so a corrupt file cannot request more.
    pub(crate) fn decode(data: &[u8]) -> Result<Self> {
        Ok(Self::options()
            .with_limit(data.len() as u64)
            .deserialize(data)?)
    }

    fn options() -> impl Options {
        bincode::DefaultOptions::new()
            .with_fixint_encoding()
            .with_big_endian()
    }
}
