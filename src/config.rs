//! Configuration for hfile
//!
//! Centralized writer/reader configuration with sensible defaults.

use crate::codec::Compression;
use crate::error::{HFileError, Result};
use crate::hfile::BLOCK_HEADER_SIZE;

/// Largest block size whose sealed block still fits the u32 length header
pub const MAX_BLOCK_SIZE: usize = u32::MAX as usize - BLOCK_HEADER_SIZE;

/// Configuration shared by [`Writer`](crate::Writer) and [`Reader`](crate::Reader)
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Writer Configuration
    // -------------------------------------------------------------------------
    /// Uncompressed size (in bytes) at which a block is sealed.
    /// A run of equal keys is never split, so blocks may exceed this.
    pub block_size: usize,

    /// Codec applied to every block
    pub compression: Compression,

    /// Reject writes whose key is smaller than the previous key
    pub validate_write_order: bool,

    // -------------------------------------------------------------------------
    // Reader Configuration
    // -------------------------------------------------------------------------
    /// Max idle scanners kept for reuse per reader
    pub scanner_pool_size: usize,

    /// Whether new scanners reject queries that go backwards.
    /// Turning this off is faster but may return wrong results rather than
    /// an error on out-of-order keys.
    pub enforce_key_order: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            block_size: 64 * 1024, // 64 KB
            compression: Compression::None,
            validate_write_order: true,
            scanner_pool_size: 16,
            enforce_key_order: true,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check that the values can be used to write or read a file
    pub fn validate(&self) -> Result<()> {
        if self.block_size == 0 {
            return Err(HFileError::Config("block_size must be > 0".to_string()));
        }
        if self.block_size > MAX_BLOCK_SIZE {
            return Err(HFileError::Config(format!(
                "block_size must be <= {} (got {})",
                MAX_BLOCK_SIZE, self.block_size
            )));
        }
        if self.scanner_pool_size == 0 {
            return Err(HFileError::Config(
                "scanner_pool_size must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the block size threshold (in bytes)
    pub fn block_size(mut self, size: usize) -> Self {
        self.config.block_size = size;
        self
    }

    /// Set the block codec
    pub fn compression(mut self, compression: Compression) -> Self {
        self.config.compression = compression;
        self
    }

    /// Shorthand: Snappy when `true`, no compression otherwise
    pub fn compress(self, compress: bool) -> Self {
        self.compression(if compress {
            Compression::Snappy
        } else {
            Compression::None
        })
    }

    /// Enable/disable write order validation
    pub fn validate_write_order(mut self, validate: bool) -> Self {
        self.config.validate_write_order = validate;
        self
    }

    /// Set the number of idle scanners a reader keeps
    pub fn scanner_pool_size(mut self, size: usize) -> Self {
        self.config.scanner_pool_size = size;
        self
    }

    /// Enable/disable query order enforcement on new scanners
    pub fn enforce_key_order(mut self, enforce: bool) -> Self {
        self.config.enforce_key_order = enforce;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
