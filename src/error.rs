//! Error types for hfile
//!
//! Provides a unified error type for writing, opening and scanning files.
//! "Key not found" is never an error: lookups report it as `None` or an
//! empty result.

use thiserror::Error;

/// Result type alias using HFileError
pub type Result<T> = std::result::Result<T, HFileError>;

/// Unified error type for hfile operations
#[derive(Debug, Error)]
pub enum HFileError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    /// Byte store failure. Surfaced as-is, never retried internally.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // File Format Errors
    // -------------------------------------------------------------------------
    /// Trailer, file info or block index cannot be parsed; the file cannot
    /// be opened.
    #[error("Format error: {0}")]
    Format(String),

    /// Malformed block discovered during a lookup. The scanner must be
    /// reset before it is used again.
    #[error("Decode error: {0}")]
    Decode(String),

    // -------------------------------------------------------------------------
    // Ordering Errors
    // -------------------------------------------------------------------------
    /// A key arrived before a key it should follow (query or write order).
    #[error("Key out of order: {key:?} < {previous:?}")]
    OutOfOrder { previous: Vec<u8>, key: Vec<u8> },

    // -------------------------------------------------------------------------
    // Codec Errors
    // -------------------------------------------------------------------------
    #[error("Compression error: {0}")]
    Compression(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<bincode::Error> for HFileError {
    fn from(e: bincode::Error) -> Self {
        HFileError::Format(format!("file info: {}", e))
    }
}
