//! # hfile
//!
//! Immutable, sorted, block-compressed key-value files:
//! - Write once, in key order, through a [`Writer`]
//! - Open many times with a [`Reader`], share it across threads
//! - Look keys up with pooled, forward-moving [`Scanner`]s
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Writer                               │
//! │        (sorted records → blocks → index → trailer)           │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ sealed file bytes
//!                       ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   ByteSource / ByteSink                      │
//! │                 (local file, in-memory)                      │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                         Reader                               │
//! │        (trailer, block index, block fetch + codec)           │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌──────────────┐
//!   │   Scanner   │   ...    │ Scanner pool │
//!   │ (per caller)│ ◀──────▶ │ (bounded ch) │
//!   └─────────────┘          └──────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use hfile::{Config, Reader, Writer};
//! use hfile::store::MemSink;
//!
//! let config = Config::builder().compress(true).build();
//! let mut writer = Writer::new(MemSink::new(), config.clone()).unwrap();
//! writer.write(b"apple", b"red").unwrap();
//! writer.write(b"banana", b"yellow").unwrap();
//! let (sink, _summary) = writer.finish().unwrap();
//!
//! let reader = Reader::from_bytes(sink.into_bytes(), config).unwrap();
//! let mut scanner = reader.scanner();
//! assert_eq!(scanner.get_first(b"banana").unwrap(), Some(b"yellow".to_vec()));
//! assert_eq!(scanner.get_first(b"cherry").unwrap(), None);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod codec;
pub mod store;
pub mod hfile;
pub mod testdata;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{HFileError, Result};
pub use config::{Config, MAX_BLOCK_SIZE};
pub use codec::Compression;
pub use hfile::{FileInfo, FileSummary, Reader, Scanner, Writer};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of hfile
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
