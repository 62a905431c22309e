//! Zip extraction with path sanitization, and recompression of directory trees.
//!
//! # Architecture
//!
//! - `sanitize.rs` - Entry path resolution (zip-slip prevention)
//! - `extract/` - Entry sources and the streaming extraction loop
//! - `compress.rs` - Directory tree to archive
//! - `options.rs` - Builder options and compression levels
//! - `entry.rs` - Extraction report types

pub use compress::{CompressedEntry, CompressionReport, EntryFault, compress};
pub use entry::{Entry, EntryKind, ExtractionReport};
pub use error::{Error, Result};
pub use extract::{EntrySource, ZipSource, extract, extract_archive};
pub use options::{CompressOptions, CompressionLevel, ExtractOptions};
pub use sanitize::{SanitizedPath, sanitize_entry_path};

mod compress;
pub mod entry;
mod error;
pub mod extract;
pub mod options;
mod sanitize;
