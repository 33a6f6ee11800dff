//! Archive classification and extraction with path-escape protection.
//!
//! # Architecture
//!
//! - `format.rs` - Filename-based format classification
//! - `sanitize.rs` - Entry path cleaning (zip-slip prevention)
//! - `entry.rs` - Entry kinds and extraction reports
//! - `extract/` - Per-format extraction strategies

pub use entry::{EntryKind, ExtractReport, ExtractedEntry};
pub use error::{Error, Result};
pub use extract::{Extractor, OpaqueCopy, extract};
pub use format::Format;
pub use sanitize::resolve_entry_path;

#[cfg(feature = "tar")]
pub use extract::{TarExtractor, TarGzExtractor};
#[cfg(feature = "zip")]
pub use extract::ZipExtractor;

mod entry;
mod error;
pub mod extract;
mod format;
mod sanitize;
