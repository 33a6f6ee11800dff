//! DID-keyed dataset storage.
//!
//! Every dataset lives in `<storage root>/<hex digest of its DID>`. Uploads
//! are staged to disk, classified by file name and then either expanded
//! (zip, tar, tar.gz) or copied verbatim into that directory. Read-back and
//! deletion address datasets by storage key.
//!
//! All operations block; callers on an async runtime should move them onto
//! a blocking pool.

pub use config::StoreConfig;
pub use error::{Error, ErrorKind, Result};
pub use key::{KeyDigest, StorageKey};
pub use stage::{StagedInput, UploadPayload, stage};
pub use store::{DatasetFile, StoreManager, UploadReport};

pub use datahub_archive::Format;

mod config;
mod error;
mod key;
mod paths;
mod stage;
mod store;
