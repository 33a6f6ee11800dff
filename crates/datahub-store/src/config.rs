use std::path::{Path, PathBuf};

use crate::key::KeyDigest;

/// Settings a [`StoreManager`](crate::StoreManager) is constructed from.
#[derive(Clone, Debug)]
pub struct StoreConfig {
    pub storage_root: PathBuf,
    pub key_digest: KeyDigest,
    /// Where inline payloads are staged. System temp dir when unset.
    pub staging_dir: Option<PathBuf>,
}

impl StoreConfig {
    pub fn new(storage_root: impl Into<PathBuf>) -> Self {
        Self {
            storage_root: storage_root.into(),
            key_digest: KeyDigest::default(),
            staging_dir: None,
        }
    }

    pub fn key_digest(mut self, digest: KeyDigest) -> Self {
        self.key_digest = digest;
        self
    }

    pub fn staging_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.staging_dir = Some(dir.as_ref().to_path_buf());
        self
    }
}
