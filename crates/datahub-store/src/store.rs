use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use datahub_archive::{ExtractReport, Format};
use serde::Serialize;

use crate::config::StoreConfig;
use crate::error::{Error, Result};
use crate::key::{KeyDigest, StorageKey};
use crate::paths;
use crate::stage::{self, UploadPayload};

/// Outcome of a completed upload.
#[derive(Clone, Debug, Serialize)]
pub struct UploadReport {
    pub key: StorageKey,
    pub format: String,
    pub entries: Vec<String>,
    pub total_bytes: u64,
    pub skipped: usize,
}

impl UploadReport {
    fn new(key: StorageKey, report: &ExtractReport) -> Self {
        let entries = report
            .files()
            .map(|e| {
                e.path
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/")
            })
            .collect();

        Self {
            key,
            format: report.format.to_string(),
            entries,
            total_bytes: report.total_bytes,
            skipped: report.skipped,
        }
    }
}

/// An opened dataset file, ready to stream.
#[derive(Debug)]
pub struct DatasetFile {
    pub path: PathBuf,
    pub len: u64,
    file: fs::File,
}

impl DatasetFile {
    pub fn into_file(self) -> fs::File {
        self.file
    }
}

impl Read for DatasetFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }
}

/// Owns one storage root and every dataset directory beneath it.
#[derive(Clone, Debug)]
pub struct StoreManager {
    root: PathBuf,
    digest: KeyDigest,
    staging_dir: PathBuf,
}

impl StoreManager {
    /// Validate the configuration and create the storage root if missing.
    pub fn new(config: StoreConfig) -> Result<Self> {
        if !config.storage_root.is_absolute() {
            return Err(Error::InvalidRoot(config.storage_root));
        }
        paths::ensure_dir(&config.storage_root)?;

        let staging_dir = config.staging_dir.unwrap_or_else(std::env::temp_dir);
        paths::ensure_dir(&staging_dir)?;

        Ok(Self {
            root: config.storage_root,
            digest: config.key_digest,
            staging_dir,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn key_digest(&self) -> KeyDigest {
        self.digest
    }

    /// Storage key for `did`. Touches nothing on disk.
    pub fn key_for(&self, did: &str) -> StorageKey {
        StorageKey::from_did(did, self.digest)
    }

    /// Dataset directory for `did`, created if missing.
    pub fn resolve_dataset_dir(&self, did: &str) -> Result<PathBuf> {
        let dir = paths::key_dir(&self.root, self.key_for(did).as_str())?;
        paths::ensure_dir(&dir)?;
        Ok(dir)
    }

    /// Stage the payload, then expand or copy it into the DID's directory.
    ///
    /// Earlier contents of the directory are kept; files with the same
    /// relative path are overwritten. A failure partway leaves whatever was
    /// already written.
    pub fn upload(&self, payload: &UploadPayload) -> Result<UploadReport> {
        if payload.did.is_empty() {
            return Err(Error::MissingField("did"));
        }
        if payload.file.is_empty() {
            return Err(Error::MissingField("file"));
        }

        let staged = stage::stage(payload, &self.staging_dir)?;
        let key = self.key_for(&payload.did);
        tracing::info!(did = %payload.did, %key, temporary = staged.is_temporary(), "upload started");

        let target = self.resolve_dataset_dir(&payload.did)?;
        let format = Format::classify(staged.path());

        let report = format
            .extractor()?
            .extract(staged.path(), &target)
            .inspect_err(|err| tracing::warn!(%key, %format, %err, "upload failed"))?;

        tracing::info!(
            %key,
            %format,
            entries = report.entry_count(),
            bytes = report.total_bytes,
            skipped = report.skipped,
            "upload completed"
        );

        Ok(UploadReport::new(key, &report))
    }

    /// Keys of every dataset directory, in filesystem order.
    pub fn list(&self) -> Result<Vec<StorageKey>> {
        let mut keys = Vec::new();

        for entry in fs::read_dir(&self.root).map_err(Error::io(&self.root))? {
            let entry = entry.map_err(Error::io(&self.root))?;
            let file_type = entry.file_type().map_err(Error::io(entry.path()))?;
            if file_type.is_dir() {
                keys.push(StorageKey::new(entry.file_name().to_string_lossy()));
            }
        }

        Ok(keys)
    }

    /// Every regular file in a dataset, `/`-separated and sorted.
    pub fn list_files(&self, key: &str) -> Result<Vec<String>> {
        let dir = self.existing_dataset(key)?;
        paths::walk_files(&dir)
    }

    /// Open `relative` inside dataset `key` for streaming.
    pub fn read_file(&self, key: &str, relative: &str) -> Result<DatasetFile> {
        let dir = self.existing_dataset(key)?;
        let path = paths::entry_path(&dir, relative)?;

        let metadata = match fs::metadata(&path) {
            Ok(metadata) if metadata.is_file() => metadata,
            Ok(_) => return Err(Error::NotFound(path)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(Error::NotFound(path)),
            Err(e) => return Err(Error::io(path)(e)),
        };

        let file = fs::File::open(&path).map_err(Error::io(&path))?;
        Ok(DatasetFile {
            path,
            len: metadata.len(),
            file,
        })
    }

    /// Remove a dataset directory and everything in it.
    pub fn delete(&self, key: &str) -> Result<()> {
        let dir = self.existing_dataset(key)?;
        fs::remove_dir_all(&dir).map_err(Error::io(&dir))?;
        tracing::info!(%key, "dataset deleted");
        Ok(())
    }

    fn existing_dataset(&self, key: &str) -> Result<PathBuf> {
        let dir = paths::key_dir(&self.root, key)?;
        if !dir.is_dir() {
            return Err(Error::NotFound(dir));
        }
        Ok(dir)
    }
}
