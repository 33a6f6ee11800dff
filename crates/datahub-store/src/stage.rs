//! Turns an upload payload into a file on disk the extractors can read.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use tempfile::{NamedTempFile, TempDir};

use crate::error::{Error, Result};

/// Body of an upload request.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct UploadPayload {
    #[serde(default)]
    pub did: String,
    /// Either a path readable by the service or base64 file content.
    #[serde(default)]
    pub file: String,
    /// File name for inline content, used for classification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl UploadPayload {
    pub fn new(did: impl Into<String>, file: impl Into<String>) -> Self {
        Self {
            did: did.into(),
            file: file.into(),
            name: None,
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// A payload materialized on disk. Temporary backing storage is removed
/// when this value drops; a caller-supplied path is left alone.
#[derive(Debug)]
pub struct StagedInput {
    path: PathBuf,
    holder: Holder,
}

#[derive(Debug)]
enum Holder {
    Existing,
    File { _guard: NamedTempFile },
    Dir { _guard: TempDir },
}

impl StagedInput {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_temporary(&self) -> bool {
        !matches!(self.holder, Holder::Existing)
    }
}

/// Stage `payload.file`.
///
/// An existing file is used in place; a directory is rejected. Anything
/// else is decoded as standard base64 first, and only then written under
/// `staging_dir`, so an undecodable payload creates nothing.
pub fn stage(payload: &UploadPayload, staging_dir: &Path) -> Result<StagedInput> {
    let candidate = Path::new(&payload.file);
    let metadata = fs::metadata(candidate).ok();
    if metadata.as_ref().is_some_and(|m| m.is_dir()) {
        return Err(Error::DirectoryPayload(candidate.to_path_buf()));
    }
    if metadata.is_some_and(|m| m.is_file()) {
        tracing::debug!(path = %candidate.display(), "staging existing path");
        return Ok(StagedInput {
            path: candidate.to_path_buf(),
            holder: Holder::Existing,
        });
    }

    let bytes = STANDARD.decode(payload.file.as_bytes())?;

    match payload.name.as_deref() {
        Some(hint) => stage_named(&bytes, hint, staging_dir),
        None => stage_anonymous(&bytes, staging_dir),
    }
}

fn stage_anonymous(bytes: &[u8], staging_dir: &Path) -> Result<StagedInput> {
    let mut file = tempfile::Builder::new()
        .prefix("upload-")
        .tempfile_in(staging_dir)
        .map_err(Error::io(staging_dir))?;
    let path = file.path().to_path_buf();

    file.write_all(bytes)
        .and_then(|()| file.flush())
        .map_err(Error::io(&path))?;

    Ok(StagedInput {
        path,
        holder: Holder::File { _guard: file },
    })
}

/// The hint becomes the real file name, inside a private temp directory,
/// so both classification and the opaque copy see it.
fn stage_named(bytes: &[u8], hint: &str, staging_dir: &Path) -> Result<StagedInput> {
    let file_name = Path::new(hint)
        .file_name()
        .ok_or_else(|| Error::PathEscape {
            path: PathBuf::from(hint),
            base: staging_dir.to_path_buf(),
        })?;

    let dir = tempfile::Builder::new()
        .prefix("upload-")
        .tempdir_in(staging_dir)
        .map_err(Error::io(staging_dir))?;
    let path = dir.path().join(file_name);
    fs::write(&path, bytes).map_err(Error::io(&path))?;

    Ok(StagedInput {
        path,
        holder: Holder::Dir { _guard: dir },
    })
}
