use std::io;
use std::path::PathBuf;

use crate::Format;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("support for {0} archives is not compiled in")]
    UnsupportedFormat(Format),

    #[error("path '{entry}' escapes base directory '{base}'")]
    PathEscape { entry: PathBuf, base: PathBuf },

    #[error("malformed {format} archive '{path}': {reason}")]
    Format {
        format: Format,
        path: PathBuf,
        reason: String,
    },

    #[error("failed to decompress '{path}': {reason}")]
    Decompress { path: PathBuf, reason: String },

    #[error("failed to extract '{path}': {source}")]
    ExtractionFailed { path: PathBuf, source: io::Error },

    #[error("failed to create directory: {path}: {source}")]
    DirectoryCreationFailed { path: PathBuf, source: io::Error },

    #[error("failed to open '{path}': {source}")]
    OpenFailed { path: PathBuf, source: io::Error },
}

impl Error {
    pub fn is_path_escape(&self) -> bool {
        matches!(self, Self::PathEscape { .. })
    }

    /// True when the container itself could not be parsed or decompressed.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            Self::Format { .. } | Self::Decompress { .. } | Self::UnsupportedFormat(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
