use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("missing required field '{0}'")]
    MissingField(&'static str),

    #[error("payload is neither an existing path nor valid base64: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("payload path '{0}' is a directory, not a file")]
    DirectoryPayload(PathBuf),

    #[error("path '{path}' escapes '{base}'")]
    PathEscape { path: PathBuf, base: PathBuf },

    #[error("not found: {0}")]
    NotFound(PathBuf),

    #[error("i/o error at '{path}': {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error(transparent)]
    Archive(#[from] datahub_archive::Error),

    #[error("storage root must be an absolute path, got '{0}'")]
    InvalidRoot(PathBuf),
}

/// Coarse classification callers map onto their own status codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    MissingField,
    Decode,
    PathEscape,
    NotFound,
    Io,
    Format,
    Config,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingField(_) => ErrorKind::MissingField,
            Self::Decode(_) | Self::DirectoryPayload(_) => ErrorKind::Decode,
            Self::PathEscape { .. } => ErrorKind::PathEscape,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Io { .. } => ErrorKind::Io,
            Self::Archive(err) if err.is_path_escape() => ErrorKind::PathEscape,
            Self::Archive(err) if err.is_malformed() => ErrorKind::Format,
            Self::Archive(_) => ErrorKind::Io,
            Self::InvalidRoot(_) => ErrorKind::Config,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { path, source }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
