use std::fmt;
use std::path::Path;

/// Container format of a staged input, decided by file name alone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Format {
    Zip,
    Tar,
    TarGz,
    /// Not an archive; stored verbatim.
    Opaque,
}

impl Format {
    /// Classify by suffix, most specific first. The content is never sniffed,
    /// so a misnamed file is handled according to its name.
    pub fn classify(name: impl AsRef<Path>) -> Self {
        let Some(file_name) = name.as_ref().file_name() else {
            return Self::Opaque;
        };
        let file_name = file_name.to_string_lossy();

        if file_name.ends_with(".tar.gz") || file_name.ends_with(".tgz") {
            Self::TarGz
        } else if file_name.ends_with(".tar") {
            Self::Tar
        } else if file_name.ends_with(".zip") {
            Self::Zip
        } else {
            Self::Opaque
        }
    }

    pub fn is_archive(self) -> bool {
        !matches!(self, Self::Opaque)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Zip => "zip",
            Self::Tar => "tar",
            Self::TarGz => "tar.gz",
            Self::Opaque => "opaque",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
