use std::path::{Path, PathBuf};

use super::{EntryWriter, Extractor, open_input};
use crate::entry::{EntryKind, ExtractReport};
use crate::error::{Error, Result};
use crate::format::Format;
use crate::sanitize::resolve_entry_path;

const S_IFMT: u32 = 0o170000;
const S_IFLNK: u32 = 0o120000;

/// Zip archives, walked in central-directory order.
#[derive(Clone, Copy, Debug, Default)]
pub struct ZipExtractor;

impl Extractor for ZipExtractor {
    fn format(&self) -> Format {
        Format::Zip
    }

    fn extract(&self, input: &Path, target_dir: &Path) -> Result<ExtractReport> {
        let malformed = |e: zip::result::ZipError| Error::Format {
            format: Format::Zip,
            path: input.to_path_buf(),
            reason: e.to_string(),
        };

        let mut archive = zip::ZipArchive::new(open_input(input)?).map_err(malformed)?;

        // Preflight over the central directory: an escaping name anywhere in
        // the archive stops extraction before the first byte is written.
        for name in archive.file_names() {
            resolve_entry_path(target_dir, name)?;
        }

        let mut writer = EntryWriter::new(target_dir, Format::Zip)?;

        for index in 0..archive.len() {
            let mut file = archive.by_index(index).map_err(malformed)?;

            // The raw name, not `enclosed_name`: escaping names must fail
            // the extraction rather than be silently dropped.
            let path = PathBuf::from(file.name());
            let kind = if file.is_dir() {
                EntryKind::Directory
            } else if is_symlink(file.unix_mode()) {
                EntryKind::Other
            } else {
                EntryKind::File
            };

            writer.write(&path, kind, &mut file)?;
        }

        Ok(writer.finish())
    }
}

fn is_symlink(mode: Option<u32>) -> bool {
    mode.is_some_and(|m| m & S_IFMT == S_IFLNK)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn symlink_mode_detection() {
        assert!(is_symlink(Some(0o120777)));
        assert!(!is_symlink(Some(0o100644)));
        assert!(!is_symlink(Some(0o040755)));
        assert!(!is_symlink(None));
    }

    #[test]
    fn garbage_is_a_format_error() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("fake.zip");
        std::fs::write(&input, b"PK but not really a zip archive").unwrap();

        let result = ZipExtractor.extract(&input, &dir.path().join("out"));
        assert!(matches!(
            result,
            Err(Error::Format {
                format: Format::Zip,
                ..
            })
        ));
    }
}
