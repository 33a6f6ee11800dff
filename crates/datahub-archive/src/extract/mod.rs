//! Extraction strategies, one per [`Format`].
//!
//! Every strategy walks its container in index order and hands each entry to
//! [`EntryWriter`], which owns the shared per-entry contract: resolve the
//! target with [`resolve_entry_path`], abort on the first escape or I/O error,
//! create directories, stream regular files, skip everything else. Archive
//! strategies also vet every entry name up front, so an escaping entry leaves
//! the target untouched. I/O failures midway are not rolled back.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use crate::entry::{EntryKind, ExtractReport};
use crate::error::{Error, Result};
use crate::format::Format;
use crate::sanitize::resolve_entry_path;

#[cfg(feature = "tar")]
mod tar;
#[cfg(feature = "zip")]
mod zip;

#[cfg(feature = "tar")]
pub use tar::{TarExtractor, TarGzExtractor};
#[cfg(feature = "zip")]
pub use zip::ZipExtractor;

/// Materializes a staged input under a target directory.
pub trait Extractor {
    fn format(&self) -> Format;

    fn extract(&self, input: &Path, target_dir: &Path) -> Result<ExtractReport>;
}

impl Format {
    /// Strategy for this format.
    pub fn extractor(self) -> Result<Box<dyn Extractor>> {
        match self {
            #[cfg(feature = "zip")]
            Self::Zip => Ok(Box::new(ZipExtractor)),
            #[cfg(feature = "tar")]
            Self::Tar => Ok(Box::new(TarExtractor)),
            #[cfg(feature = "tar")]
            Self::TarGz => Ok(Box::new(TarGzExtractor)),
            Self::Opaque => Ok(Box::new(OpaqueCopy)),
            #[allow(unreachable_patterns)]
            other => Err(Error::UnsupportedFormat(other)),
        }
    }
}

/// Classify `input` by name and run the matching strategy.
pub fn extract(input: &Path, target_dir: &Path) -> Result<ExtractReport> {
    let format = Format::classify(input);
    tracing::debug!(input = %input.display(), %format, "classified staged input");
    format.extractor()?.extract(input, target_dir)
}

/// Copies a non-archive input verbatim to `target_dir/<file name>`.
#[derive(Clone, Copy, Debug, Default)]
pub struct OpaqueCopy;

impl Extractor for OpaqueCopy {
    fn format(&self) -> Format {
        Format::Opaque
    }

    fn extract(&self, input: &Path, target_dir: &Path) -> Result<ExtractReport> {
        let file_name = input.file_name().ok_or_else(|| Error::PathEscape {
            entry: input.to_path_buf(),
            base: target_dir.to_path_buf(),
        })?;

        // Re-uploading a file from its own dataset: opening the target for
        // write would truncate the source.
        let target = resolve_entry_path(target_dir, file_name)?;
        if is_same_file(input, &target) {
            tracing::debug!(input = %input.display(), "input already in place, not copying");
            let size = fs::metadata(input)
                .map_err(|e| Error::OpenFailed {
                    path: input.to_path_buf(),
                    source: e,
                })?
                .len();
            let mut report = ExtractReport::new(Format::Opaque);
            report.record(PathBuf::from(file_name), EntryKind::File, size);
            return Ok(report);
        }

        let mut source = open_input(input)?;
        let mut writer = EntryWriter::new(target_dir, Format::Opaque)?;
        writer.write(Path::new(file_name), EntryKind::File, &mut source)?;
        Ok(writer.finish())
    }
}

fn is_same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

pub(crate) fn open_input(input: &Path) -> Result<fs::File> {
    fs::File::open(input).map_err(|e| Error::OpenFailed {
        path: input.to_path_buf(),
        source: e,
    })
}

/// Applies the per-entry contract and records what was written.
pub(crate) struct EntryWriter<'a> {
    target_dir: &'a Path,
    report: ExtractReport,
}

impl<'a> EntryWriter<'a> {
    pub(crate) fn new(target_dir: &'a Path, format: Format) -> Result<Self> {
        ensure_directory(target_dir)?;
        Ok(Self {
            target_dir,
            report: ExtractReport::new(format),
        })
    }

    pub(crate) fn write(
        &mut self,
        entry_path: &Path,
        kind: EntryKind,
        reader: &mut dyn Read,
    ) -> Result<()> {
        // Escapes abort the whole extraction, whatever the entry kind.
        let resolved = resolve_entry_path(self.target_dir, entry_path)?;
        let relative = resolved
            .strip_prefix(self.target_dir)
            .map(Path::to_path_buf)
            .unwrap_or_default();

        match kind {
            EntryKind::Directory => {
                ensure_directory(&resolved)?;
                self.report.record(relative, kind, 0);
            }
            EntryKind::File => {
                let size = write_file(reader, &resolved)?;
                self.report.record(relative, kind, size);
            }
            EntryKind::Other => {
                tracing::debug!(entry = %entry_path.display(), "skipping non-regular entry");
                self.report.skipped += 1;
            }
        }

        Ok(())
    }

    pub(crate) fn finish(self) -> ExtractReport {
        self.report
    }
}

fn write_file(reader: &mut dyn Read, target_path: &Path) -> Result<u64> {
    if let Some(parent) = target_path.parent() {
        ensure_directory(parent)?;
    }

    let extraction_failed = |e: io::Error| Error::ExtractionFailed {
        path: target_path.to_path_buf(),
        source: e,
    };

    let mut file = fs::File::create(target_path).map_err(extraction_failed)?;
    io::copy(reader, &mut file).map_err(extraction_failed)
}

fn ensure_directory(path: &Path) -> Result<()> {
    if path.is_dir() {
        return Ok(());
    }

    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o755);
    }

    builder
        .create(path)
        .map_err(|e| Error::DirectoryCreationFailed {
            path: PathBuf::from(path),
            source: e,
        })
}
