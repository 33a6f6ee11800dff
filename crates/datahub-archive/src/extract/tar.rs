use std::cell::Cell;
use std::fs;
use std::io::{self, Read};
use std::path::Path;
use std::rc::Rc;

use flate2::read::GzDecoder;

use super::{EntryWriter, Extractor, open_input};
use crate::entry::{EntryKind, ExtractReport};
use crate::error::{Error, Result};
use crate::format::Format;
use crate::sanitize::resolve_entry_path;

/// Uncompressed tar archives.
#[derive(Clone, Copy, Debug, Default)]
pub struct TarExtractor;

impl Extractor for TarExtractor {
    fn format(&self) -> Format {
        Format::Tar
    }

    fn extract(&self, input: &Path, target_dir: &Path) -> Result<ExtractReport> {
        extract_tar(|| open_input(input), input, target_dir, Format::Tar)
    }
}

/// Gzip-compressed tar archives: a decompression stage in front of the tar walk.
#[derive(Clone, Copy, Debug, Default)]
pub struct TarGzExtractor;

impl Extractor for TarGzExtractor {
    fn format(&self) -> Format {
        Format::TarGz
    }

    fn extract(&self, input: &Path, target_dir: &Path) -> Result<ExtractReport> {
        let failure = Rc::new(Cell::new(None));
        let open = || -> Result<Inflate<fs::File>> {
            let decoder = GzDecoder::new(open_input(input)?);
            Ok(Inflate::new(decoder, Rc::clone(&failure)))
        };

        extract_tar(open, input, target_dir, Format::TarGz).map_err(|err| {
            match failure.take() {
                Some(reason) if !err.is_path_escape() => Error::Decompress {
                    path: input.to_path_buf(),
                    reason,
                },
                _ => err,
            }
        })
    }
}

/// Tar streams cannot be indexed, so the archive is read twice: once to vet
/// every entry name, once to write.
fn extract_tar<R: Read>(
    open: impl Fn() -> Result<R>,
    input: &Path,
    target_dir: &Path,
    format: Format,
) -> Result<ExtractReport> {
    preflight(&mut tar::Archive::new(open()?), input, target_dir, format)?;
    walk(&mut tar::Archive::new(open()?), input, target_dir, format)
}

fn malformed(input: &Path, format: Format) -> impl Fn(io::Error) -> Error + '_ {
    move |e| Error::Format {
        format,
        path: input.to_path_buf(),
        reason: e.to_string(),
    }
}

fn preflight<R: Read>(
    archive: &mut tar::Archive<R>,
    input: &Path,
    target_dir: &Path,
    format: Format,
) -> Result<()> {
    let malformed = malformed(input, format);

    for entry in archive.entries().map_err(&malformed)? {
        let entry = entry.map_err(&malformed)?;
        resolve_entry_path(target_dir, entry.path().map_err(&malformed)?)?;
    }

    Ok(())
}

fn walk<R: Read>(
    archive: &mut tar::Archive<R>,
    input: &Path,
    target_dir: &Path,
    format: Format,
) -> Result<ExtractReport> {
    let malformed = malformed(input, format);
    let mut writer = EntryWriter::new(target_dir, format)?;

    for entry in archive.entries().map_err(&malformed)? {
        let mut entry = entry.map_err(&malformed)?;
        let path = entry.path().map_err(&malformed)?.into_owned();

        let entry_type = entry.header().entry_type();
        let kind = if entry_type.is_dir() {
            EntryKind::Directory
        } else if entry_type.is_file() {
            EntryKind::File
        } else {
            EntryKind::Other
        };

        writer.write(&path, kind, &mut entry)?;
    }

    Ok(writer.finish())
}

/// Remembers the first read failure of the gzip stage, so a corrupt stream
/// can be reported apart from tar parsing or write failures.
struct Inflate<R> {
    inner: GzDecoder<R>,
    failure: Rc<Cell<Option<String>>>,
}

impl<R> Inflate<R> {
    fn new(inner: GzDecoder<R>, failure: Rc<Cell<Option<String>>>) -> Self {
        Self { inner, failure }
    }
}

impl<R: Read> Read for Inflate<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf).inspect_err(|e| {
            let first = self.failure.take().unwrap_or_else(|| e.to_string());
            self.failure.set(Some(first));
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn inflate_records_first_failure() {
        let failure = Rc::new(Cell::new(None));
        let decoder = GzDecoder::new(&b"definitely not a gzip stream"[..]);
        let mut inflate = Inflate::new(decoder, Rc::clone(&failure));

        let mut buf = [0u8; 64];
        assert!(inflate.read(&mut buf).is_err());
        assert!(failure.take().is_some());
    }

    #[test]
    fn inflate_passes_valid_streams_through() {
        let mut encoder =
            flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(b"inner bytes").unwrap();
        let compressed = encoder.finish().unwrap();

        let failure = Rc::new(Cell::new(None));
        let mut inflate = Inflate::new(GzDecoder::new(&compressed[..]), Rc::clone(&failure));
        let mut out = Vec::new();
        inflate.read_to_end(&mut out).unwrap();

        assert_eq!(out, b"inner bytes");
        assert!(failure.take().is_none());
    }

    #[test]
    fn corrupt_gzip_is_a_decompress_error() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("broken.tar.gz");
        std::fs::write(&input, b"this was never compressed, just misnamed").unwrap();

        let out = dir.path().join("out");
        let result = TarGzExtractor.extract(&input, &out);
        assert!(matches!(result, Err(Error::Decompress { .. })));
        assert!(!out.exists());
    }
}
