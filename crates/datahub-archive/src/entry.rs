use std::path::PathBuf;

use crate::Format;

/// Kind of an archive entry as far as extraction is concerned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
    /// Symlinks, hard links, devices and the like. Never materialized.
    Other,
}

/// One entry written under the target directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtractedEntry {
    /// Path relative to the target directory.
    pub path: PathBuf,
    pub kind: EntryKind,
    pub size: u64,
}

#[derive(Clone, Debug)]
pub struct ExtractReport {
    pub format: Format,
    pub entries: Vec<ExtractedEntry>,
    pub total_bytes: u64,
    pub skipped: usize,
}

impl ExtractReport {
    pub fn new(format: Format) -> Self {
        Self {
            format,
            entries: Vec::new(),
            total_bytes: 0,
            skipped: 0,
        }
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    pub fn files(&self) -> impl Iterator<Item = &ExtractedEntry> {
        self.entries.iter().filter(|e| e.kind == EntryKind::File)
    }

    pub(crate) fn record(&mut self, path: PathBuf, kind: EntryKind, size: u64) {
        self.total_bytes += size;
        self.entries.push(ExtractedEntry { path, kind, size });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_accumulates_bytes() {
        let mut report = ExtractReport::new(Format::Zip);
        report.record(PathBuf::from("dir"), EntryKind::Directory, 0);
        report.record(PathBuf::from("dir/a.txt"), EntryKind::File, 12);
        report.record(PathBuf::from("b.txt"), EntryKind::File, 30);

        assert_eq!(report.entry_count(), 3);
        assert_eq!(report.total_bytes, 42);
        assert_eq!(report.files().count(), 2);
    }
}
