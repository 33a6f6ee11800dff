use std::fs;
use std::io::{Cursor, Read, Write};
use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use datahub_store::{
    Error, ErrorKind, KeyDigest, StorageKey, StoreConfig, StoreManager, UploadPayload,
};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;

struct Fixture {
    scratch: TempDir,
    store: StoreManager,
}

impl Fixture {
    fn new() -> Self {
        Self::with_digest(KeyDigest::Md5)
    }

    fn with_digest(digest: KeyDigest) -> Self {
        let scratch = tempfile::Builder::new()
            .prefix("datahub-store-")
            .tempdir()
            .unwrap();
        let config = StoreConfig::new(scratch.path().join("root"))
            .key_digest(digest)
            .staging_dir(scratch.path().join("staging"));
        let store = StoreManager::new(config).unwrap();
        Self { scratch, store }
    }

    fn source(&self, name: &str, bytes: &[u8]) -> String {
        let dir = self.scratch.path().join("sources");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        fs::write(&path, bytes).unwrap();
        path.to_string_lossy().into_owned()
    }

    fn staging_is_empty(&self) -> bool {
        fs::read_dir(self.scratch.path().join("staging"))
            .unwrap()
            .next()
            .is_none()
    }

    fn read(&self, key: &StorageKey, relative: &str) -> Vec<u8> {
        let mut out = Vec::new();
        self.store
            .read_file(key.as_str(), relative)
            .unwrap()
            .read_to_end(&mut out)
            .unwrap();
        out
    }
}

fn sample_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data) in entries {
        writer.start_file(*name, SimpleFileOptions::default()).unwrap();
        writer.write_all(data).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

fn files_on_disk(dir: &Path) -> usize {
    let mut count = 0;
    for entry in fs::read_dir(dir).unwrap() {
        let path = entry.unwrap().path();
        if path.is_dir() {
            count += files_on_disk(&path);
        } else {
            count += 1;
        }
    }
    count
}

#[test]
fn distinct_dids_get_distinct_directories() {
    let fx = Fixture::new();
    let a = fx.store.resolve_dataset_dir("/beamline=3a/btr=one").unwrap();
    let b = fx.store.resolve_dataset_dir("/beamline=3a/btr=two").unwrap();
    let a_again = fx.store.resolve_dataset_dir("/beamline=3a/btr=one").unwrap();

    assert_ne!(a, b);
    assert_eq!(a, a_again);
    assert_eq!(fx.store.list().unwrap().len(), 2);
}

#[test]
fn zip_upload_round_trips_through_read_file() {
    let fx = Fixture::new();
    let archive = fx.source("data.zip", &sample_zip(&[("a.txt", b"x"), ("dir/b.txt", b"y")]));

    let report = fx.store.upload(&UploadPayload::new("did:zip", archive)).unwrap();

    assert_eq!(report.format, "zip");
    assert_eq!(report.key, fx.store.key_for("did:zip"));
    assert_eq!(fx.read(&report.key, "a.txt"), b"x");
    assert_eq!(fx.read(&report.key, "dir/b.txt"), b"y");
    assert_eq!(
        fx.store.list_files(report.key.as_str()).unwrap(),
        vec!["a.txt", "dir/b.txt"]
    );
}

#[test]
fn inline_archive_is_extracted_when_named() {
    let fx = Fixture::new();
    let encoded = STANDARD.encode(sample_zip(&[("inner.txt", b"inline")]));

    let payload = UploadPayload::new("did:inline", encoded).name("bundle.zip");
    let report = fx.store.upload(&payload).unwrap();

    assert_eq!(report.format, "zip");
    assert_eq!(fx.read(&report.key, "inner.txt"), b"inline");
    assert!(fx.staging_is_empty());
}

#[test]
fn opaque_file_is_copied_verbatim() {
    let fx = Fixture::new();
    let source = fx.source("notes.txt", b"hello");

    let report = fx.store.upload(&UploadPayload::new("did:notes", &source)).unwrap();

    assert_eq!(report.format, "opaque");
    assert_eq!(report.entries, vec!["notes.txt"]);
    assert_eq!(fx.read(&report.key, "notes.txt"), b"hello");
    assert!(Path::new(&source).exists());
}

#[test]
fn reuploading_a_stored_file_keeps_its_content() {
    let fx = Fixture::new();
    let source = fx.source("notes.txt", b"hello");
    let key = fx.store.upload(&UploadPayload::new("did:self", source)).unwrap().key;
    let stored = fx.store.root().join(key.as_str()).join("notes.txt");

    let report = fx
        .store
        .upload(&UploadPayload::new("did:self", stored.to_string_lossy()))
        .unwrap();

    assert_eq!(report.entries, vec!["notes.txt"]);
    assert_eq!(report.total_bytes, 5);
    assert_eq!(fx.read(&key, "notes.txt"), b"hello");
}

#[test]
fn directory_payload_mutates_nothing() {
    let fx = Fixture::new();
    let source = fx.scratch.path().join("srcdir");
    fs::create_dir_all(source.join("inner")).unwrap();
    fs::write(source.join("inner/file.txt"), b"x").unwrap();

    let err = fx
        .store
        .upload(&UploadPayload::new("did:dir", source.to_string_lossy()))
        .unwrap_err();

    assert!(matches!(err, Error::DirectoryPayload(_)));
    assert_eq!(err.kind(), ErrorKind::Decode);
    assert!(fx.store.list().unwrap().is_empty());
    assert!(fx.staging_is_empty());
    assert!(source.join("inner/file.txt").is_file());
}

#[test]
fn reupload_keeps_earlier_files() {
    let fx = Fixture::new();
    let first = fx.source("first.txt", b"1");
    let second = fx.source("second.txt", b"2");

    fx.store.upload(&UploadPayload::new("did:same", first)).unwrap();
    let report = fx.store.upload(&UploadPayload::new("did:same", second)).unwrap();

    assert_eq!(
        fx.store.list_files(report.key.as_str()).unwrap(),
        vec!["first.txt", "second.txt"]
    );
    assert_eq!(fx.store.list().unwrap().len(), 1);
}

#[test]
fn escaping_zip_is_rejected_without_writing() {
    let fx = Fixture::new();
    let archive = fx.source(
        "evil.zip",
        &sample_zip(&[("fine.txt", b"ok"), ("../../evil.txt", b"pwned")]),
    );

    let err = fx.store.upload(&UploadPayload::new("did:evil", archive)).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::PathEscape);
    let dataset = fx.store.root().join(fx.store.key_for("did:evil").as_str());
    assert_eq!(files_on_disk(&dataset), 0);
    assert!(!fx.store.root().join("evil.txt").exists());
    assert!(!fx.scratch.path().join("evil.txt").exists());
}

#[test]
fn corrupt_archive_is_a_format_error() {
    let fx = Fixture::new();
    let archive = fx.source("broken.tar.gz", b"plain text pretending to be gzip");

    let err = fx.store.upload(&UploadPayload::new("did:broken", archive)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Format);
}

#[test]
fn undecodable_payload_mutates_nothing() {
    let fx = Fixture::new();

    let err = fx
        .store
        .upload(&UploadPayload::new("did:bad", "%%% not base64 %%%"))
        .unwrap_err();

    assert!(matches!(err, Error::Decode(_)));
    assert_eq!(err.kind(), ErrorKind::Decode);
    assert!(fx.store.list().unwrap().is_empty());
    assert!(fx.staging_is_empty());
}

#[test]
fn delete_unknown_key_is_not_found() {
    let fx = Fixture::new();
    let err = fx.store.delete("0123456789abcdef0123456789abcdef").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn delete_removes_dataset_from_listing() {
    let fx = Fixture::new();
    let source = fx.source("notes.txt", b"hello");
    let key = fx.store.upload(&UploadPayload::new("did:gone", source)).unwrap().key;
    assert_eq!(fx.store.list().unwrap(), vec![key.clone()]);

    fx.store.delete(key.as_str()).unwrap();

    assert!(fx.store.list().unwrap().is_empty());
    assert_eq!(
        fx.store.delete(key.as_str()).unwrap_err().kind(),
        ErrorKind::NotFound
    );
}

#[test]
fn list_ignores_stray_files_in_root() {
    let fx = Fixture::new();
    fs::write(fx.store.root().join("README"), "not a dataset").unwrap();
    fx.store.resolve_dataset_dir("did:x").unwrap();

    assert_eq!(fx.store.list().unwrap(), vec![fx.store.key_for("did:x")]);
}

#[test]
fn sha256_digest_uses_longer_keys() {
    let fx = Fixture::with_digest(KeyDigest::Sha256);
    let source = fx.source("notes.txt", b"hello");

    let report = fx.store.upload(&UploadPayload::new("did:sha", source)).unwrap();
    assert_eq!(report.key.as_str().len(), 64);
}
