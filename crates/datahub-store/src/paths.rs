use std::fs;
use std::path::{Component, Path, PathBuf};

use datahub_archive::resolve_entry_path;

use crate::error::{Error, Result};

/// `root/<key>`, where `key` must be a single normal path component.
pub(crate) fn key_dir(root: &Path, key: &str) -> Result<PathBuf> {
    if key.is_empty() {
        return Err(Error::MissingField("key"));
    }

    let mut components = Path::new(key).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(part)), None) if part == key => Ok(root.join(part)),
        _ => Err(Error::PathEscape {
            path: PathBuf::from(key),
            base: root.to_path_buf(),
        }),
    }
}

/// Client-supplied path under a dataset directory.
pub(crate) fn entry_path(base: &Path, relative: &str) -> Result<PathBuf> {
    resolve_entry_path(base, relative).map_err(|_| Error::PathEscape {
        path: PathBuf::from(relative),
        base: base.to_path_buf(),
    })
}

pub(crate) fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(Error::io(path))
}

/// Regular files under `dir`, as sorted `/`-separated paths relative to it.
pub(crate) fn walk_files(dir: &Path) -> Result<Vec<String>> {
    fn visit(root: &Path, dir: &Path, out: &mut Vec<String>) -> Result<()> {
        for entry in fs::read_dir(dir).map_err(Error::io(dir))? {
            let entry = entry.map_err(Error::io(dir))?;
            let path = entry.path();
            let file_type = entry.file_type().map_err(Error::io(&path))?;

            if file_type.is_dir() {
                visit(root, &path, out)?;
            } else if file_type.is_file() {
                if let Ok(relative) = path.strip_prefix(root) {
                    let parts: Vec<_> = relative
                        .components()
                        .map(|c| c.as_os_str().to_string_lossy())
                        .collect();
                    out.push(parts.join("/"));
                }
            }
        }
        Ok(())
    }

    let mut files = Vec::new();
    visit(dir, dir, &mut files)?;
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn key_must_be_one_component() {
        let root = Path::new("/srv/datahub");
        assert_eq!(key_dir(root, "abc123").unwrap(), root.join("abc123"));

        for key in ["..", ".", "a/b", "/etc", "../abc", "abc/"] {
            assert!(
                matches!(key_dir(root, key), Err(Error::PathEscape { .. })),
                "{key} should be rejected"
            );
        }
        assert!(matches!(key_dir(root, ""), Err(Error::MissingField("key"))));
    }

    #[test]
    fn entry_paths_stay_inside() {
        let base = Path::new("/srv/datahub/abc");
        assert_eq!(entry_path(base, "dir/b.txt").unwrap(), base.join("dir/b.txt"));
        assert!(matches!(
            entry_path(base, "../other/secret"),
            Err(Error::PathEscape { .. })
        ));
        assert!(matches!(
            entry_path(base, "/etc/passwd"),
            Err(Error::PathEscape { .. })
        ));
    }

    #[test]
    fn walk_lists_nested_files_sorted() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("dir/deeper")).unwrap();
        fs::create_dir_all(dir.path().join("empty")).unwrap();
        fs::write(dir.path().join("b.txt"), "b").unwrap();
        fs::write(dir.path().join("dir/a.txt"), "a").unwrap();
        fs::write(dir.path().join("dir/deeper/c.txt"), "c").unwrap();

        assert_eq!(
            walk_files(dir.path()).unwrap(),
            vec!["b.txt", "dir/a.txt", "dir/deeper/c.txt"]
        );
    }
}
