use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

/// Join `relative` onto `base`, refusing anything that could leave `base`.
///
/// `.` components and repeated separators are dropped. Any `..`, root or
/// drive-prefix component is rejected outright rather than clamped, so
/// `a/../b` fails even though it would land inside `base`. An empty path
/// resolves to `base` itself.
pub fn resolve_entry_path(base: impl AsRef<Path>, relative: impl AsRef<Path>) -> Result<PathBuf> {
    let base = base.as_ref();
    let relative = relative.as_ref();

    let escape = || Error::PathEscape {
        entry: relative.to_path_buf(),
        base: base.to_path_buf(),
    };

    let cleaned = clean_relative(relative).ok_or_else(escape)?;
    let resolved = base.join(cleaned);

    if !resolved.starts_with(base) {
        return Err(escape());
    }

    Ok(resolved)
}

fn clean_relative(path: &Path) -> Option<PathBuf> {
    let mut cleaned = PathBuf::new();

    for component in path.components() {
        match component {
            Component::Normal(part) => cleaned.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }

    Some(cleaned)
}
