//! Path normalization for import targets.

use std::path::{Component, Path, PathBuf};

/// Make a path absolute and collapse `.` and `..` segments lexically.
///
/// Symlinks are not followed, so two spellings of the same file compare
/// equal only when they normalize to the same text. The filesystem is not
/// touched; missing files normalize like existing ones.
pub(crate) fn normalize(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());

    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // `..` at the root stays at the root
                if normalized.parent().is_some() {
                    normalized.pop();
                }
            }
            Component::Prefix(_) | Component::RootDir | Component::Normal(_) => {
                normalized.push(component);
            }
        }
    }
    normalized
}
