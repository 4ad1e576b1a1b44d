//! Icon file discovery.

use std::path::{Path, PathBuf};

/// File extension of icon sources (compared case-insensitively).
const ICON_EXTENSION: &str = "svg";

/// A discovered icon source file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IconEntry {
    /// Absolute (or icons-root-joined) path to the file.
    pub path: PathBuf,
    /// Path relative to the icons root.
    pub relative: PathBuf,
    /// Symbol identifier: the file name without extension.
    pub id: String,
}

impl IconEntry {
    fn new(root: &Path, path: PathBuf) -> Option<Self> {
        let relative = path.strip_prefix(root).ok()?.to_path_buf();
        let id = path.file_stem()?.to_string_lossy().into_owned();
        Some(Self { path, relative, id })
    }
}

/// Find every `.svg` file under `root`, recursively, sorted by relative path.
///
/// A missing root yields no icons. Unreadable entries are logged and skipped.
pub fn scan_icons(root: &Path) -> Result<Vec<IconEntry>, glob::PatternError> {
    let pattern = format!(
        "{}/**/*",
        glob::Pattern::escape(&root.to_string_lossy())
    );

    let mut icons: Vec<IconEntry> = glob::glob(&pattern)?
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(err) => {
                tracing::warn!(error = %err, "Skipping unreadable icon path");
                None
            }
        })
        .filter(|path| is_icon(path))
        .filter_map(|path| IconEntry::new(root, path))
        .collect();

    icons.sort_by(|a, b| a.relative.cmp(&b.relative));
    Ok(icons)
}

fn is_icon(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(ICON_EXTENSION))
        && path.is_file()
}
