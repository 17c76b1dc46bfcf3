//! Enumerating a working tree on disk.

use std::fs;
use std::path::Path;

use pit_store::PIT_DIR;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::entry::WorktreeEntry;
use crate::error::{WorktreeError, WorktreeResult};

/// Top-level directories never recorded in a snapshot.
pub const SKIPPED_DIRS: &[&str] = &[PIT_DIR, "node_modules"];

/// Enumerate every file and directory under `root`, in path order.
///
/// The top-level directories in [`SKIPPED_DIRS`] (the repository's own
/// `.pit` and `node_modules`) are skipped.
/// Symbolic links are not followed and not recorded. Paths are returned
/// relative to `root` with `/` separators; a name that is not valid UTF-8
/// is an error.
pub fn scan(root: &Path) -> WorktreeResult<Vec<WorktreeEntry>> {
    let walker = WalkDir::new(root)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            !(e.depth() == 1 && SKIPPED_DIRS.iter().any(|dir| e.file_name() == *dir))
        });

    let mut entries = Vec::new();
    for entry in walker {
        let entry = entry?;
        let path = relative_path(root, entry.path())?;
        let file_type = entry.file_type();

        if file_type.is_symlink() {
            warn!(path = %path, "skipping symbolic link");
            continue;
        }
        if file_type.is_dir() {
            entries.push(WorktreeEntry::directory(path));
        } else if file_type.is_file() {
            let content = fs::read(entry.path()).map_err(|source| WorktreeError::Io {
                path: entry.path().to_path_buf(),
                source,
            })?;
            entries.push(WorktreeEntry::file(path, content));
        } else {
            warn!(path = %path, "skipping special file");
        }
    }

    debug!(root = %root.display(), count = entries.len(), "scanned working tree");
    Ok(entries)
}

fn relative_path(root: &Path, path: &Path) -> WorktreeResult<String> {
    let display = path.display().to_string();
    let relative = path
        .strip_prefix(root)
        .map_err(|_| WorktreeError::invalid_path(&display, "outside the working tree"))?;

    let mut parts = Vec::new();
    for component in relative.components() {
        let part = component
            .as_os_str()
            .to_str()
            .ok_or_else(|| WorktreeError::invalid_path(&display, "name is not valid UTF-8"))?;
        parts.push(part);
    }
    Ok(parts.join("/"))
}
