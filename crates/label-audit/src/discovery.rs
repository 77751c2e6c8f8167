//! Locating label directories and enumerating per-frame label files.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use label_audit_types::{AuditError, AuditResult};
use tracing::{debug, warn};

pub const LABEL_EXTENSION: &str = "txt";

/// Returns the directory label files are read from.
///
/// Exported datasets often wrap the labels in a few levels of folders, so
/// by default the deepest leaf directory under `path` is used.
pub fn resolve_label_dir(path: &Path, descend: bool) -> AuditResult<PathBuf> {
    if !path.is_dir() {
        return Err(AuditError::configuration(format!(
            "label directory {} does not exist",
            path.display()
        )));
    }
    if !descend {
        return Ok(path.to_path_buf());
    }
    let (leaf, _) = deepest_leaf(path, 0)?;
    if leaf != path {
        debug!(root = %path.display(), leaf = %leaf.display(), "descended to label directory");
    }
    Ok(leaf)
}

/// Depth-first search for the deepest directory without subdirectories.
/// Ties keep the first candidate in name order.
fn deepest_leaf(path: &Path, depth: usize) -> AuditResult<(PathBuf, usize)> {
    let mut children = match subdirectories(path) {
        Ok(children) => children,
        Err(err) if err.kind() == io::ErrorKind::PermissionDenied => {
            warn!(dir = %path.display(), "skipping unreadable directory");
            Vec::new()
        }
        Err(err) => return Err(AuditError::io(path, err)),
    };
    children.sort();

    let mut best = (path.to_path_buf(), depth);
    for child in children {
        let candidate = deepest_leaf(&child, depth + 1)?;
        if candidate.1 > best.1 {
            best = candidate;
        }
    }
    Ok(best)
}

fn subdirectories(path: &Path) -> io::Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for entry in fs::read_dir(path)? {
        let entry = entry?;
        let entry_path = entry.path();
        if entry_path.is_dir() {
            dirs.push(entry_path);
        }
    }
    Ok(dirs)
}

/// Lists the label file names in `dir`, sorted by name. Files with other
/// extensions are ignored.
pub fn list_label_files(dir: &Path) -> AuditResult<Vec<String>> {
    let entries = fs::read_dir(dir).map_err(|err| AuditError::io(dir, err))?;
    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| AuditError::io(dir, err))?;
        let path = entry.path();
        if !path.is_file() || !has_label_extension(&path) {
            continue;
        }
        match entry.file_name().into_string() {
            Ok(name) => names.push(name),
            Err(raw) => warn!(name = ?raw, "skipping label file with non UTF-8 name"),
        }
    }
    names.sort();
    Ok(names)
}

fn has_label_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext == LABEL_EXTENSION)
}
