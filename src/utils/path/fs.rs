//! Path normalization utilities.
//!
//! Provides consistent path handling across the codebase:
//! - `normalize_path` - file system paths (canonicalize + fallback)
//! - `clean_path` - lexical `.`/`..` removal for paths that may not exist yet
//! - `expand_path` - `~` expansion for user-supplied folders
//! - `resolve_reference` - map a path written in a document to a file

use std::path::{Component, Path, PathBuf};

/// Normalize a file system path to absolute form.
///
/// Tries `canonicalize()` first (resolves symlinks, `.`, `..`).
/// Falls back to:
/// - Return the cleaned path if already absolute
/// - Join with current directory if relative
#[inline]
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        if path.is_absolute() {
            clean_path(path)
        } else {
            std::env::current_dir()
                .map_or_else(|_| path.to_path_buf(), |cwd| clean_path(&cwd.join(path)))
        }
    })
}

/// Remove `.` and `..` components without touching the file system.
///
/// `..` never climbs above the root of an absolute path.
pub fn clean_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() && !path.is_absolute() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Expand a leading `~` in a user-supplied path.
pub fn expand_path(path: &Path) -> PathBuf {
    match path.to_str() {
        Some(s) => PathBuf::from(shellexpand::tilde(s).into_owned()),
        None => path.to_path_buf(),
    }
}

/// Resolve a path as written in a document.
///
/// Relative references resolve against `base_dir` (the document's folder).
/// A leading `/` addresses the site root, so it resolves against `root`.
/// The result is lexically cleaned but not required to exist.
pub fn resolve_reference(raw: &str, base_dir: &Path, root: &Path) -> PathBuf {
    match raw.strip_prefix('/') {
        Some(rooted) => clean_path(&root.join(rooted)),
        None => clean_path(&base_dir.join(raw)),
    }
}
