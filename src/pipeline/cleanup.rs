//! Deferred deletion of processed source files.
//!
//! Files are only scheduled while documents are transformed. The sweep runs
//! once every document and bundle has been written, so a later document can
//! still read an asset an earlier one already replaced.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use jwalk::WalkDir;
use rayon::prelude::*;
use rustc_hash::FxHashSet;

use super::{BuildError, IoContext};
use crate::debug;
use crate::utils::path::clean_path;

/// OS noise that does not keep a directory alive (compared lowercase).
const IGNORED_FILES: &[&str] = &[".ds_store", "thumbs.db", "desktop.ini"];

/// Paths scheduled for removal, in scheduling order, without duplicates.
#[derive(Debug, Default)]
pub struct DeletionSet {
    paths: Vec<PathBuf>,
    seen: FxHashSet<PathBuf>,
}

impl DeletionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `path`. Returns false if it was already scheduled.
    pub fn schedule(&mut self, path: PathBuf) -> bool {
        if !self.seen.insert(path.clone()) {
            return false;
        }
        self.paths.push(path);
        true
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.seen.contains(path)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PathBuf> {
        self.paths.iter()
    }
}

/// Outcome of a sweep.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepStats {
    pub deleted: usize,
    pub removed_dirs: usize,
}

/// Delete every scheduled file, then drop parent directories left without
/// real files. `root` itself is never removed.
///
/// Runs in parallel. Anything already gone (removed by a sibling task or by
/// hand) is skipped silently.
pub fn sweep(set: DeletionSet, root: &Path) -> Result<SweepStats, BuildError> {
    let deleted = AtomicUsize::new(0);
    let removed_dirs = AtomicUsize::new(0);

    set.paths.par_iter().try_for_each(|path| {
        // `starts_with` is lexical, so `..` has to be folded first
        let path = &clean_path(path);
        if !path.starts_with(root) || path == root {
            debug!("clean"; "skipped {} outside {}", path.display(), root.display());
            return Ok(());
        }

        match fs::remove_file(path) {
            Ok(()) => {
                debug!("clean"; "deleted {}", path.display());
                deleted.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(BuildError::io("delete", path, e)),
        }

        let Some(dir) = path.parent() else {
            return Ok(());
        };
        if dir == root || !dir.starts_with(root) || has_remaining_files(dir) {
            return Ok(());
        }

        if remove_dir_tolerant(dir).io_context("remove directory", dir)? {
            debug!("clean"; "removed empty directory {}", dir.display());
            removed_dirs.fetch_add(1, Ordering::Relaxed);
        }
        Ok(())
    })?;

    Ok(SweepStats {
        deleted: deleted.into_inner(),
        removed_dirs: removed_dirs.into_inner(),
    })
}

/// Whether `dir` (recursively) still holds a file that is not OS noise.
fn has_remaining_files(dir: &Path) -> bool {
    WalkDir::new(dir)
        .skip_hidden(false)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| !e.file_type().is_dir())
        .any(|e| !is_ignored(&e.file_name().to_string_lossy()))
}

fn is_ignored(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    IGNORED_FILES.contains(&lower.as_str())
}

/// Remove OS noise files from `dir`, then `dir` itself if that left it empty.
///
/// Returns `Ok(false)` if it was already gone or still holds entries, such as
/// empty subdirectories copied from the source.
fn remove_dir_tolerant(dir: &Path) -> std::io::Result<bool> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e),
    };

    for entry in entries.filter_map(Result::ok) {
        let is_file = entry.file_type().is_ok_and(|t| t.is_file());
        if is_file && is_ignored(&entry.file_name().to_string_lossy()) {
            match fs::remove_file(entry.path()) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e),
            }
        }
    }

    match fs::remove_dir(dir) {
        Ok(()) => Ok(true),
        Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::DirectoryNotEmpty) => {
            Ok(false)
        }
        Err(e) => Err(e),
    }
}
