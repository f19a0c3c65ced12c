//! Change batching for the source watcher.
//!
//! Editors save in bursts (write temp, rename, touch), so raw notify events
//! are collected per path and released only once the tree has been quiet
//! for [`DEBOUNCE_MS`] and the previous rebuild is [`REBUILD_COOLDOWN_MS`] old.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use notify::EventKind;
use notify::event::{CreateKind, ModifyKind};
use rustc_hash::FxHashMap;

use crate::debug;
use crate::utils::path::normalize_path;

pub(super) const DEBOUNCE_MS: u64 = 300;
pub(super) const REBUILD_COOLDOWN_MS: u64 = 800;

/// What happened to a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum ChangeKind {
    Created,
    Modified,
    Removed,
}

impl ChangeKind {
    pub(super) fn label(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Modified => "modified",
            Self::Removed => "removed",
        }
    }
}

pub(super) struct Debouncer {
    pub(super) changes: FxHashMap<PathBuf, ChangeKind>,
    pub(super) last_event: Option<Instant>,
    pub(super) last_rebuild: Option<Instant>,
}

impl Debouncer {
    pub(super) fn new() -> Self {
        Self {
            changes: FxHashMap::default(),
            last_event: None,
            last_rebuild: None,
        }
    }

    /// Record a notify event.
    ///
    /// Merge rules per path:
    /// - Removed then Created/Modified: the new event (file restored)
    /// - Modified then Removed: Removed
    /// - Created then Removed: dropped
    /// - anything else: first event wins
    pub(super) fn add_event(&mut self, event: &notify::Event) {
        let kind = match event.kind {
            // new directories carry no content of their own
            EventKind::Create(CreateKind::Folder) => return,
            EventKind::Create(_) => ChangeKind::Created,
            EventKind::Remove(_) => ChangeKind::Removed,
            EventKind::Modify(ModifyKind::Metadata(_)) => return,
            EventKind::Modify(_) => ChangeKind::Modified,
            _ => return,
        };

        for path in &event.paths {
            if is_ignored_file(path) {
                continue;
            }

            let path = normalize_path(path);

            if let Some(&existing) = self.changes.get(&path) {
                match (existing, kind) {
                    (ChangeKind::Removed, ChangeKind::Created | ChangeKind::Modified) => {
                        self.changes.insert(path, kind);
                    }
                    (ChangeKind::Modified, ChangeKind::Removed) => {
                        self.changes.insert(path, ChangeKind::Removed);
                    }
                    (ChangeKind::Created, ChangeKind::Removed) => {
                        debug!("watch"; "discard created+removed: {}", path.display());
                        self.changes.remove(&path);
                    }
                    _ => continue,
                }
                self.last_event = Some(Instant::now());
                continue;
            }

            debug!("watch"; "event {}: {}", kind.label(), path.display());
            self.changes.insert(path, kind);
            self.last_event = Some(Instant::now());
        }
    }

    /// Take the pending batch if debounce and cooldown have both elapsed.
    ///
    /// The batch is sorted by path.
    pub(super) fn take_if_ready(&mut self) -> Option<Vec<(PathBuf, ChangeKind)>> {
        if !self.is_ready() {
            return None;
        }

        let changes = std::mem::take(&mut self.changes);
        self.last_event = None;
        self.last_rebuild = Some(Instant::now());

        let mut batch: Vec<_> = changes.into_iter().collect();
        batch.sort_by(|a, b| a.0.cmp(&b.0));
        Some(batch)
    }

    pub(super) fn is_ready(&self) -> bool {
        let Some(last_event) = self.last_event else {
            return false;
        };

        if last_event.elapsed() < Duration::from_millis(DEBOUNCE_MS) {
            return false;
        }

        if let Some(last_rebuild) = self.last_rebuild
            && last_rebuild.elapsed() < Duration::from_millis(REBUILD_COOLDOWN_MS)
        {
            return false;
        }

        !self.changes.is_empty()
    }

    /// Time until the batch could next become ready.
    pub(super) fn sleep_duration(&self) -> Duration {
        let Some(last_event) = self.last_event else {
            return Duration::from_secs(86400);
        };

        let debounce_remaining =
            Duration::from_millis(DEBOUNCE_MS).saturating_sub(last_event.elapsed());

        let cooldown_remaining = self
            .last_rebuild
            .map(|t| Duration::from_millis(REBUILD_COOLDOWN_MS).saturating_sub(t.elapsed()))
            .unwrap_or(Duration::ZERO);

        debounce_remaining
            .max(cooldown_remaining)
            .max(Duration::from_millis(1))
    }
}

/// Editor artifacts and OS bookkeeping files.
fn is_ignored_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
        || name.starts_with('.')
        || name.eq_ignore_ascii_case("thumbs.db")
        || name.eq_ignore_ascii_case("desktop.ini")
}
