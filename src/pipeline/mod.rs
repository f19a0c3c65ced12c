//! Build pipeline.
//!
//! Turns a source folder of HTML documents and their assets into a
//! deployable output folder.
//!
//! # Phases
//!
//! ```text
//! Init ─► CopyTree ─► DiscoverDocuments ─► TransformAll ─► FlushBundles ─► Cleanup ─► Done
//!   │         │               │                  │               │            │
//!   └─────────┴───────────────┴──── Failed ◄─────┴───────────────┴────────────┘
//! ```
//!
//! Phases run strictly in order and the first error aborts the run. Nothing
//! already written to the target is rolled back.
//!
//! Bundles and scheduled deletions live in one [`BuildContext`] that every
//! document pass borrows mutably, so documents are processed one at a time
//! in discovery order and bundle contents are deterministic.

mod cleanup;
mod document;
mod error;
mod include;
pub mod pattern;
mod tree;

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::asset::{AssetKind, BundleStore};
use crate::logger::ProgressLine;
use crate::utils::path::normalize_path;
use crate::debug;

pub use cleanup::{DeletionSet, SweepStats, sweep};
pub use document::{DocumentStats, transform_document};
pub use error::{BuildError, IoContext};
pub use tree::{copy_tree, discover_documents, prepare_target};

/// Default bundle filenames.
pub const DEFAULT_CSS_BUNDLE: &str = "bundle.min.css";
pub const DEFAULT_JS_BUNDLE: &str = "bundle.min.js";

// ============================================================================
// Options & Request
// ============================================================================

/// What a run does to each document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    pub minify_html: bool,
    pub minify_js: bool,
    pub minify_css: bool,
    pub concat_js: bool,
    pub concat_css: bool,
    pub parse_includes: bool,
    /// Replace an existing target without asking.
    pub overwrite: bool,
    pub css_bundle_filename: String,
    pub js_bundle_filename: String,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            minify_html: true,
            minify_js: true,
            minify_css: true,
            concat_js: false,
            concat_css: false,
            parse_includes: true,
            overwrite: false,
            css_bundle_filename: DEFAULT_CSS_BUNDLE.to_string(),
            js_bundle_filename: DEFAULT_JS_BUNDLE.to_string(),
        }
    }
}

impl BuildOptions {
    pub const fn minify(&self, kind: AssetKind) -> bool {
        match kind {
            AssetKind::Css => self.minify_css,
            AssetKind::Js => self.minify_js,
        }
    }

    pub const fn concat(&self, kind: AssetKind) -> bool {
        match kind {
            AssetKind::Css => self.concat_css,
            AssetKind::Js => self.concat_js,
        }
    }

    pub fn bundle_filename(&self, kind: AssetKind) -> &str {
        match kind {
            AssetKind::Css => &self.css_bundle_filename,
            AssetKind::Js => &self.js_bundle_filename,
        }
    }
}

/// One build: where from, where to, and how.
#[derive(Debug, Clone)]
pub struct BuildRequest {
    pub origin: PathBuf,
    pub target: PathBuf,
    pub options: BuildOptions,
}

impl BuildRequest {
    /// Validate and normalize both folders.
    ///
    /// `origin` must be an existing directory. `target` may not exist yet,
    /// but it cannot be `origin`, lie inside it, or contain it.
    pub fn new(origin: &Path, target: &Path, options: BuildOptions) -> Result<Self, BuildError> {
        if !origin.is_dir() {
            return Err(BuildError::FolderNotFound(origin.to_path_buf()));
        }
        let origin = normalize_path(origin);
        let target = normalize_target(target);

        if target.starts_with(&origin) || origin.starts_with(&target) {
            return Err(BuildError::InvalidTarget { origin, target });
        }

        Ok(Self {
            origin,
            target,
            options,
        })
    }
}

/// Normalize a folder that may not exist yet through its parent, so that
/// symlinked temp roots compare equal to the canonical origin.
fn normalize_target(target: &Path) -> PathBuf {
    if target.exists() {
        return normalize_path(target);
    }
    match (target.parent(), target.file_name()) {
        (Some(parent), Some(name)) if !parent.as_os_str().is_empty() => {
            normalize_target(parent).join(name)
        }
        _ => normalize_path(target),
    }
}

// ============================================================================
// Context & State
// ============================================================================

/// Mutable state shared by every document pass of one run.
pub struct BuildContext<'a> {
    pub origin: &'a Path,
    pub target: &'a Path,
    pub options: &'a BuildOptions,
    pub bundles: BundleStore,
    pub deletions: DeletionSet,
}

impl<'a> BuildContext<'a> {
    pub fn new(request: &'a BuildRequest) -> Self {
        Self {
            origin: &request.origin,
            target: &request.target,
            options: &request.options,
            bundles: BundleStore::new(),
            deletions: DeletionSet::new(),
        }
    }
}

/// Pipeline phase, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildPhase {
    Init,
    CopyTree,
    DiscoverDocuments,
    TransformAll,
    FlushBundles,
    Cleanup,
    Done,
}

impl fmt::Display for BuildPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Init => "init",
            Self::CopyTree => "copy",
            Self::DiscoverDocuments => "discover",
            Self::TransformAll => "transform",
            Self::FlushBundles => "bundle",
            Self::Cleanup => "cleanup",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// Summary of a finished run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BuildReport {
    pub copied: usize,
    pub documents: usize,
    pub includes: usize,
    pub assets: usize,
    pub bundles: usize,
    pub deleted: usize,
    pub removed_dirs: usize,
    pub elapsed: Duration,
}

/// How the process ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitState {
    Success,
    Failed(String),
    UserDeclinedOverwrite,
}

impl ExitState {
    pub const fn code(&self) -> i32 {
        match self {
            Self::Success => 0,
            Self::Failed(_) | Self::UserDeclinedOverwrite => 1,
        }
    }
}

impl From<&BuildError> for ExitState {
    fn from(err: &BuildError) -> Self {
        match err {
            BuildError::OverwriteDeclined(_) => Self::UserDeclinedOverwrite,
            other => Self::Failed(other.to_string()),
        }
    }
}

// ============================================================================
// Orchestration
// ============================================================================

/// Run every phase for `request`.
///
/// `confirm` is asked before an existing target is replaced, unless the
/// request already allows overwriting. `progress` shows a document counter.
pub fn run_build<F>(request: &BuildRequest, confirm: F, progress: bool) -> Result<BuildReport, BuildError>
where
    F: FnOnce(&Path) -> io::Result<bool>,
{
    let mut phase = BuildPhase::Init;
    let result = execute(request, confirm, progress, &mut phase);
    if let Err(e) = &result {
        debug!("build"; "failed during {}: {}", phase, e);
    }
    result
}

fn execute<F>(
    request: &BuildRequest,
    confirm: F,
    progress: bool,
    phase: &mut BuildPhase,
) -> Result<BuildReport, BuildError>
where
    F: FnOnce(&Path) -> io::Result<bool>,
{
    let start = Instant::now();
    let mut report = BuildReport::default();

    *phase = BuildPhase::CopyTree;
    prepare_target(&request.target, request.options.overwrite, confirm)?;
    report.copied = copy_tree(&request.origin, &request.target)?;

    *phase = BuildPhase::DiscoverDocuments;
    let documents = discover_documents(&request.target);
    debug!("build"; "{} documents under {}", documents.len(), request.target.display());

    *phase = BuildPhase::TransformAll;
    let mut ctx = BuildContext::new(request);
    let bar = progress.then(|| ProgressLine::new(&[("documents", documents.len())]));
    for path in &documents {
        let stats = transform_document(path, &mut ctx)?;
        report.includes += stats.includes;
        report.assets += stats.stylesheets + stats.scripts;
        report.documents += 1;
        if let Some(bar) = &bar {
            bar.inc("documents");
        }
    }
    if let Some(bar) = bar {
        bar.finish();
    }

    *phase = BuildPhase::FlushBundles;
    report.bundles = ctx.bundles.flush(ctx.options)?.len();

    *phase = BuildPhase::Cleanup;
    let SweepStats {
        deleted,
        removed_dirs,
    } = sweep(ctx.deletions, &request.target)?;
    report.deleted = deleted;
    report.removed_dirs = removed_dirs;

    *phase = BuildPhase::Done;
    report.elapsed = start.elapsed();
    Ok(report)
}
