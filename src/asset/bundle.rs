//! Per-directory asset bundles.
//!
//! When concatenation is on, every minified asset is appended to the bundle
//! owned by the directory its minified file would have landed in. Bundles
//! are only written once the whole document pass is over.

use std::fs;
use std::path::{Path, PathBuf};

use rustc_hash::{FxHashMap, FxHashSet};

use super::AssetKind;
use crate::pipeline::{BuildError, BuildOptions, IoContext};

/// One accumulated bundle.
#[derive(Debug)]
pub struct Bundle {
    pub kind: AssetKind,
    /// Directory that owns the bundle file.
    pub key: PathBuf,
    /// Minified sources, newline-joined.
    pub content: String,
    /// Source files already absorbed.
    sources: FxHashSet<PathBuf>,
}

/// Outcome of adding an asset to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BundleSlot {
    /// First asset for this key: the referencing tag points at the bundle.
    Opened,
    /// Key already had content: the referencing tag is absorbed.
    Appended,
}

/// Insertion-ordered `(kind, directory) -> bundle` map.
#[derive(Debug, Default)]
pub struct BundleStore {
    bundles: Vec<Bundle>,
    index: FxHashMap<(AssetKind, PathBuf), usize>,
}

impl BundleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add minified `content` from `source` to the bundle of `key`.
    ///
    /// A source already absorbed into the same bundle is not appended twice.
    /// Trailing whitespace is dropped so pieces are joined by exactly one newline.
    pub fn add(&mut self, kind: AssetKind, key: PathBuf, source: &Path, mut content: String) -> BundleSlot {
        content.truncate(content.trim_end().len());
        if let Some(&i) = self.index.get(&(kind, key.clone())) {
            let bundle = &mut self.bundles[i];
            if bundle.sources.insert(source.to_path_buf()) {
                bundle.content.push('\n');
                bundle.content.push_str(&content);
            }
            return BundleSlot::Appended;
        }

        let mut sources = FxHashSet::default();
        sources.insert(source.to_path_buf());
        self.index.insert((kind, key.clone()), self.bundles.len());
        self.bundles.push(Bundle {
            kind,
            key,
            content,
            sources,
        });
        BundleSlot::Opened
    }

    pub fn get(&self, kind: AssetKind, key: &Path) -> Option<&Bundle> {
        self.index
            .get(&(kind, key.to_path_buf()))
            .map(|&i| &self.bundles[i])
    }

    pub fn len(&self) -> usize {
        self.bundles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bundles.is_empty()
    }

    /// Write every bundle to `key/<bundle filename>`, in insertion order.
    ///
    /// Returns the written paths.
    pub fn flush(&self, options: &BuildOptions) -> Result<Vec<PathBuf>, BuildError> {
        let mut written = Vec::with_capacity(self.bundles.len());
        for bundle in &self.bundles {
            let path = bundle.key.join(options.bundle_filename(bundle.kind));
            crate::debug!("bundle"; "writing {} bundle {}", bundle.kind, path.display());
            fs::create_dir_all(&bundle.key).io_context("create directory", &bundle.key)?;
            fs::write(&path, &bundle.content).io_context("write", &path)?;
            written.push(path);
        }
        Ok(written)
    }
}
