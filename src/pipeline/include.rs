//! `<include href="..." />` expansion.
//!
//! Include files are read from the source tree, never from the copy being
//! rewritten, so the result does not depend on which document was
//! transformed first. Each spliced file is expanded completely before it
//! replaces its tag; the chain of files currently open is checked so a file
//! that (transitively) includes itself fails instead of looping.

use std::fs;
use std::path::{Path, PathBuf};

use rustc_hash::FxHashSet;

use super::cleanup::DeletionSet;
use super::pattern::Pattern;
use super::{BuildError, IoContext};
use crate::debug;
use crate::utils::path::normalize_path;

/// Resolves include paths for one document.
pub struct IncludeResolver<'a> {
    origin: &'a Path,
    target: &'a Path,
    /// Document being transformed (in the target tree).
    document: &'a Path,
    /// The document's folder in the source tree.
    source_dir: PathBuf,
}

impl<'a> IncludeResolver<'a> {
    pub fn new(document: &'a Path, origin: &'a Path, target: &'a Path) -> Self {
        let source_dir = document
            .strip_prefix(target)
            .ok()
            .and_then(Path::parent)
            .map_or_else(|| origin.to_path_buf(), |rel| origin.join(rel));
        Self {
            origin,
            target,
            document,
            source_dir,
        }
    }

    /// The document's own file in the source tree.
    fn document_source(&self) -> PathBuf {
        let source = match self.document.strip_prefix(self.target) {
            Ok(rel) => self.origin.join(rel),
            Err(_) => self.document.to_path_buf(),
        };
        normalize_path(&source)
    }

    /// Find the file an include path names.
    ///
    /// Tries the document's folder first, then the source root.
    pub fn resolve(&self, raw: &str) -> Option<PathBuf> {
        let candidates = match raw.strip_prefix('/') {
            Some(rooted) => vec![self.origin.join(rooted)],
            None => vec![self.source_dir.join(raw), self.origin.join(raw)],
        };
        candidates
            .into_iter()
            .find(|path| path.is_file())
            .map(|path| normalize_path(&path))
    }

    /// Copy of a source-tree file inside the target tree.
    pub fn target_copy(&self, file: &Path) -> Option<PathBuf> {
        file.strip_prefix(self.origin)
            .ok()
            .map(|rel| self.target.join(rel))
    }
}

/// Expand every include in `text`.
///
/// Returns the number of include tags replaced, nested ones included.
pub fn expand_includes(
    text: &mut String,
    resolver: &IncludeResolver<'_>,
    deletions: &mut DeletionSet,
) -> Result<usize, BuildError> {
    let mut chain = vec![resolver.document_source()];
    expand(text, resolver, &mut chain, deletions)
}

fn expand(
    text: &mut String,
    resolver: &IncludeResolver<'_>,
    chain: &mut Vec<PathBuf>,
    deletions: &mut DeletionSet,
) -> Result<usize, BuildError> {
    let no_skip = FxHashSet::default();
    let mut count = 0;

    while let Some(tag) = Pattern::Include.find(text, &no_skip) {
        let file = resolver
            .resolve(&tag.path)
            .ok_or_else(|| BuildError::IncludeNotFound {
                path: tag.path.clone(),
                referenced_by: resolver.document.to_path_buf(),
            })?;

        if chain.contains(&file) {
            let mut cycle = chain.clone();
            cycle.push(file.clone());
            return Err(BuildError::IncludeCycleDetected { path: file, chain: cycle });
        }

        let mut content = fs::read_to_string(&file).io_context("read", &file)?;
        chain.push(file.clone());
        count += expand(&mut content, resolver, chain, deletions)?;
        chain.pop();

        debug!("include"; "{} into {}", file.display(), resolver.document.display());
        if let Some(copy) = resolver.target_copy(&file) {
            deletions.schedule(copy);
        }

        text.replace_range(tag.range, &content);
        count += 1;
    }

    Ok(count)
}
