//! Build pipeline error types.

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::asset::AssetKind;

/// Errors that abort a build.
///
/// Every variant is fail-fast: the orchestrator stops at the first one and
/// leaves whatever was already written in the target tree.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("folder not found: {}", .0.display())]
    FolderNotFound(PathBuf),

    #[error("missing required parameter: {0}")]
    MissingOption(&'static str),

    #[error("refused to overwrite `{}`", .0.display())]
    OverwriteDeclined(PathBuf),

    #[error("cannot build `{}` into `{}`: target must be outside the source folder", .origin.display(), .target.display())]
    InvalidTarget { origin: PathBuf, target: PathBuf },

    #[error("included file not found: {path}\nfile was included by {}", .referenced_by.display())]
    IncludeNotFound { path: String, referenced_by: PathBuf },

    #[error("include cycle detected at `{}`: {}", .path.display(), IncludeChain(.chain))]
    IncludeCycleDetected { path: PathBuf, chain: Vec<PathBuf> },

    #[error("{kind} file not found: {path}\nfile was referenced by {}", .referenced_by.display())]
    AssetNotFound {
        kind: AssetKind,
        path: String,
        referenced_by: PathBuf,
    },

    #[error("{kind} file {path} lies outside the build folder\nfile was referenced by {}", .referenced_by.display())]
    AssetOutsideTarget {
        kind: AssetKind,
        path: String,
        referenced_by: PathBuf,
    },

    #[error("failed to {op} `{}`", .path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl BuildError {
    /// Wrap an IO error with the operation and path it failed on.
    pub fn io(op: &'static str, path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            op,
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

/// Extension for attaching [`BuildError::Io`] context to `io::Result`.
pub trait IoContext<T> {
    fn io_context(self, op: &'static str, path: &Path) -> Result<T, BuildError>;
}

impl<T> IoContext<T> for std::io::Result<T> {
    fn io_context(self, op: &'static str, path: &Path) -> Result<T, BuildError> {
        self.map_err(|source| BuildError::io(op, path, source))
    }
}

/// Renders an include chain as `a -> b -> c`.
struct IncludeChain<'a>(&'a [PathBuf]);

impl fmt::Display for IncludeChain<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, path) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, " -> ")?;
            }
            write!(f, "{}", path.display())?;
        }
        Ok(())
    }
}
