//! URL to filesystem path resolution.

use std::path::{Path, PathBuf};

use percent_encoding::percent_decode_str;

/// Map a request URL onto a file under `serve_root`.
///
/// Directories resolve to their `index.html`. Anything that escapes the
/// root, directly or through a symlink, resolves to `None`.
pub fn resolve_path(url: &str, serve_root: &Path) -> Option<PathBuf> {
    let clean = normalize_url(url)?;

    if clean.split('/').any(|segment| segment == "..") {
        return None;
    }

    let canonical = serve_root.join(&clean).canonicalize().ok()?;
    let root_canonical = serve_root.canonicalize().ok()?;
    if !canonical.starts_with(&root_canonical) {
        return None;
    }

    if canonical.is_file() {
        return Some(canonical);
    }

    let index = canonical.join("index.html");
    index.is_file().then_some(index)
}

/// Strip query and fragment, percent-decode, trim slashes.
///
/// Returns `None` when the decoded path is not UTF-8.
fn normalize_url(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let decoded = percent_decode_str(path).decode_utf8().ok()?;
    if decoded.contains('\0') {
        return None;
    }
    Some(decoded.replace('\\', "/").trim_matches('/').to_string())
}
