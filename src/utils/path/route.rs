//! URL processing utilities.
//!
//! - Link type detection (external vs local)
//! - Site-root URLs for files in the output tree

use std::path::Path;

/// Check if a link is external (has a URL scheme like http:, data:, etc.)
///
/// A valid scheme must:
/// - Have at least 1 character before the colon
/// - Only contain ASCII alphanumeric or `+`, `-`, `.`
///
/// # Examples
/// ```ignore
/// assert!(is_external_link("https://example.com"));
/// assert!(is_external_link("data:text/css,a{}"));
/// assert!(!is_external_link("/css/site.css"));
/// assert!(!is_external_link("./file.txt"));
/// ```
#[inline]
pub fn is_external_link(link: &str) -> bool {
    link.find(':').is_some_and(|pos| {
        pos > 0
            && link[..pos]
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    })
}

/// Site-root URL (`/dir/file`) for `file` inside `dir` relative to `root`.
///
/// Returns `None` if `dir` is not under `root`.
///
/// # Examples
/// ```ignore
/// root_url(Path::new("/out/css"), Path::new("/out"), "bundle.min.css") // Some("/css/bundle.min.css")
/// root_url(Path::new("/out"), Path::new("/out"), "bundle.min.css")     // Some("/bundle.min.css")
/// ```
pub fn root_url(dir: &Path, root: &Path, file: &str) -> Option<String> {
    let rel = dir.strip_prefix(root).ok()?;
    let mut url = String::from("/");
    for component in rel.components() {
        url.push_str(&component.as_os_str().to_string_lossy());
        url.push('/');
    }
    url.push_str(file);
    Some(url)
}
