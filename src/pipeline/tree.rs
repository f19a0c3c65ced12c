//! Target tree preparation, copy, and document discovery.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use jwalk::WalkDir;
use rayon::prelude::*;

use super::{BuildError, IoContext};
use crate::debug;

/// Make `target` an empty directory.
///
/// An existing target is only replaced when `overwrite` is set or `confirm`
/// approves it. Nothing is touched when the caller declines.
pub fn prepare_target<F>(target: &Path, overwrite: bool, confirm: F) -> Result<(), BuildError>
where
    F: FnOnce(&Path) -> io::Result<bool>,
{
    if target.exists() {
        let approved = overwrite || confirm(target).io_context("confirm overwrite of", target)?;
        if !approved {
            return Err(BuildError::OverwriteDeclined(target.to_path_buf()));
        }

        debug!("build"; "clearing {}", target.display());
        if target.is_dir() {
            fs::remove_dir_all(target).io_context("clear", target)?;
        } else {
            fs::remove_file(target).io_context("clear", target)?;
        }
    }

    fs::create_dir_all(target).io_context("create directory", target)
}

/// Copy everything under `origin` into `target`, hidden files included.
///
/// Returns the number of files copied.
pub fn copy_tree(origin: &Path, target: &Path) -> Result<usize, BuildError> {
    let mut files = Vec::new();

    for entry in WalkDir::new(origin).skip_hidden(false).sort(true) {
        let entry = entry.map_err(|e| {
            let path = e.path().map_or_else(|| origin.to_path_buf(), Path::to_path_buf);
            BuildError::io("walk", path, e.into())
        })?;
        let path = entry.path();
        let Ok(rel) = path.strip_prefix(origin) else {
            continue;
        };
        let dest = target.join(rel);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&dest).io_context("create directory", &dest)?;
        } else if path.is_file() {
            files.push((path, dest));
        }
    }

    files.par_iter().try_for_each(|(from, to)| {
        fs::copy(from, to).io_context("copy", from).map(|_| ())
    })?;

    debug!("build"; "copied {} files into {}", files.len(), target.display());
    Ok(files.len())
}

/// Every `.html` / `.htm` file under `root`, sorted.
pub fn discover_documents(root: &Path) -> Vec<PathBuf> {
    let mut documents: Vec<_> = WalkDir::new(root)
        .skip_hidden(false)
        .sort(true)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path())
        .filter(|path| is_document(path))
        .collect();
    documents.sort();
    documents
}

fn is_document(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("html") || ext.eq_ignore_ascii_case("htm"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_prepare_creates_missing_target() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("out");

        prepare_target(&target, false, |_| panic!("should not ask")).unwrap();
        assert!(target.is_dir());
    }

    #[test]
    fn test_prepare_overwrite_clears_target() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("out");
        write(&target.join("stale.html"), "old");

        prepare_target(&target, true, |_| panic!("should not ask")).unwrap();
        assert!(target.is_dir());
        assert!(!target.join("stale.html").exists());
    }

    #[test]
    fn test_prepare_asks_and_respects_decline() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("out");
        write(&target.join("keep.html"), "keep");

        let mut asked = None;
        let err = prepare_target(&target, false, |path| {
            asked = Some(path.to_path_buf());
            Ok(false)
        })
        .unwrap_err();

        assert!(matches!(err, BuildError::OverwriteDeclined(_)));
        assert_eq!(asked.as_deref(), Some(target.as_path()));
        assert_eq!(fs::read_to_string(target.join("keep.html")).unwrap(), "keep");
    }

    #[test]
    fn test_prepare_confirmed() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("out");
        write(&target.join("old.html"), "old");

        prepare_target(&target, false, |_| Ok(true)).unwrap();
        assert!(!target.join("old.html").exists());
    }

    #[test]
    fn test_copy_tree_includes_hidden_and_nested() {
        let temp = TempDir::new().unwrap();
        let origin = temp.path().join("src");
        let target = temp.path().join("out");
        write(&origin.join("index.html"), "<p>x</p>");
        write(&origin.join("a/b/c.css"), "c{}");
        write(&origin.join(".htaccess"), "deny");
        fs::create_dir_all(origin.join("empty")).unwrap();
        fs::create_dir_all(&target).unwrap();

        let copied = copy_tree(&origin, &target).unwrap();

        assert_eq!(copied, 3);
        assert_eq!(fs::read_to_string(target.join("a/b/c.css")).unwrap(), "c{}");
        assert!(target.join(".htaccess").is_file());
        assert!(target.join("empty").is_dir());
    }

    #[test]
    fn test_discover_documents_sorted() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        write(&root.join("z.html"), "");
        write(&root.join("blog/post.HTM"), "");
        write(&root.join("a.html"), "");
        write(&root.join("style.css"), "");

        let docs = discover_documents(root);
        assert_eq!(
            docs,
            vec![root.join("a.html"), root.join("blog/post.HTM"), root.join("z.html")]
        );
    }
}
