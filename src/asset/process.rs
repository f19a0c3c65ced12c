//! Asset processing (side effects).
//!
//! Resolves a stylesheet or script reference found in a document, minifies
//! the file, and either writes a `*.min.*` sibling or feeds a directory
//! bundle. The source file is always scheduled for deferred deletion.

use std::fs;
use std::path::Path;

use super::bundle::BundleSlot;
use super::{AssetKind, minify};
use crate::pipeline::{BuildContext, BuildError, IoContext};
use crate::utils::path::{resolve_reference, root_url};
use crate::{debug, log};

/// How the referencing tag must change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rewrite {
    /// Point the tag at this path instead.
    Reference(String),
    /// The asset went into a bundle another tag already references; drop the tag.
    Absorbed,
}

/// Process one asset reference written as `raw` inside `document`.
pub fn process_asset(
    kind: AssetKind,
    raw: &str,
    document: &Path,
    ctx: &mut BuildContext<'_>,
) -> Result<Rewrite, BuildError> {
    let doc_dir = document.parent().unwrap_or(ctx.target);
    let source = resolve_reference(raw, doc_dir, ctx.target);

    // the source is deleted once processed, so it has to be a copy we own
    if !source.starts_with(ctx.target) {
        return Err(BuildError::AssetOutsideTarget {
            kind,
            path: raw.to_string(),
            referenced_by: document.to_path_buf(),
        });
    }

    if !source.is_file() {
        return Err(BuildError::AssetNotFound {
            kind,
            path: raw.to_string(),
            referenced_by: document.to_path_buf(),
        });
    }

    let content = fs::read_to_string(&source).io_context("read", &source)?;
    let minified = minify::minify_asset(kind, &content).unwrap_or_else(|| {
        log!("minify"; "could not parse {}, keeping it unminified", source.display());
        content.clone()
    });

    let min_raw = minified_name(raw, kind);
    let min_path = resolve_reference(&min_raw, doc_dir, ctx.target);
    ctx.deletions.schedule(source.clone());

    if !ctx.options.concat(kind) {
        debug!("minify"; "{} -> {}", source.display(), min_path.display());
        fs::write(&min_path, minified).io_context("write", &min_path)?;
        return Ok(Rewrite::Reference(min_raw));
    }

    let key = min_path
        .parent()
        .map_or_else(|| ctx.target.to_path_buf(), Path::to_path_buf);
    let reference = bundle_reference(&key, &min_raw, ctx.target, ctx.options.bundle_filename(kind));

    match ctx.bundles.add(kind, key, &source, minified) {
        BundleSlot::Opened => {
            debug!("bundle"; "{} opens {}", source.display(), reference);
            Ok(Rewrite::Reference(reference))
        }
        BundleSlot::Appended => {
            debug!("bundle"; "{} appended to {}", source.display(), reference);
            Ok(Rewrite::Absorbed)
        }
    }
}

/// `css/site.css` -> `css/site.min.css`, `app` -> `app.min.js`.
///
/// Only the extension of the last path segment is replaced.
pub fn minified_name(raw: &str, kind: AssetKind) -> String {
    let name_start = raw.rfind('/').map_or(0, |i| i + 1);
    let base = match raw[name_start..].rfind('.') {
        Some(dot) if dot > 0 => &raw[..name_start + dot],
        _ => raw,
    };
    format!("{base}{}", kind.min_suffix())
}

/// Reference to the bundle of `key`, as a site-root URL.
///
/// A key outside the output tree keeps the reference relative to the document.
fn bundle_reference(key: &Path, min_raw: &str, target: &Path, filename: &str) -> String {
    root_url(key, target, filename).unwrap_or_else(|| {
        let dir = min_raw.rfind('/').map_or("", |i| &min_raw[..=i]);
        format!("{dir}{filename}")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::BundleStore;
    use crate::pipeline::{BuildOptions, DeletionSet};
    use tempfile::TempDir;

    fn ctx<'a>(target: &'a Path, options: &'a BuildOptions) -> BuildContext<'a> {
        BuildContext {
            origin: target,
            target,
            options,
            bundles: BundleStore::new(),
            deletions: DeletionSet::new(),
        }
    }

    #[test]
    fn test_minified_name() {
        assert_eq!(minified_name("site.css", AssetKind::Css), "site.min.css");
        assert_eq!(minified_name("css/site.css", AssetKind::Css), "css/site.min.css");
        assert_eq!(minified_name("../js/app.js", AssetKind::Js), "../js/app.min.js");
        assert_eq!(minified_name("v1.2/theme.less", AssetKind::Css), "v1.2/theme.min.css");
        assert_eq!(minified_name("v1.2/noext", AssetKind::Js), "v1.2/noext.min.js");
    }

    #[test]
    fn test_standalone_writes_sibling() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("css")).unwrap();
        fs::write(root.join("css/site.css"), "body {\n  color: red;\n}\n").unwrap();
        let doc = root.join("index.html");

        let options = BuildOptions::default();
        let mut ctx = ctx(root, &options);
        let rewrite = process_asset(AssetKind::Css, "css/site.css", &doc, &mut ctx).unwrap();

        assert_eq!(rewrite, Rewrite::Reference("css/site.min.css".into()));
        assert_eq!(
            fs::read_to_string(root.join("css/site.min.css")).unwrap(),
            "body{color:red}"
        );
        assert!(ctx.deletions.contains(&root.join("css/site.css")));
        assert!(ctx.bundles.is_empty());
    }

    #[test]
    fn test_missing_asset() {
        let temp = TempDir::new().unwrap();
        let doc = temp.path().join("index.html");
        let options = BuildOptions::default();
        let mut ctx = ctx(temp.path(), &options);

        let err = process_asset(AssetKind::Js, "missing.js", &doc, &mut ctx).unwrap_err();
        match err {
            BuildError::AssetNotFound {
                kind,
                path,
                referenced_by,
            } => {
                assert_eq!(kind, AssetKind::Js);
                assert_eq!(path, "missing.js");
                assert_eq!(referenced_by, doc);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_reference_outside_target_rejected() {
        let temp = TempDir::new().unwrap();
        let out = temp.path().join("dist");
        let shared = temp.path().join("shared/theme.css");
        fs::create_dir_all(&out).unwrap();
        fs::create_dir_all(shared.parent().unwrap()).unwrap();
        fs::write(&shared, "body { color: red; }").unwrap();
        let doc = out.join("index.html");

        let options = BuildOptions::default();
        let mut ctx = ctx(&out, &options);
        let err = process_asset(AssetKind::Css, "../shared/theme.css", &doc, &mut ctx).unwrap_err();

        assert!(matches!(err, BuildError::AssetOutsideTarget { .. }));
        assert!(shared.exists());
        assert!(!temp.path().join("shared/theme.min.css").exists());
        assert!(ctx.deletions.is_empty());
    }

    #[test]
    fn test_concat_opens_then_absorbs() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("js")).unwrap();
        fs::write(root.join("js/a.js"), "console.log('a');\n").unwrap();
        fs::write(root.join("js/b.js"), "console.log('b');\n").unwrap();
        let doc = root.join("index.html");

        let options = BuildOptions {
            concat_js: true,
            ..BuildOptions::default()
        };
        let mut ctx = ctx(root, &options);

        let first = process_asset(AssetKind::Js, "js/a.js", &doc, &mut ctx).unwrap();
        let second = process_asset(AssetKind::Js, "js/b.js", &doc, &mut ctx).unwrap();

        assert_eq!(first, Rewrite::Reference("/js/bundle.min.js".into()));
        assert_eq!(second, Rewrite::Absorbed);

        let bundle = ctx.bundles.get(AssetKind::Js, &root.join("js")).unwrap();
        assert_eq!(bundle.content.matches("console.log").count(), 2);
        assert!(bundle.content.contains('\n'));
        assert!(bundle.content.find('a') < bundle.content.find('b'));
        assert!(!root.join("js/a.min.js").exists());
        assert_eq!(ctx.deletions.len(), 2);
    }

    #[test]
    fn test_unparsable_asset_kept_verbatim() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::write(root.join("broken.js"), "function (").unwrap();
        let doc = root.join("index.html");
        let options = BuildOptions::default();
        let mut ctx = ctx(root, &options);

        let rewrite = process_asset(AssetKind::Js, "broken.js", &doc, &mut ctx).unwrap();
        assert_eq!(rewrite, Rewrite::Reference("broken.min.js".into()));
        assert_eq!(fs::read_to_string(root.join("broken.min.js")).unwrap(), "function (");
    }
}
