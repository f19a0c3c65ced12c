//! Per-document transformation.
//!
//! ```text
//! read ─► includes ─► stylesheets ─► scripts ─► HTML pass ─► write back
//! ```
//!
//! Each stage is a scan-and-splice loop: find the first unprocessed tag,
//! compute its replacement, splice it in, scan again from the start.

use std::fs;
use std::path::Path;

use rustc_hash::FxHashSet;

use super::include::{IncludeResolver, expand_includes};
use super::pattern::Pattern;
use super::{BuildContext, BuildError, IoContext};
use crate::asset::minify::{HtmlMinifyOptions, minify_html};
use crate::asset::{AssetKind, Rewrite, process_asset};
use crate::debug;

/// What a document pass changed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DocumentStats {
    pub includes: usize,
    pub stylesheets: usize,
    pub scripts: usize,
}

/// Transform one document in place.
pub fn transform_document(path: &Path, ctx: &mut BuildContext<'_>) -> Result<DocumentStats, BuildError> {
    let mut text = fs::read_to_string(path).io_context("read", path)?;
    let mut stats = DocumentStats::default();

    if ctx.options.parse_includes {
        let resolver = IncludeResolver::new(path, ctx.origin, ctx.target);
        stats.includes = expand_includes(&mut text, &resolver, &mut ctx.deletions)?;
    }

    for kind in [AssetKind::Css, AssetKind::Js] {
        if !ctx.options.minify(kind) {
            continue;
        }
        let count = rewrite_references(&mut text, kind, path, ctx)?;
        match kind {
            AssetKind::Css => stats.stylesheets = count,
            AssetKind::Js => stats.scripts = count,
        }
    }

    let html = minify_html(
        &text,
        HtmlMinifyOptions {
            collapse: ctx.options.minify_html,
            css: ctx.options.minify_css,
            js: ctx.options.minify_js,
        },
    );

    fs::write(path, html).io_context("write", path)?;
    debug!("document"; "{} ({:?})", path.display(), stats);
    Ok(stats)
}

/// Rewrite every local reference of `kind` in `text`.
///
/// Returns the number of tags processed.
fn rewrite_references(
    text: &mut String,
    kind: AssetKind,
    document: &Path,
    ctx: &mut BuildContext<'_>,
) -> Result<usize, BuildError> {
    let pattern = Pattern::for_asset(kind);
    // References this loop wrote itself; a custom bundle filename would
    // otherwise match again on the next scan.
    let mut emitted = FxHashSet::default();
    let mut count = 0;

    while let Some(tag) = pattern.find(text, &emitted) {
        let replacement = match process_asset(kind, &tag.path, document, ctx)? {
            Rewrite::Reference(reference) => {
                let rewritten = tag.rewrite(text, &reference);
                emitted.insert(reference);
                rewritten
            }
            Rewrite::Absorbed => String::new(),
        };
        text.replace_range(tag.range, &replacement);
        count += 1;
    }

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::BundleStore;
    use crate::pipeline::{BuildOptions, DeletionSet};
    use crate::utils::path::normalize_path;
    use std::path::PathBuf;
    use tempfile::TempDir;

    struct Site {
        _temp: TempDir,
        origin: PathBuf,
        target: PathBuf,
    }

    /// Write `files` into both trees, as if the copy phase already ran.
    fn site(files: &[(&str, &str)]) -> Site {
        let temp = TempDir::new().unwrap();
        let origin = temp.path().join("src");
        let target = temp.path().join("out");
        for root in [&origin, &target] {
            for (rel, content) in files {
                let path = root.join(rel);
                fs::create_dir_all(path.parent().unwrap()).unwrap();
                fs::write(path, content).unwrap();
            }
        }
        Site {
            origin: normalize_path(&origin),
            target: normalize_path(&target),
            _temp: temp,
        }
    }

    fn ctx<'a>(site: &'a Site, options: &'a BuildOptions) -> BuildContext<'a> {
        BuildContext {
            origin: &site.origin,
            target: &site.target,
            options,
            bundles: BundleStore::new(),
            deletions: DeletionSet::new(),
        }
    }

    #[test]
    fn test_plain_document_only_minified() {
        let s = site(&[("index.html", "<html>\n  <body>\n    <!-- note -->\n    <p>Hi</p>\n  </body>\n</html>\n")]);
        let options = BuildOptions::default();
        let mut ctx = ctx(&s, &options);
        let doc = s.target.join("index.html");

        let stats = transform_document(&doc, &mut ctx).unwrap();

        assert_eq!(stats, DocumentStats::default());
        let out = fs::read_to_string(&doc).unwrap();
        assert!(!out.contains("note"));
        assert!(!out.contains('\n'));
        assert!(out.contains("<p>Hi</p>"));
        assert!(ctx.deletions.is_empty());
    }

    #[test]
    fn test_full_document_pass() {
        let s = site(&[
            (
                "index.html",
                concat!(
                    "<html><head><link rel=\"stylesheet\" href=\"css/site.css\"></head>\n",
                    "<body><include href=\"header.html\" />\n",
                    "<script src=\"js/app.js\"></script></body></html>\n",
                ),
            ),
            ("header.html", "<h1>Title</h1>"),
            ("css/site.css", "body {\n  color: red;\n}\n"),
            ("js/app.js", "function hello() {\n  console.log('hi');\n}\nhello();\n"),
        ]);
        let options = BuildOptions::default();
        let mut ctx = ctx(&s, &options);
        let doc = s.target.join("index.html");

        let stats = transform_document(&doc, &mut ctx).unwrap();
        assert_eq!(
            stats,
            DocumentStats {
                includes: 1,
                stylesheets: 1,
                scripts: 1
            }
        );

        let out = fs::read_to_string(&doc).unwrap();
        assert!(out.contains("<h1>Title</h1>"));
        assert!(out.contains("css/site.min.css"));
        assert!(out.contains("js/app.min.js"));
        assert!(!out.contains("<include"));
        assert!(s.target.join("css/site.min.css").is_file());
        assert!(s.target.join("js/app.min.js").is_file());
        assert!(ctx.deletions.contains(&s.target.join("header.html")));
        assert!(ctx.deletions.contains(&s.target.join("css/site.css")));
        assert!(ctx.deletions.contains(&s.target.join("js/app.js")));
    }

    #[test]
    fn test_included_references_are_processed() {
        let s = site(&[
            ("index.html", "<head><include href=\"head.html\"></head>"),
            ("head.html", "<link rel=\"stylesheet\" href=\"a.css\">"),
            ("a.css", "a { color: blue; }"),
        ]);
        let options = BuildOptions::default();
        let mut ctx = ctx(&s, &options);
        let doc = s.target.join("index.html");

        transform_document(&doc, &mut ctx).unwrap();
        let out = fs::read_to_string(&doc).unwrap();
        assert!(out.contains("a.min.css"));
    }

    #[test]
    fn test_concat_absorbs_second_script() {
        let s = site(&[
            (
                "index.html",
                "<body>\n<script src=\"a.js\"></script>\n<script src=\"b.js\"></script>\n</body>",
            ),
            ("a.js", "window.a = 1;"),
            ("b.js", "window.b = 2;"),
        ]);
        let options = BuildOptions {
            minify_html: false,
            concat_js: true,
            ..BuildOptions::default()
        };
        let mut ctx = ctx(&s, &options);
        let doc = s.target.join("index.html");

        let stats = transform_document(&doc, &mut ctx).unwrap();
        assert_eq!(stats.scripts, 2);

        let out = fs::read_to_string(&doc).unwrap();
        assert_eq!(out.matches("<script").count(), 1);
        assert!(out.contains("src=\"/bundle.min.js\""));
        assert_eq!(ctx.bundles.len(), 1);
    }

    #[test]
    fn test_custom_bundle_name_not_rescanned() {
        let s = site(&[
            ("index.html", "<link rel=\"stylesheet\" href=\"a.css\"><link rel=\"stylesheet\" href=\"b.css\">"),
            ("a.css", "a{color:red}"),
            ("b.css", "b{color:blue}"),
        ]);
        let options = BuildOptions {
            concat_css: true,
            css_bundle_filename: "all.css".into(),
            ..BuildOptions::default()
        };
        let mut ctx = ctx(&s, &options);
        let doc = s.target.join("index.html");

        let stats = transform_document(&doc, &mut ctx).unwrap();
        assert_eq!(stats.stylesheets, 2);

        let out = fs::read_to_string(&doc).unwrap();
        assert_eq!(out.matches("<link").count(), 1);
        assert!(out.contains("/all.css"));
    }

    #[test]
    fn test_disabled_flags_leave_references() {
        let s = site(&[
            ("index.html", "<link rel=\"stylesheet\" href=\"a.css\">\n<include href=\"x.html\">"),
            ("a.css", "a{}"),
        ]);
        let options = BuildOptions {
            minify_html: false,
            minify_css: false,
            parse_includes: false,
            ..BuildOptions::default()
        };
        let mut ctx = ctx(&s, &options);
        let doc = s.target.join("index.html");

        transform_document(&doc, &mut ctx).unwrap();
        let out = fs::read_to_string(&doc).unwrap();
        assert_eq!(out, "<link rel=\"stylesheet\" href=\"a.css\">\n<include href=\"x.html\">");
        assert!(ctx.deletions.is_empty());
    }

    #[test]
    fn test_missing_asset_aborts_without_writing() {
        let s = site(&[("index.html", "<script src=\"missing.js\"></script>")]);
        let options = BuildOptions::default();
        let mut ctx = ctx(&s, &options);
        let doc = s.target.join("index.html");

        let err = transform_document(&doc, &mut ctx).unwrap_err();
        assert!(matches!(err, BuildError::AssetNotFound { .. }));
        assert_eq!(
            fs::read_to_string(&doc).unwrap(),
            "<script src=\"missing.js\"></script>"
        );
    }
}
