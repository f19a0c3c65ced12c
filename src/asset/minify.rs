//! Minification for JS, CSS and HTML.
//!
//! Uses oxc for JavaScript, lightningcss for CSS and minify-html for whole
//! documents. When HTML minification is off, only inline `<style>` and
//! `<script>` bodies are touched.

use std::sync::LazyLock;

use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};
use oxc::allocator::Allocator;
use oxc::codegen::{Codegen, CodegenOptions, CommentOptions};
use oxc::mangler::MangleOptions;
use oxc::minifier::{CompressOptions, Minifier, MinifierOptions};
use oxc::parser::Parser;
use oxc::span::SourceType;
use regex::{Captures, Regex};

use super::AssetKind;

/// Minify JavaScript source code.
pub fn minify_js(source: &str) -> Option<String> {
    let allocator = Allocator::default();
    // Classic scripts: top-level declarations are globals other scripts use
    let source_type = SourceType::script();
    let ret = Parser::new(&allocator, source, source_type).parse();
    if !ret.errors.is_empty() {
        return None;
    }
    let mut program = ret.program;
    let options = MinifierOptions {
        mangle: Some(MangleOptions::default()),
        compress: Some(CompressOptions::smallest()),
    };
    let ret = Minifier::new(options).minify(&allocator, &mut program);
    let code = Codegen::new()
        .with_options(CodegenOptions {
            minify: true,
            comments: CommentOptions::disabled(),
            ..CodegenOptions::default()
        })
        .with_scoping(ret.scoping)
        .build(&program)
        .code;
    Some(code)
}

/// Minify CSS source code.
pub fn minify_css(source: &str) -> Option<String> {
    let stylesheet = StyleSheet::parse(source, ParserOptions::default()).ok()?;
    let result = stylesheet
        .to_css(PrinterOptions {
            minify: true,
            ..PrinterOptions::default()
        })
        .ok()?;
    Some(result.code)
}

/// Minify content of the given kind.
///
/// Returns `None` when the minifier rejects the input.
pub fn minify_asset(kind: AssetKind, content: &str) -> Option<String> {
    match kind {
        AssetKind::Css => minify_css(content),
        AssetKind::Js => minify_js(content),
    }
}

/// Options for the final HTML pass over a document.
#[derive(Debug, Clone, Copy)]
pub struct HtmlMinifyOptions {
    /// Strip comments and collapse whitespace.
    pub collapse: bool,
    /// Minify inline `<style>` bodies.
    pub css: bool,
    /// Minify inline `<script>` bodies.
    pub js: bool,
}

/// Run the final HTML pass.
///
/// With `collapse` the whole document goes through minify-html. Without it
/// the markup is returned as-is apart from inline style/script bodies, so
/// line breaks survive. Self-closing slashes on void elements are kept
/// either way.
pub fn minify_html(html: &str, options: HtmlMinifyOptions) -> String {
    if options.collapse {
        let cfg = minify_html::Cfg {
            minify_css: options.css,
            minify_js: options.js,
            keep_closing_tags: true,
            keep_html_and_head_opening_tags: true,
            ..minify_html::Cfg::default()
        };
        let marked = SELF_CLOSED_VOID.replace_all(html, "<$1 data-htmlforge-sc$2/>");
        let out = minify_html::minify(marked.as_bytes(), &cfg);
        return match String::from_utf8(out) {
            Ok(minified) => restore_self_closing(&minified),
            Err(_) => html.to_string(),
        };
    }

    minify_inline_blocks(html, options.css, options.js)
}

/// Void elements written as `<br/>`. minify-html drops the slash, so these
/// get a marker attribute before minifying and the slash back afterwards.
static SELF_CLOSED_VOID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)<(area|base|br|col|embed|hr|img|input|link|meta|source|track|wbr)((?:[ \t\r\n][^>]*?)?)[ \t\r\n]*/>",
    )
    .unwrap()
});

static MARKED_VOID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)<(area|base|br|col|embed|hr|img|input|link|meta|source|track|wbr) data-htmlforge-sc((?:[ \t\r\n][^>]*?)?)[ \t\r\n]*/?>",
    )
    .unwrap()
});

/// Turn marked void tags back into `<name attrs/>`.
///
/// An unquoted last value would swallow the slash, so it gets a space first.
fn restore_self_closing(html: &str) -> String {
    MARKED_VOID
        .replace_all(html, |caps: &Captures| {
            let name = &caps[1];
            let attrs = caps[2].trim_end();
            let spacer = match attrs.chars().last() {
                None | Some('"' | '\'') => "",
                Some(_) => " ",
            };
            format!("<{name}{attrs}{spacer}/>")
        })
        .into_owned()
}

static INLINE_STYLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)(<style(?:[ \t\r\n][^>]*)?>)(.*?)(</style[ \t\r\n]*>)").unwrap());

static INLINE_SCRIPT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)(<script((?:[ \t\r\n][^>]*)?)>)(.*?)(</script[ \t\r\n]*>)").unwrap());

/// Minify inline `<style>` and `<script>` bodies, leaving everything else untouched.
fn minify_inline_blocks(html: &str, css: bool, js: bool) -> String {
    let mut out = html.to_string();

    if css {
        out = INLINE_STYLE
            .replace_all(&out, |caps: &Captures| {
                let body = &caps[2];
                if body.trim().is_empty() {
                    return caps[0].to_string();
                }
                match minify_css(body) {
                    Some(min) => format!("{}{}{}", &caps[1], min, &caps[3]),
                    None => caps[0].to_string(),
                }
            })
            .into_owned();
    }

    if js {
        out = INLINE_SCRIPT
            .replace_all(&out, |caps: &Captures| {
                let body = &caps[3];
                if body.trim().is_empty() || !is_classic_script(&caps[2]) {
                    return caps[0].to_string();
                }
                match minify_js(body) {
                    Some(min) => format!("{}{}{}", &caps[1], min, &caps[4]),
                    None => caps[0].to_string(),
                }
            })
            .into_owned();
    }

    out
}

/// Whether a `<script>` with these attributes holds JavaScript.
///
/// Scripts with `src` are external; JSON, templates and other data blocks are
/// left alone.
fn is_classic_script(attrs: &str) -> bool {
    let attrs = crate::pipeline::pattern::parse_attributes(attrs);
    if attrs.iter().any(|attr| attr.name.eq_ignore_ascii_case("src")) {
        return false;
    }
    match attrs
        .iter()
        .find(|attr| attr.name.eq_ignore_ascii_case("type"))
        .map(|attr| attr.value.trim().to_ascii_lowercase())
    {
        None => true,
        Some(ty) => matches!(
            ty.as_str(),
            "" | "text/javascript" | "application/javascript" | "module"
        ),
    }
}
