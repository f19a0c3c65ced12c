//! Tag matchers for the scan-and-splice loop.
//!
//! Three matchers locate the tags a document pass cares about:
//!
//! | Pattern      | Tag                                   | Captured path     |
//! |--------------|---------------------------------------|-------------------|
//! | `Include`    | `<include href="partial.html" />`     | `href`            |
//! | `Stylesheet` | `<link rel="stylesheet" href="a.css">`| `href`            |
//! | `Script`     | `<script src="a.js"></script>`        | `src`             |
//!
//! Matchers are stateless. They always scan the buffer from the start and
//! return the first qualifying tag, because every splice shifts offsets
//! behind it.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;
use rustc_hash::FxHashSet;

use crate::asset::AssetKind;
use crate::utils::path::is_external_link;

static INCLUDE_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)<include[ \t\r\n]+href[ \t\r\n]*=[ \t\r\n]*(?:"([^"]*)"|'([^']*)'|([^ \t\r\n>'"]+))[ \t\r\n]*/?>"#,
    )
    .unwrap()
});

static LINK_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<link((?:[ \t\r\n][^>]*)?)>").unwrap());

static SCRIPT_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<script((?:[ \t\r\n][^>]*)?)>").unwrap());

static SCRIPT_CLOSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^[ \t\r\n]*</script[ \t\r\n]*>").unwrap());

/// A tag located in the current buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagMatch {
    /// Byte range of the whole tag (for scripts, up to `</script>` when the
    /// element body is blank).
    pub range: Range<usize>,
    /// Byte range of the captured path inside the buffer.
    pub path_range: Range<usize>,
    /// The path exactly as written.
    pub path: String,
}

impl TagMatch {
    /// Full tag text within `text`.
    pub fn tag<'a>(&self, text: &'a str) -> &'a str {
        &text[self.range.clone()]
    }

    /// Tag text with the captured path replaced by `new_path`.
    pub fn rewrite(&self, text: &str, new_path: &str) -> String {
        let start = self.range.start;
        let mut tag = self.tag(text).to_string();
        tag.replace_range(
            self.path_range.start - start..self.path_range.end - start,
            new_path,
        );
        tag
    }
}

/// The three tag patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    Include,
    Stylesheet,
    Script,
}

impl Pattern {
    /// Pattern for asset references of `kind`.
    pub const fn for_asset(kind: AssetKind) -> Self {
        match kind {
            AssetKind::Css => Self::Stylesheet,
            AssetKind::Js => Self::Script,
        }
    }

    /// Find the first qualifying tag in `text`.
    ///
    /// Paths listed in `skip` are treated as already processed and passed over.
    pub fn find(self, text: &str, skip: &FxHashSet<String>) -> Option<TagMatch> {
        match self {
            Self::Include => find_include(text),
            Self::Stylesheet => find_reference(text, AssetKind::Css, skip),
            Self::Script => find_reference(text, AssetKind::Js, skip),
        }
    }
}

fn find_include(text: &str) -> Option<TagMatch> {
    let caps = INCLUDE_TAG.captures(text)?;
    let whole = caps.get(0)?;

    let (value, unquoted) = match (caps.get(1), caps.get(2), caps.get(3)) {
        (Some(v), _, _) | (_, Some(v), _) => (v, false),
        (_, _, Some(v)) => (v, true),
        _ => return None,
    };

    // `href=a.html/>` leaves the self-closing slash on an unquoted value
    let mut end = value.end();
    if unquoted {
        end -= value.as_str().len() - value.as_str().trim_end_matches('/').len();
    }

    Some(TagMatch {
        range: whole.range(),
        path_range: value.start()..end,
        path: text[value.start()..end].to_string(),
    })
}

fn find_reference(text: &str, kind: AssetKind, skip: &FxHashSet<String>) -> Option<TagMatch> {
    let tag_re = match kind {
        AssetKind::Css => &*LINK_TAG,
        AssetKind::Js => &*SCRIPT_TAG,
    };

    for caps in tag_re.captures_iter(text) {
        let (Some(whole), Some(attrs_match)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let attrs = parse_attributes(attrs_match.as_str());

        if kind == AssetKind::Css && !is_stylesheet(&attrs) {
            continue;
        }

        let Some(target) = attrs
            .iter()
            .find(|attr| attr.name.eq_ignore_ascii_case(kind.attr()))
        else {
            continue;
        };

        let path = target.value;
        if !is_processable(path, kind) || skip.contains(path) {
            continue;
        }

        let offset = attrs_match.start();
        let mut range = whole.range();
        if kind == AssetKind::Js
            && let Some(close) = SCRIPT_CLOSE.find(&text[range.end..])
        {
            range.end += close.end();
        }

        return Some(TagMatch {
            range,
            path_range: offset + target.value_range.start..offset + target.value_range.end,
            path: path.to_string(),
        });
    }

    None
}

/// `rel="stylesheet"` (as one of the rel tokens) or `type="text/css"`.
fn is_stylesheet(attrs: &[Attribute<'_>]) -> bool {
    attrs.iter().any(|attr| {
        if attr.name.eq_ignore_ascii_case("rel") {
            attr.value
                .split_ascii_whitespace()
                .any(|token| token.eq_ignore_ascii_case("stylesheet"))
        } else if attr.name.eq_ignore_ascii_case("type") {
            attr.value.trim().eq_ignore_ascii_case("text/css")
        } else {
            false
        }
    })
}

/// Local reference that has not been minified yet.
fn is_processable(path: &str, kind: AssetKind) -> bool {
    let lower = path.to_ascii_lowercase();
    if path.is_empty() || is_external_link(path) || path.starts_with("//") {
        return false;
    }
    if lower.ends_with(kind.min_suffix()) {
        return false;
    }
    match kind {
        AssetKind::Css => true,
        AssetKind::Js => lower.ends_with(".js"),
    }
}

// ============================================================================
// Attribute parsing
// ============================================================================

/// A parsed attribute with the byte range of its value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute<'a> {
    pub name: &'a str,
    pub value: &'a str,
    /// Range of `value` within the parsed string (excludes quotes).
    pub value_range: Range<usize>,
}

/// Parse an HTML attribute string such as ` rel="stylesheet" href=a.css /`.
///
/// Valueless attributes get an empty value. A trailing `/` is ignored.
pub fn parse_attributes(s: &str) -> Vec<Attribute<'_>> {
    let bytes = s.as_bytes();
    let mut attrs = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i].is_ascii_whitespace() || bytes[i] == b'/' {
            i += 1;
            continue;
        }

        // Name
        let name_start = i;
        while i < bytes.len()
            && !bytes[i].is_ascii_whitespace()
            && !matches!(bytes[i], b'=' | b'/' | b'>')
        {
            i += 1;
        }
        let name = &s[name_start..i];

        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }

        if i >= bytes.len() || bytes[i] != b'=' {
            attrs.push(Attribute {
                name,
                value: "",
                value_range: i..i,
            });
            continue;
        }
        i += 1; // '='

        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }

        // Value
        let value_range = if i < bytes.len() && matches!(bytes[i], b'"' | b'\'') {
            let quote = bytes[i];
            let start = i + 1;
            let end = s[start..].find(quote as char).map_or(s.len(), |p| start + p);
            i = (end + 1).min(s.len());
            start..end
        } else {
            let start = i;
            while i < bytes.len() && !bytes[i].is_ascii_whitespace() && bytes[i] != b'>' {
                i += 1;
            }
            // `href=a.css/>`: the last unquoted value carries the self-closing slash
            let mut end = i;
            if end == bytes.len() && end > start + 1 && bytes[end - 1] == b'/' {
                end -= 1;
            }
            start..end
        };

        attrs.push(Attribute {
            name,
            value: &s[value_range.clone()],
            value_range,
        });
    }

    attrs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn none() -> FxHashSet<String> {
        FxHashSet::default()
    }

    #[test]
    fn test_include_double_quoted() {
        let text = r#"<body><include href="partials/header.html" /></body>"#;
        let m = Pattern::Include.find(text, &none()).unwrap();
        assert_eq!(m.path, "partials/header.html");
        assert_eq!(m.tag(text), r#"<include href="partials/header.html" />"#);
    }

    #[test]
    fn test_include_single_quoted_and_uppercase() {
        let text = "<INCLUDE HREF='nav.html'>";
        let m = Pattern::Include.find(text, &none()).unwrap();
        assert_eq!(m.path, "nav.html");
        assert_eq!(m.range, 0..text.len());
    }

    #[test]
    fn test_include_unquoted_self_closing() {
        let text = "<include href=nav.html/>";
        let m = Pattern::Include.find(text, &none()).unwrap();
        assert_eq!(m.path, "nav.html");
        assert_eq!(m.range, 0..text.len());
    }

    #[test]
    fn test_include_returns_first() {
        let text = r#"<include href="a.html"><include href="b.html">"#;
        assert_eq!(Pattern::Include.find(text, &none()).unwrap().path, "a.html");
    }

    #[test]
    fn test_no_include() {
        assert!(Pattern::Include.find("<p>hello</p>", &none()).is_none());
    }

    #[test]
    fn test_stylesheet_match() {
        let text = r#"<head><link rel="stylesheet" href="css/site.css"></head>"#;
        let m = Pattern::Stylesheet.find(text, &none()).unwrap();
        assert_eq!(m.path, "css/site.css");
        assert_eq!(&text[m.path_range.clone()], "css/site.css");
        assert_eq!(
            m.rewrite(text, "css/site.min.css"),
            r#"<link rel="stylesheet" href="css/site.min.css">"#
        );
    }

    #[test]
    fn test_stylesheet_type_attribute_after_href() {
        let text = "<link href='a.css' type='text/css' />";
        let m = Pattern::Stylesheet.find(text, &none()).unwrap();
        assert_eq!(m.path, "a.css");
    }

    #[test]
    fn test_stylesheet_unquoted_self_closing() {
        let text = "<link rel=stylesheet href=a.css/>";
        let m = Pattern::Stylesheet.find(text, &none()).unwrap();
        assert_eq!(m.path, "a.css");
        assert_eq!(m.rewrite(text, "a.min.css"), "<link rel=stylesheet href=a.min.css/>");

        let attrs = parse_attributes(" src=js/app.js/");
        assert_eq!(attrs[0].value, "js/app.js");
    }

    #[test]
    fn test_stylesheet_skips_non_stylesheet_links() {
        let text = r#"<link rel="icon" href="favicon.ico"><link rel="stylesheet" href="b.css">"#;
        assert_eq!(Pattern::Stylesheet.find(text, &none()).unwrap().path, "b.css");
    }

    #[test]
    fn test_stylesheet_skips_minified_and_external() {
        let text = concat!(
            r#"<link rel="stylesheet" href="a.min.css">"#,
            r#"<link rel="stylesheet" href="https://cdn.example.com/x.css">"#,
            r#"<link rel="stylesheet" href="//cdn.example.com/y.css">"#,
        );
        assert!(Pattern::Stylesheet.find(text, &none()).is_none());
    }

    #[test]
    fn test_stylesheet_skip_set() {
        let text = r#"<link rel="stylesheet" href="/all.css"><link rel="stylesheet" href="b.css">"#;
        let mut skip = none();
        skip.insert("/all.css".to_string());
        assert_eq!(Pattern::Stylesheet.find(text, &skip).unwrap().path, "b.css");
    }

    #[test]
    fn test_script_includes_blank_body_and_close_tag() {
        let text = "<script src=\"js/app.js\"></script>\n<p>after</p>";
        let m = Pattern::Script.find(text, &none()).unwrap();
        assert_eq!(m.path, "js/app.js");
        assert_eq!(m.tag(text), "<script src=\"js/app.js\"></script>");
    }

    #[test]
    fn test_script_skips_minified_and_non_js() {
        let text = concat!(
            "<script src=\"vendor.min.js\"></script>",
            "<script src=\"data.json\"></script>",
            "<script>inline()</script>",
        );
        assert!(Pattern::Script.find(text, &none()).is_none());
    }

    #[test]
    fn test_script_with_other_attributes() {
        let text = "<script defer type=\"text/javascript\" src='main.js'></script>";
        let m = Pattern::Script.find(text, &none()).unwrap();
        assert_eq!(m.path, "main.js");
        assert_eq!(
            m.rewrite(text, "main.min.js"),
            "<script defer type=\"text/javascript\" src='main.min.js'></script>"
        );
    }

    #[test]
    fn test_parse_attributes() {
        let attrs = parse_attributes(r#" rel="stylesheet" href=a.css async /"#);
        let names: Vec<_> = attrs.iter().map(|a| a.name).collect();
        assert_eq!(names, ["rel", "href", "async"]);
        assert_eq!(attrs[0].value, "stylesheet");
        assert_eq!(attrs[1].value, "a.css");
        assert_eq!(attrs[2].value, "");
    }

    #[test]
    fn test_parse_attributes_value_range() {
        let s = r#" href = 'x.css'"#;
        let attrs = parse_attributes(s);
        assert_eq!(&s[attrs[0].value_range.clone()], "x.css");
    }
}
