//! Asset kind definitions.

use std::fmt;

/// Kind of asset referenced from a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    /// Stylesheet linked with `<link rel="stylesheet">`.
    Css,
    /// Script loaded with `<script src>`.
    Js,
}

impl AssetKind {
    /// File extension without the dot.
    pub const fn ext(self) -> &'static str {
        match self {
            Self::Css => "css",
            Self::Js => "js",
        }
    }

    /// Suffix marking an already minified file (`.min.css`, `.min.js`).
    pub const fn min_suffix(self) -> &'static str {
        match self {
            Self::Css => ".min.css",
            Self::Js => ".min.js",
        }
    }

    /// Name of the attribute carrying the reference.
    pub const fn attr(self) -> &'static str {
        match self {
            Self::Css => "href",
            Self::Js => "src",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Css => "CSS",
            Self::Js => "JS",
        })
    }
}
