//! Config file sections.
//!
//! ```toml
//! [build]
//! minify_html = true
//! minify_js = true
//! minify_css = true
//! concat_js = false
//! concat_css = false
//! parse_includes = true
//!
//! [bundle]
//! css_filename = "bundle.min.css"
//! js_filename = "bundle.min.js"
//!
//! [serve]
//! interface = "127.0.0.1"   # 0.0.0.0 to expose on the LAN
//! port = 0                  # 0 picks a free port
//! ```

use std::net::{IpAddr, Ipv4Addr};

use serde::{Deserialize, Serialize};

use crate::pipeline::{DEFAULT_CSS_BUNDLE, DEFAULT_JS_BUNDLE};

/// `[build]`: what happens to each document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildSection {
    pub minify_html: bool,
    pub minify_js: bool,
    pub minify_css: bool,
    pub concat_js: bool,
    pub concat_css: bool,
    pub parse_includes: bool,
}

impl Default for BuildSection {
    fn default() -> Self {
        Self {
            minify_html: true,
            minify_js: true,
            minify_css: true,
            concat_js: false,
            concat_css: false,
            parse_includes: true,
        }
    }
}

/// `[bundle]`: filenames of per-folder bundles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BundleSection {
    pub css_filename: String,
    pub js_filename: String,
}

impl Default for BundleSection {
    fn default() -> Self {
        Self {
            css_filename: DEFAULT_CSS_BUNDLE.to_string(),
            js_filename: DEFAULT_JS_BUNDLE.to_string(),
        }
    }
}

/// `[serve]`: development server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServeSection {
    /// Network interface to bind.
    pub interface: IpAddr,
    /// HTTP port, 0 for any free port.
    pub port: u16,
}

impl Default for ServeSection {
    fn default() -> Self {
        Self {
            interface: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 0,
        }
    }
}
