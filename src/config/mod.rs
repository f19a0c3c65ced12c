//! Configuration for `htmlforge.toml`.
//!
//! Values are layered: built-in defaults, then the config file (if one is
//! found), then command-line options.
//!
//! | Section    | Purpose                                         |
//! |------------|-------------------------------------------------|
//! | `[build]`  | Minify / concatenate / include switches         |
//! | `[bundle]` | Bundle filenames                                |
//! | `[serve]`  | Development server interface and port           |

mod error;
mod section;
mod util;

pub use error::ConfigError;

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::cli::Cli;
use crate::log;
use crate::pipeline::BuildOptions;
use section::{BuildSection, BundleSection, ServeSection};
use util::{find_config_file, is_plain_filename};

/// Root configuration, mirrors `htmlforge.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForgeConfig {
    #[serde(default)]
    pub build: BuildSection,

    #[serde(default)]
    pub bundle: BundleSection,

    #[serde(default)]
    pub serve: ServeSection,
}

impl ForgeConfig {
    /// Load the config file named by `--config` (searched upward from the
    /// current directory) and apply command-line overrides.
    ///
    /// A missing config file is not an error.
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let mut config = match find_config_file(&cli.config) {
            Some(path) => Self::from_path(&path)?,
            None => Self::default(),
        };

        config.apply_cli(cli);
        config.validate()?;
        Ok(config)
    }

    /// Read a config file. Unknown fields are reported and ignored.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        let (config, ignored) = Self::parse_with_ignored(&content)
            .map_err(|err| ConfigError::Toml(path.to_path_buf(), err))?;

        if !ignored.is_empty() {
            log!("warning"; "unknown fields in {}, ignoring: {}", path.display(), ignored.join(", "));
        }
        crate::debug!("config"; "loaded {}", path.display());
        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), toml::de::Error> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    // ========================================================================
    // cli configuration updates
    // ========================================================================

    fn apply_cli(&mut self, cli: &Cli) {
        let toggles = &cli.toggles;
        Self::update_option(&mut self.build.minify_html, toggles.minify_html.as_ref());
        Self::update_option(&mut self.build.minify_js, toggles.minify_js.as_ref());
        Self::update_option(&mut self.build.minify_css, toggles.minify_css.as_ref());
        Self::update_option(&mut self.build.concat_js, toggles.concat_js.as_ref());
        Self::update_option(&mut self.build.concat_css, toggles.concat_css.as_ref());
        Self::update_option(&mut self.build.parse_includes, toggles.parse_includes.as_ref());

        Self::update_option(&mut self.bundle.js_filename, cli.concatjsfilename.as_ref());
        Self::update_option(&mut self.bundle.css_filename, cli.concatcssfilename.as_ref());
        Self::update_option(&mut self.serve.port, cli.port.as_ref());
    }

    /// Update config option if CLI value is provided.
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (field, name) in [
            ("bundle.css_filename", &self.bundle.css_filename),
            ("bundle.js_filename", &self.bundle.js_filename),
        ] {
            if !is_plain_filename(name) {
                return Err(ConfigError::Validation(format!(
                    "{field} must be a plain file name, got `{name}`"
                )));
            }
        }
        Ok(())
    }

    /// Pipeline options for one run.
    pub fn build_options(&self, overwrite: bool) -> BuildOptions {
        BuildOptions {
            minify_html: self.build.minify_html,
            minify_js: self.build.minify_js,
            minify_css: self.build.minify_css,
            concat_js: self.build.concat_js,
            concat_css: self.build.concat_css,
            parse_includes: self.build.parse_includes,
            overwrite,
            css_bundle_filename: self.bundle.css_filename.clone(),
            js_bundle_filename: self.bundle.js_filename.clone(),
        }
    }
}

#[cfg(test)]
pub fn test_parse_config(content: &str) -> ForgeConfig {
    let (parsed, ignored) = ForgeConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}
