//! Configuration error types.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error when reading `{}`", .0.display())]
    Io(PathBuf, #[source] std::io::Error),

    #[error("config file parsing error in `{}`", .0.display())]
    Toml(PathBuf, #[source] toml::de::Error),

    #[error("config validation error: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};

    #[test]
    fn test_config_error_display() {
        let io_err = ConfigError::Io(
            PathBuf::from("htmlforge.toml"),
            Error::new(ErrorKind::NotFound, "file not found"),
        );
        let display = io_err.to_string();
        assert!(display.contains("IO error"));
        assert!(display.contains("htmlforge.toml"));

        let validation = ConfigError::Validation("bundle.css_filename is empty".into());
        assert!(validation.to_string().contains("bundle.css_filename is empty"));
    }
}
