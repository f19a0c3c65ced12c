//! Configuration utility functions.

use std::path::{Path, PathBuf};

/// Find the config file by searching upward from the current directory.
///
/// ```text
/// /home/user/site/pages/        ← cwd
/// /home/user/htmlforge.toml     ← found
/// ```
pub fn find_config_file(config_name: &Path) -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    find_config_from(&cwd, config_name)
}

/// Upward search starting at `start`. An absolute `config_name` is only
/// checked as-is.
pub fn find_config_from(start: &Path, config_name: &Path) -> Option<PathBuf> {
    if config_name.is_absolute() {
        return config_name.is_file().then(|| config_name.to_path_buf());
    }

    start
        .ancestors()
        .map(|dir| dir.join(config_name))
        .find(|candidate| candidate.is_file())
}

/// A bundle filename must be a plain file name.
pub fn is_plain_filename(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\'])
}
