//! Path and URL utilities.
//!
//! Pure functions for path manipulation. No side effects.
//!
//! - [`fs`]: Filesystem path normalization (`normalize_path`, `clean_path`, `resolve_reference`)
//! - [`route`]: URL utilities (`is_external_link`, `root_url`)

pub mod fs;
pub mod route;

pub use fs::{clean_path, expand_path, normalize_path, resolve_reference};
pub use route::{is_external_link, root_url};
