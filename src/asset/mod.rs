//! Stylesheet and script processing.

mod bundle;
mod kind;
pub mod minify;
mod process;

// Types
pub use bundle::BundleStore;
pub use kind::AssetKind;

// Processing (side effects)
pub use process::{Rewrite, process_asset};
