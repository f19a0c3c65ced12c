//! Command-line interface module.

mod args;
pub mod build;
mod prompt;
pub mod serve;

pub use args::Cli;
