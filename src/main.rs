//! htmlforge - a build pipeline for hand-written static sites.

mod asset;
mod cli;
mod config;
mod core;
mod logger;
mod pipeline;
mod utils;

use clap::ColorChoice;
use cli::Cli;
use config::ForgeConfig;
use pipeline::{BuildError, ExitState};

fn main() {
    let state = match run() {
        Ok(()) => ExitState::Success,
        Err(e) => {
            log!("error"; "{:#}", e);
            e.downcast_ref::<BuildError>()
                .map_or_else(|| ExitState::Failed(e.to_string()), ExitState::from)
        }
    };
    std::process::exit(state.code());
}

fn run() -> anyhow::Result<()> {
    // before anything can block
    core::setup_shutdown_handler()?;

    let cli = Cli::parse_env();

    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {}
    }
    logger::set_verbose(cli.verbose);

    let config = ForgeConfig::load(&cli)?;
    cli::build::run(&cli, &config)
}
