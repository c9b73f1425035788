//! sidecar - serves documentation sidecar assets and rasterizes diagrams.

mod asset;
mod cli;
mod config;
mod content;
mod core;
mod embed;
mod logger;
mod render;
mod serve;
mod utils;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::SiteConfig;

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    core::setup_shutdown_handler()?;

    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    let config = SiteConfig::load(&cli)?;

    match &cli.command {
        Commands::Serve { .. } => cli::serve::serve_site(config),
        Commands::Params { args } => cli::params::run_params(args, &config),
        Commands::Tree { raw, pretty } => cli::tree::run_tree(*raw, *pretty, &config),
        Commands::Render { args } => cli::render::run_render(args, &config),
    }
}
