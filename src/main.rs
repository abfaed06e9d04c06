//! htmlcomb - combine HTML, CSS and JS files into one page, or serve them locally.

mod cli;
mod combine;
mod config;
mod core;
mod embed;
mod logger;
mod registry;
mod server;
mod source;
mod utils;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::AppConfig;

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

    let config = AppConfig::load(&cli)?;

    match &cli.command {
        Commands::Serve { files, kinds, .. } => cli::serve::run_serve(files, kinds, &config),
        Commands::Combine { files, kinds, .. } => {
            cli::combine::run_combine(files, kinds, &config.combine)
        }
        Commands::List {
            files,
            kinds,
            pretty,
        } => cli::list::run_list(files, kinds, *pretty),
    }
}
