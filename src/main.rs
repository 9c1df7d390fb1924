//! livewasm - a live-reloading dev server for Go WebAssembly apps.

mod actor;
mod cli;
mod config;
mod core;
mod logger;
mod reload;
mod utils;

use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::DevConfig;

fn main() {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose());

    if let Err(e) = run(&cli) {
        log!("error"; "{:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let config = DevConfig::load(cli)?;

    match &cli.command {
        Commands::Serve { .. } => cli::serve::serve(&config),
        Commands::Build { .. } => cli::build::build(&config),
    }
}
