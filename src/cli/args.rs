//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::net::IpAddr;
use std::path::PathBuf;

/// Live-reloading dev server for WebAssembly builds
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path, relative to the working directory (optional file)
    #[arg(short = 'C', long, global = true, default_value = "livewasm.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Build, serve the output directory and reload browsers on change
    #[command(visible_alias = "s")]
    Serve {
        #[command(flatten)]
        build_args: BuildArgs,

        #[command(flatten)]
        args: ServeArgs,
    },

    /// Build once and exit
    #[command(visible_alias = "b")]
    Build {
        #[command(flatten)]
        build_args: BuildArgs,
    },
}

/// Shared arguments for Build and Serve commands
#[derive(clap::Args, Debug, Clone, Default)]
pub struct BuildArgs {
    /// Enable verbose output for debugging
    #[arg(short = 'V', long)]
    pub verbose: bool,
}

/// `serve` overrides for the `[serve]` and `[watch]` sections.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ServeArgs {
    /// Network interface to bind (e.g., 127.0.0.1, 0.0.0.0)
    #[arg(short, long)]
    pub interface: Option<IpAddr>,

    /// HTTP port for the output directory
    #[arg(short, long)]
    pub port: Option<u16>,

    /// WebSocket port for live reload
    #[arg(short = 'l', long = "live-port")]
    pub live_port: Option<u16>,

    /// Directory to serve (relative to the working directory)
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub dir: Option<PathBuf>,

    /// Open the browser once the server is up
    #[arg(long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub open: Option<bool>,

    /// Rebuild and reload on source changes
    #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub watch: Option<bool>,
}

impl Cli {
    #[cfg(test)]
    pub const fn is_serve(&self) -> bool {
        matches!(self.command, Commands::Serve { .. })
    }

    pub const fn verbose(&self) -> bool {
        match &self.command {
            Commands::Serve { build_args, .. } | Commands::Build { build_args } => {
                build_args.verbose
            }
        }
    }
}
