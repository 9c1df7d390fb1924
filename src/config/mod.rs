//! Dev server configuration from `livewasm.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── build      # [build]
//! │   ├── serve      # [serve]
//! │   └── watch      # [watch]
//! ├── types/         # Utility types
//! │   ├── error      # ConfigError, ConfigDiagnostics
//! │   └── field      # FieldPath
//! └── mod.rs         # DevConfig (this file)
//! ```
//!
//! The file is optional: without it every section takes its defaults,
//! which describe a Go project compiled to `server/main.wasm`. CLI flags
//! override both.

pub mod section;
pub mod types;

pub use section::{BuildConfig, ServeConfig, WatchConfig};
pub use types::{ConfigDiagnostic, ConfigDiagnostics, ConfigError, FieldPath};

use crate::cli::{Cli, Commands, ServeArgs};
use crate::log;
use crate::utils::path::{normalize_path, resolve_under};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing livewasm.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DevConfig {
    /// Absolute path to the config file, which may not exist (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Project root: the working directory at startup (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    #[serde(default)]
    pub serve: ServeConfig,

    #[serde(default)]
    pub watch: WatchConfig,

    #[serde(default)]
    pub build: BuildConfig,
}

impl DevConfig {
    /// Load configuration for the current working directory and apply CLI
    /// overrides.
    pub fn load(cli: &Cli) -> Result<Self> {
        let root = std::env::current_dir().context("Failed to get current working directory")?;
        Self::load_from(&root, cli)
    }

    /// Load with an explicit root (the working directory in production).
    pub fn load_from(root: &Path, cli: &Cli) -> Result<Self> {
        let root = normalize_path(root);
        let config_path = resolve_under(&root, &cli.config);

        let mut config = if config_path.is_file() {
            Self::from_path(&config_path)?
        } else {
            crate::debug!("config"; "{} not found, using defaults", config_path.display());
            Self::default()
        };

        config.root = root;
        config.config_path = config_path;
        config.apply_command_options(cli);
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    pub fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    /// Unknown keys are ignored, not fatal: print them and carry on.
    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}, ignoring:", display_path);
        for field in fields {
            eprintln!("- {}", field);
        }
    }

    // ========================================================================
    // paths
    // ========================================================================

    /// Absolute path of the served directory.
    pub fn serve_dir(&self) -> PathBuf {
        resolve_under(&self.root, &self.serve.dir)
    }

    /// Absolute path of the build artifact.
    pub fn output_path(&self) -> PathBuf {
        self.root.join(&self.build.output)
    }

    // ========================================================================
    // cli configuration updates
    // ========================================================================

    /// Apply command-specific configuration options.
    fn apply_command_options(&mut self, cli: &Cli) {
        match &cli.command {
            Commands::Serve { args, .. } => self.apply_serve_args(args),
            Commands::Build { .. } => {}
        }
    }

    /// Apply serve arguments from CLI.
    pub fn apply_serve_args(&mut self, args: &ServeArgs) {
        Self::update_option(&mut self.serve.interface, args.interface.as_ref());
        Self::update_option(&mut self.serve.port, args.port.as_ref());
        Self::update_option(&mut self.serve.live_port, args.live_port.as_ref());
        Self::update_option(&mut self.serve.dir, args.dir.as_ref());
        Self::update_option(&mut self.serve.open, args.open.as_ref());
        Self::update_option(&mut self.watch.enable, args.watch.as_ref());
    }

    /// Update config option if CLI value is provided.
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Validate every section.
    ///
    /// Collects all validation errors and returns them at once; warnings
    /// are printed and do not fail.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut diag = ConfigDiagnostics::new();

        self.serve.validate(&mut diag);
        self.watch.validate(&mut diag);
        self.build.validate(&mut diag);

        diag.print_warnings();
        diag.into_result().map_err(ConfigError::Diagnostics)
    }
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse config, panicking on unknown fields (to catch config typos in tests).
#[cfg(test)]
pub fn test_parse_config(content: &str) -> DevConfig {
    let (parsed, ignored) = DevConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

// ============================================================================
// tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn make_root() -> (tempfile::TempDir, PathBuf) {
        let temp = tempfile::Builder::new().prefix("livewasm").tempdir().unwrap();
        let root = normalize_path(temp.path());
        (temp, root)
    }

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("livewasm").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_from_str_invalid_toml() {
        assert!(DevConfig::parse_with_ignored("[serve\nport = 1").is_err());
    }

    #[test]
    fn test_unknown_fields_detected() {
        let content = "[serve]\nport = 4000\nhot = true\n[unknown_section]\nfield = \"value\"";
        let (config, ignored) = DevConfig::parse_with_ignored(content).unwrap();

        assert_eq!(config.serve.port, 4000);
        assert!(ignored.iter().any(|f| f.contains("unknown_section")));
        assert!(ignored.iter().any(|f| f.contains("hot")));
    }

    #[test]
    fn test_no_unknown_fields() {
        let (_, ignored) = DevConfig::parse_with_ignored("[watch]\nwindow_ms = 250").unwrap();
        assert!(ignored.is_empty());
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let (_temp, root) = make_root();
        let config = DevConfig::load_from(&root, &cli(&["build"])).unwrap();

        assert_eq!(config.root, root);
        assert_eq!(config.config_path, root.join("livewasm.toml"));
        assert_eq!(config.serve.port, 3000);
        assert_eq!(config.output_path(), root.join("server/main.wasm"));
    }

    #[test]
    fn test_load_reads_file_and_cli_overrides() {
        let (_temp, root) = make_root();
        fs::write(
            root.join("livewasm.toml"),
            "[serve]\nport = 4000\nlive_port = 4001\ndir = \"public\"\n[watch]\nwindow_ms = 200",
        )
        .unwrap();
        fs::create_dir_all(root.join("public")).unwrap();

        let config =
            DevConfig::load_from(&root, &cli(&["serve", "-p", "5000", "--watch=false"])).unwrap();

        assert_eq!(config.serve.port, 5000);
        assert_eq!(config.serve.live_port, 4001);
        assert_eq!(config.serve_dir(), root.join("public"));
        assert_eq!(config.watch.window_ms, 200);
        assert!(!config.watch.enable);
    }

    #[test]
    fn test_load_custom_config_path() {
        let (_temp, root) = make_root();
        fs::write(root.join("dev.toml"), "[serve]\nopen = false").unwrap();

        let config = DevConfig::load_from(&root, &cli(&["-C", "dev.toml", "serve"])).unwrap();
        assert!(!config.serve.open);
    }

    #[test]
    fn test_load_collects_all_errors() {
        let (_temp, root) = make_root();
        fs::write(
            root.join("livewasm.toml"),
            "[serve]\nport = 4000\nlive_port = 4000\n[watch]\nwindow_ms = 0",
        )
        .unwrap();

        let err = DevConfig::load_from(&root, &cli(&["build"])).unwrap_err();
        match err.downcast_ref::<ConfigError>() {
            Some(ConfigError::Diagnostics(diag)) => assert_eq!(diag.len(), 2),
            other => panic!("expected diagnostics, got {other:?}"),
        }
    }

    #[test]
    fn test_cli_override_can_fix_port_clash() {
        let (_temp, root) = make_root();
        fs::write(root.join("livewasm.toml"), "[serve]\nport = 4000\nlive_port = 4000").unwrap();

        let config = DevConfig::load_from(&root, &cli(&["serve", "-l", "4001"])).unwrap();
        assert_eq!(config.serve.live_port, 4001);
    }
}
