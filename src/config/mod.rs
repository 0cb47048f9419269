//! Configuration management for `warmswap.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── app        # [app]
//! │   ├── serve      # [serve]
//! │   └── watch      # [watch]
//! ├── types/         # Utility types
//! │   ├── error      # ConfigError, ConfigDiagnostics
//! │   └── handle     # Global config handle
//! └── mod.rs         # Config (this file)
//! ```
//!
//! A missing config file is not an error: every section has defaults and
//! the CLI can supply the rest.

pub mod section;
pub mod types;
mod util;

use util::find_config_file;

pub use section::{AppConfig, ServeConfig, WatchConfig};
pub use types::{ConfigDiagnostics, ConfigError, cfg, init_config};

use crate::cli::{Cli, Commands};
use crate::{debug, log};
use crate::utils::path::normalize_path;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing `warmswap.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Absolute path to the config file (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Compiled-output watching
    #[serde(default)]
    pub watch: WatchConfig,

    /// Development server settings
    #[serde(default)]
    pub serve: ServeConfig,

    /// Application settings
    #[serde(default)]
    pub app: AppConfig,
}

impl Config {
    /// Load configuration for the parsed command line.
    ///
    /// Searches upward from cwd for the config file. The project root is the
    /// config file's directory, or cwd when no file exists.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;

        let mut config = match find_config_file(&cwd, &cli.config) {
            Some(path) => {
                let mut config = Self::from_path(&path)?;
                config.config_path = normalize_path(&path);
                config
            }
            None => {
                debug!("config"; "{} not found, using defaults", cli.config.display());
                Self::default()
            }
        };

        let root = config
            .config_path
            .parent()
            .map_or_else(|| cwd.clone(), Path::to_path_buf);
        config.apply_command_options(cli);
        config.normalize_paths(&root);

        if matches!(cli.command, Commands::Serve { .. }) {
            config.validate()?;
        }

        Ok(config)
    }

    /// Load configuration from file path, warning about unknown fields.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            let display_path = path
                .file_name()
                .map_or_else(|| path.to_string_lossy(), |n| n.to_string_lossy());
            log!("config"; "unknown fields in {} ignored: {}", display_path, ignored.join(", "));
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>)> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })
        .map_err(ConfigError::from)?;
        Ok((config, ignored))
    }

    // ========================================================================
    // CLI overrides
    // ========================================================================

    fn apply_command_options(&mut self, cli: &Cli) {
        if let Commands::Serve {
            interface,
            port,
            watch,
            root,
            unit,
        } = &cli.command
        {
            Self::update_option(&mut self.serve.interface, interface.as_ref());
            Self::update_option(&mut self.serve.port, port.as_ref());
            Self::update_option(&mut self.serve.watch, watch.as_ref());
            Self::update_option(&mut self.watch.root, root.as_ref());
            Self::update_option(&mut self.app.root_unit, unit.as_ref());
        }
    }

    /// Update config option if CLI value is provided.
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Resolve relative paths against the project root.
    fn normalize_paths(&mut self, root: &Path) {
        self.watch.root = normalize_path(&normalize_path(root).join(&self.watch.root));
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Validate the settings `serve` depends on, reporting all errors at once.
    pub fn validate(&self) -> Result<()> {
        let mut diag = ConfigDiagnostics::new();
        self.watch.validate(&mut diag);
        self.app.validate(&mut diag);

        diag.into_result()
            .map_err(|e| ConfigError::Diagnostics(e).into())
    }
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse config, panicking on unknown fields (to catch config typos in tests).
#[cfg(test)]
pub fn test_parse_config(content: &str) -> Config {
    let (parsed, ignored) = Config::parse_with_ignored(content).unwrap();
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
    use tempfile::TempDir;

    #[test]
    fn test_invalid_toml_rejected() {
        assert!(Config::parse_with_ignored("[watch\nroot = \"x\"").is_err());
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.config_path, PathBuf::new());
        assert_eq!(config.serve.port, 5280);
        assert!(config.app.root_unit.is_empty());
    }

    #[test]
    fn test_unknown_fields_detected() {
        let content = "[app]\nroot_unit = \"a.B\"\n[unknown_section]\nfield = \"value\"";
        let (config, ignored) = Config::parse_with_ignored(content).unwrap();

        assert_eq!(config.app.root_unit, "a.B");
        assert!(ignored.iter().any(|f| f.contains("unknown_section")));
    }

    #[test]
    fn test_cli_overrides_and_paths() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("out")).unwrap();

        let cli = Cli::parse_from(["warmswap", "serve", "-p", "7000", "-r", "out", "-u", "a.B"]);
        let mut config = test_parse_config("[serve]\nport = 6000");
        config.apply_command_options(&cli);
        config.normalize_paths(dir.path());

        assert_eq!(config.serve.port, 7000);
        assert_eq!(config.app.root_unit, "a.B");
        assert_eq!(config.watch.root, normalize_path(&dir.path().join("out")));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_reports_all_errors() {
        let dir = TempDir::new().unwrap();
        let mut config = test_parse_config("[watch]\nroot = \"missing\"\nstop_poll_ms = 0");
        config.normalize_paths(dir.path());

        let err = config.validate().unwrap_err();
        let Some(ConfigError::Diagnostics(diag)) = err.downcast_ref::<ConfigError>() else {
            panic!("expected diagnostics, got {err}");
        };
        // missing root dir, zero poll interval, unset root unit
        assert_eq!(diag.len(), 3);
    }
}
