//! Configuration management for `htmlcomb.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── combine    # [combine]
//! │   └── serve      # [serve]
//! ├── error          # ConfigError
//! └── mod.rs         # AppConfig (this file)
//! ```
//!
//! The config file is optional. Without `-C`, `htmlcomb.toml` in the working
//! directory is used when present; CLI flags override file values.

mod error;
pub mod section;

pub use error::ConfigError;
pub use section::{CombineConfig, ServeConfig};

use crate::{
    cli::{Cli, Commands},
    log,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "htmlcomb.toml";

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing htmlcomb.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path of the loaded config file, if any (internal use only)
    #[serde(skip)]
    pub config_path: Option<PathBuf>,

    /// Local server settings
    #[serde(default)]
    pub serve: ServeConfig,

    /// Combine defaults
    #[serde(default)]
    pub combine: CombineConfig,
}

impl AppConfig {
    /// Load configuration and apply CLI overrides.
    pub fn load(cli: &Cli) -> Result<Self> {
        let mut config = match Self::resolve_config_path(cli)? {
            Some(path) => {
                let mut config = Self::from_path(&path)?;
                config.config_path = Some(path);
                config
            }
            None => Self::default(),
        };

        config.apply_command_options(cli);
        Ok(config)
    }

    /// Explicit `-C` paths must exist; the default file is optional.
    fn resolve_config_path(cli: &Cli) -> Result<Option<PathBuf>> {
        if let Some(path) = &cli.config {
            if !path.is_file() {
                return Err(ConfigError::NotFound(path.clone()).into());
            }
            return Ok(Some(path.clone()));
        }

        let cwd = std::env::current_dir().context("Failed to get current working directory")?;
        let path = cwd.join(DEFAULT_CONFIG_FILE);
        Ok(path.is_file().then_some(path))
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)
            .map_err(|err| ConfigError::Toml(path.to_path_buf(), err))?;

        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), toml::de::Error> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    /// Print warning about unknown fields.
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
    // cli configuration updates
    // ========================================================================

    /// Apply command-specific configuration options.
    fn apply_command_options(&mut self, cli: &Cli) {
        crate::logger::set_verbose(cli.verbose);

        match &cli.command {
            Commands::Serve {
                interface, port, ..
            } => {
                Self::update_option(&mut self.serve.interface, interface.as_ref());
                Self::update_option(&mut self.serve.port, port.as_ref());
            }
            Commands::Combine {
                title,
                mode,
                minify,
                output,
                ..
            } => {
                Self::update_option(&mut self.combine.title, title.as_ref());
                Self::update_option(&mut self.combine.mode, mode.as_ref());
                Self::update_option(&mut self.combine.minify, minify.as_ref());
                Self::update_option(&mut self.combine.output, output.as_ref());
            }
            Commands::List { .. } => {}
        }
    }

    /// Update config option if CLI value is provided.
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse config, panicking on unknown fields (to catch config typos in tests).
#[cfg(test)]
pub fn test_parse_config(content: &str) -> AppConfig {
    let (parsed, ignored) = AppConfig::parse_with_ignored(content).unwrap();
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
