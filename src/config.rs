//! Configuration System
//!
//! Layered configuration: built-in defaults, the user's global config file,
//! an explicit config file and `TREESYNC__SECTION__KEY` environment variables,
//! in increasing order of precedence.

use crate::error::ApiError;
use crate::logging::LoggingConfig;
use crate::snapshot::SnapshotOptions;
use crate::watch::WatchConfig;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// How directories are enumerated and hashed
    #[serde(default)]
    pub snapshot: SnapshotOptions,

    /// Watch mode settings
    #[serde(default)]
    pub watch: WatchConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Configuration validation errors
#[derive(Debug, Clone)]
pub enum ValidationError {
    Snapshot(String),
    Watch(String),
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Snapshot(msg) => write!(f, "Snapshot: {}", msg),
            ValidationError::Watch(msg) => write!(f, "Watch: {}", msg),
            ValidationError::Logging(msg) => write!(f, "Logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl SyncConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.snapshot.max_symlink_depth == 0 {
            errors.push(ValidationError::Snapshot(
                "max_symlink_depth must be at least 1".to_string(),
            ));
        }

        if self.watch.debounce_ms == 0 {
            errors.push(ValidationError::Watch(
                "debounce_ms must be greater than 0".to_string(),
            ));
        }

        if let Err(e) = self.logging.validate() {
            errors.push(ValidationError::Logging(e));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Render the configuration as TOML
    pub fn to_toml(&self) -> Result<String, ApiError> {
        toml::to_string_pretty(self)
            .map_err(|e| ApiError::ConfigError(format!("Failed to render config: {}", e)))
    }
}

/// Loads [`SyncConfig`] from its layered sources
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load defaults, the global config file, `explicit` (if any) and the environment
    pub fn load(explicit: Option<&Path>) -> Result<SyncConfig, ApiError> {
        let mut builder = builder_with_defaults()?;

        if let Some(global) = global_config_path() {
            if global.exists() {
                debug!(config_path = %global.display(), "Using global configuration file");
                builder = builder.add_source(File::from(global.as_path()).required(false));
            }
        }

        if let Some(path) = explicit {
            builder = builder.add_source(File::from(path).required(true));
        }

        Self::finish(builder.add_source(environment()))
    }

    /// Load defaults and a single config file, ignoring the global file and environment
    pub fn load_from_file(path: &Path) -> Result<SyncConfig, ApiError> {
        let builder = builder_with_defaults()?.add_source(File::from(path).required(true));
        Self::finish(builder)
    }

    fn finish(builder: ConfigBuilder<DefaultState>) -> Result<SyncConfig, ApiError> {
        let config: SyncConfig = builder.build()?.try_deserialize()?;

        config.validate().map_err(|errors| {
            let error_msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            ApiError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                error_msgs.join("\n")
            ))
        })?;

        Ok(config)
    }
}

/// Path to the global config file: `$XDG_CONFIG_HOME/treesync/config.toml` on Linux
pub fn global_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "treesync")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("snapshot.symlinks", "follow")?
        .set_default("snapshot.leaf_order", "name")?
        .set_default("logging.level", "info")
}

fn environment() -> Environment {
    Environment::with_prefix("TREESYNC")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}
