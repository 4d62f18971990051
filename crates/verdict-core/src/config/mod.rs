//! Configuration management for Verdict.
//!
//! Configuration is loaded from multiple sources with the following priority:
//! 1. Environment variables (highest priority)
//! 2. Project-local `verdict.toml` file
//! 3. User config `~/.config/verdict/config.toml`
//! 4. Built-in defaults (lowest priority)

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

mod defaults;

pub use defaults::*;

use crate::runner::Filter;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Which suites and tests to run.
    pub run: RunConfig,

    /// Log output configuration.
    pub logging: LoggingConfig,

    /// Renderer selection.
    pub render: RenderConfig,
}

impl Config {
    /// Load configuration from default locations.
    ///
    /// Searches for config in order:
    /// 1. `./verdict.toml` (project local)
    /// 2. `~/.config/verdict/config.toml` (user config)
    /// 3. Falls back to defaults
    pub fn load() -> Result<Self, ConfigError> {
        // Try project-local config first
        if Path::new(CONFIG_FILE_NAME).exists() {
            return Self::from_file(CONFIG_FILE_NAME);
        }

        // Try user config
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join(CONFIG_DIR_NAME).join(USER_CONFIG_FILE_NAME);
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        // Use defaults
        let mut config = Self::default();
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;

        // Apply environment variable overrides
        config.apply_env_overrides();

        Ok(config)
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(suites) = var(ENV_SUITES) {
            self.run.suites = suites
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(filter) = var(ENV_FILTER) {
            self.run.filter = Some(filter).filter(|f| !f.is_empty());
        }
        if let Some(level) = var(ENV_LOG) {
            self.logging.level = level;
        }
    }

    /// Builds the suite and test filter.
    pub fn filter(&self) -> Result<Filter, ConfigError> {
        let filter = Filter::all().with_suites(self.run.suites.iter().cloned());
        match &self.run.filter {
            Some(pattern) => filter
                .with_pattern(pattern)
                .map_err(|e| ConfigError::Invalid(format!("run.filter: {e}"))),
            None => Ok(filter),
        }
    }

    /// Create a default config file content as a string.
    pub fn default_config_string() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

/// Run selection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Suites to run; empty runs all of them.
    pub suites: Vec<String>,

    /// Regex matched against `<case>::<test>`.
    pub filter: Option<String>,
}

/// Log output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Level or `tracing` filter directive, e.g. "info" or "verdict_core=debug".
    pub level: String,

    /// Colored output.
    pub ansi: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            ansi: DEFAULT_LOG_ANSI,
        }
    }
}

/// Available renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RendererKind {
    /// Structured `tracing` events.
    Log,
    /// No renderer.
    None,
}

/// Renderer selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub renderer: RendererKind,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            renderer: DEFAULT_RENDERER,
        }
    }
}
