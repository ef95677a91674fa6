//! Configuration loading and validation for the healthcheck runner

use common::{LogFormat, LogOptions};
use healthcheck::{NetworkCheck, ServiceCheck};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use validator::{Validate, ValidationError};

/// Environment variable naming an explicit configuration file
pub const CONFIG_ENV: &str = "HEALTHCHECK_RUNNER_CONFIG";

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(#[from] validator::ValidationErrors),
}

/// Main configuration structure
///
/// Check entries are kept as written; their required fields are checked when
/// the run resolves them.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub alerts: AlertSettings,

    #[serde(default)]
    pub services: Vec<ServiceCheck>,

    #[serde(default)]
    pub network_checks: Vec<NetworkCheck>,

    #[serde(default)]
    pub logging: LoggingSettings,
}

impl Validate for Config {
    fn validate(&self) -> Result<(), validator::ValidationErrors> {
        self.logging.validate()?;
        Ok(())
    }
}

/// Alert delivery settings
///
/// The webhook is deliberately not validated here: a bad webhook only
/// affects alert delivery, which must never fail the run.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AlertSettings {
    pub slack_webhook: Option<String>,
}

/// Logging settings
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoggingSettings {
    #[validate(custom = "validate_level")]
    pub level: Option<String>,

    #[validate(custom = "validate_format")]
    pub format: Option<String>,

    #[validate(length(min = 1))]
    pub file: Option<String>,

    #[serde(default = "default_console")]
    pub console: bool,
}

fn default_console() -> bool {
    true
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: None,
            format: None,
            file: None,
            console: default_console(),
        }
    }
}

// Custom validators

fn validate_level(level: &str) -> Result<(), ValidationError> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" | "off" => Ok(()),
        _ => Err(ValidationError::new("log_level_unknown")),
    }
}

fn validate_format(format: &str) -> Result<(), ValidationError> {
    format
        .parse::<LogFormat>()
        .map(|_| ())
        .map_err(|_| ValidationError::new("log_format_unknown"))
}

// Configuration loading implementation

impl Config {
    /// Find the configuration file to load.
    ///
    /// `HEALTHCHECK_RUNNER_CONFIG` wins when set, whether or not the file
    /// exists; otherwise the first existing file among the standard locations.
    pub fn locate() -> Option<PathBuf> {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Some(PathBuf::from(path));
        }
        Self::find_config_file()
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Parse and validate configuration from YAML text.
    ///
    /// An empty document yields the defaults.
    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Config = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Find configuration file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let mut paths = vec![PathBuf::from("/etc/healthcheck-runner/config.yaml")];

        if let Some(home_path) = Self::home_config_path() {
            paths.push(home_path);
        }

        paths.push(PathBuf::from("./config.yaml"));

        paths.into_iter().find(|p: &PathBuf| p.is_file())
    }

    /// Get home directory config path
    fn home_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".config/healthcheck-runner/config.yaml"))
    }

    /// Convert logging settings to the options the log handle is built from
    pub fn to_log_options(&self) -> LogOptions {
        let defaults = LogOptions::default();
        LogOptions {
            level: self.logging.level.clone().unwrap_or(defaults.level),
            format: self
                .logging
                .format
                .as_deref()
                .and_then(|f| f.parse().ok())
                .unwrap_or(defaults.format),
            file: self
                .logging
                .file
                .as_ref()
                .map(PathBuf::from)
                .or(defaults.file),
            console: self.logging.console,
        }
    }
}
