//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::display::{ElementIds, FailurePolicy};
use crate::telemetry::BackendConfig;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendSettings,

    #[serde(default)]
    pub poller: PollerSettings,

    #[serde(default)]
    pub display: ElementIds,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Detection backend connection settings
#[derive(Debug, Clone, Deserialize)]
pub struct BackendSettings {
    #[serde(default = "default_backend_url")]
    pub url: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,
}

fn default_backend_url() -> String {
    "http://127.0.0.1:5001".to_string()
}

fn default_request_timeout() -> u64 {
    5000
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            url: default_backend_url(),
            request_timeout_ms: default_request_timeout(),
        }
    }
}

impl BackendSettings {
    pub fn client_config(&self) -> BackendConfig {
        BackendConfig {
            base_url: self.url.clone(),
            request_timeout_ms: self.request_timeout_ms,
        }
    }
}

/// Live-data polling settings
#[derive(Debug, Clone, Deserialize)]
pub struct PollerSettings {
    #[serde(default = "default_poll_interval")]
    pub interval_ms: u64,

    #[serde(default)]
    pub failure_policy: FailurePolicy,
}

fn default_poll_interval() -> u64 {
    5000 // 5 seconds
}

impl Default for PollerSettings {
    fn default() -> Self {
        Self {
            interval_ms: default_poll_interval(),
            failure_policy: FailurePolicy::default(),
        }
    }
}

impl PollerSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::parse(&content).map_err(|error| ConfigError::Parse {
            path: path.to_path_buf(),
            error,
        })
    }

    fn parse(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        for warning in config.apply_overrides(|key| std::env::var(key).ok()) {
            tracing::warn!("{}", warning);
        }
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let loaded = Self::discover_at(path)?;
        loaded.report();
        Ok(loaded.config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let loaded = Self::discover();
        loaded.report();
        loaded.config
    }

    /// Load a file with environment overrides without logging anything, so the
    /// caller can report warnings once logging is set up
    pub fn discover_at(path: &Path) -> Result<LoadedConfig, ConfigError> {
        let mut config = Self::load(path)?;
        let warnings = config.apply_overrides(|key| std::env::var(key).ok());
        Ok(LoadedConfig {
            config,
            source: Some(path.to_path_buf()),
            warnings,
        })
    }

    /// Search the default locations without logging anything
    pub fn discover() -> LoadedConfig {
        let config_paths: Vec<PathBuf> = [
            dirs::config_dir().map(|p| p.join("safesite").join("config.toml")),
            Some(PathBuf::from("/etc/safesite/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ]
        .into_iter()
        .flatten()
        .collect();

        Self::discover_from(&config_paths, |key| std::env::var(key).ok())
    }

    fn discover_from<F>(paths: &[PathBuf], var: F) -> LoadedConfig
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut warnings = Vec::new();
        let mut source = None;
        let mut config = Config::default();

        for path in paths.iter().filter(|p| p.exists()) {
            match Self::load(path) {
                Ok(loaded) => {
                    config = loaded;
                    source = Some(path.clone());
                    break;
                }
                Err(error) => warnings.push(ConfigWarning::Unreadable {
                    path: path.clone(),
                    error,
                }),
            }
        }

        warnings.extend(config.apply_overrides(var));
        LoadedConfig {
            config,
            source,
            warnings,
        }
    }

    /// Apply overrides from a variable source (the process environment in
    /// production)
    fn apply_overrides<F>(&mut self, var: F) -> Vec<ConfigWarning>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut warnings = Vec::new();

        if let Some(url) = var("SAFESITE_BACKEND_URL") {
            self.backend.url = url;
        }
        if let Some(interval) = var("SAFESITE_POLL_INTERVAL_MS") {
            match interval.parse() {
                Ok(ms) => self.poller.interval_ms = ms,
                Err(_) => warnings.push(ConfigWarning::InvalidOverride {
                    var: "SAFESITE_POLL_INTERVAL_MS",
                    value: interval,
                }),
            }
        }
        if let Some(level) = var("SAFESITE_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = var("SAFESITE_LOG_FORMAT") {
            self.logging.format = format;
        }

        warnings
    }
}

/// Configuration together with where it came from and any problems met while
/// loading it
#[derive(Debug)]
pub struct LoadedConfig {
    pub config: Config,
    /// File the config was read from; `None` means defaults
    pub source: Option<PathBuf>,
    pub warnings: Vec<ConfigWarning>,
}

impl LoadedConfig {
    /// Log the source and every warning
    pub fn report(&self) {
        match &self.source {
            Some(path) => tracing::info!("Loaded config from {:?}", path),
            None => tracing::info!("Using default config with environment overrides"),
        }
        for warning in &self.warnings {
            tracing::warn!("{}", warning);
        }
    }
}

/// Non-fatal problems found while loading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigWarning {
    #[error("Skipped config file: {error}")]
    Unreadable { path: PathBuf, error: ConfigError },

    #[error("Ignoring invalid {var}={value:?}")]
    InvalidOverride { var: &'static str, value: String },
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# SafeSite Configuration
#
# Environment variables override these settings:
# - SAFESITE_BACKEND_URL
# - SAFESITE_POLL_INTERVAL_MS
# - SAFESITE_LOG_LEVEL
# - SAFESITE_LOG_FORMAT

[backend]
# Detection backend base URL
url = "http://127.0.0.1:5001"

# Request timeout in milliseconds
request_timeout_ms = 5000

[poller]
# How often to fetch live data (ms)
interval_ms = 5000

# What to show in the gas and helmet readouts after a failed poll:
# "keep_last" leaves the previous values, "clear" blanks them
failure_policy = "keep_last"

[display]
# Element identifiers for each readout
temperature = "temperature"
gas_level = "gas"
helmet_violations = "helmet"
detection_status = "ai-status"

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}
