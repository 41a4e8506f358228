//! Configuration module for PayFlow.
//!
//! Provides typed configuration structs that map to the YAML configuration file,
//! with loading, validation, defaults, and a builder pattern for programmatic use.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Environment variable overriding `api.base_url`.
pub const BASE_URL_ENV: &str = "PAYFLOW_API_BASE_URL";

/// Base URL used when neither the environment nor the config file sets one.
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000/api";

/// Storage key of the cached debt list.
pub const DEFAULT_CACHE_KEY: &str = "payflow:debts-cache";

/// Storage key of the pending-mutation queue.
pub const DEFAULT_QUEUE_KEY: &str = "payflow:pending-mutations";

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for PayFlow.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub storage: StorageConfig,
    pub connectivity: ConnectivityConfig,
    pub logging: LoggingConfig,
}

/// REST API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the backend, e.g. `http://localhost:5000/api`.
    pub base_url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

/// Local persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite database holding the cache snapshot and the mutation queue.
    pub db_path: PathBuf,
    /// Key of the cached debt list.
    pub cache_key: String,
    /// Key of the pending-mutation queue.
    pub queue_key: String,
}

/// Reachability probe settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectivityConfig {
    /// Seconds between reachability probes while watching.
    pub probe_interval_secs: u64,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/payflow/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("payflow")
            .join("config.yaml")
    }

    /// Base URL after applying the `PAYFLOW_API_BASE_URL` override.
    pub fn effective_base_url(&self) -> String {
        resolve_base_url(std::env::var(BASE_URL_ENV).ok().as_deref(), &self.api.base_url)
    }
}

/// Picks the API base URL: a non-blank override wins over the configured
/// value, which wins over [`DEFAULT_BASE_URL`]. One trailing `/` is trimmed.
pub fn resolve_base_url(env_override: Option<&str>, configured: &str) -> String {
    let chosen = env_override
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .or_else(|| Some(configured.trim()).filter(|s| !s.is_empty()))
        .unwrap_or(DEFAULT_BASE_URL);
    chosen.strip_suffix('/').unwrap_or(chosen).to_string()
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 15,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("~/.local/share"))
                .join("payflow")
                .join("payflow.db"),
            cache_key: DEFAULT_CACHE_KEY.to_string(),
            queue_key: DEFAULT_QUEUE_KEY.to_string(),
        }
    }
}

impl Default for ConnectivityConfig {
    fn default() -> Self {
        Self {
            probe_interval_secs: 10,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"api.timeout_secs"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        // --- api ---
        let base = self.api.base_url.trim();
        if !base.is_empty() && !(base.starts_with("http://") || base.starts_with("https://")) {
            errors.push(ValidationError {
                field: "api.base_url".into(),
                message: format!("must start with http:// or https://, got '{}'", base),
            });
        }
        if self.api.timeout_secs == 0 {
            errors.push(ValidationError {
                field: "api.timeout_secs".into(),
                message: "must be greater than 0".into(),
            });
        }

        // --- storage ---
        if self.storage.cache_key.trim().is_empty() {
            errors.push(ValidationError {
                field: "storage.cache_key".into(),
                message: "must not be empty".into(),
            });
        }
        if self.storage.queue_key.trim().is_empty() {
            errors.push(ValidationError {
                field: "storage.queue_key".into(),
                message: "must not be empty".into(),
            });
        }
        if self.storage.cache_key == self.storage.queue_key {
            errors.push(ValidationError {
                field: "storage.queue_key".into(),
                message: "must differ from storage.cache_key".into(),
            });
        }

        // --- connectivity ---
        if self.connectivity.probe_interval_secs == 0 {
            errors.push(ValidationError {
                field: "connectivity.probe_interval_secs".into(),
                message: "must be greater than 0".into(),
            });
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError {
                field: "logging.level".into(),
                message: format!(
                    "invalid level '{}'; valid options: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        errors
    }
}
