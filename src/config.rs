//! Configuration management for Sitekeeper
//!
//! This module handles loading, parsing, and validation of configuration files.

use crate::constants::{
    APP_DIR_NAME, CONFIG_GENERATED, DEFAULT_API_KEY_ENV, DEFAULT_POLL_INTERVAL_SECS, DEFAULT_PROBE_TIMEOUT_SECS,
    DEFAULT_REQUEST_TIMEOUT_SECS, FIRESTORE_DEFAULT_DATABASE, MAX_POLL_INTERVAL_SECS,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Supported remote store types
pub const STORE_TYPES: [&str; 3] = ["firestore", "rest", "memory"];

/// Accepted log levels
pub const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub remote: RemoteConfig,
    pub cache: CacheConfig,
    pub connectivity: ConnectivityConfig,
    pub logging: LoggingConfig,
}

/// Remote store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Store type: "firestore", "rest" or "memory"
    pub store_type: String,
    /// Firestore project id
    pub project_id: String,
    /// Firestore database id
    pub database: String,
    /// Environment variable holding the API key (optional for open rules)
    pub api_key_env: String,
    /// REST API root, or a Firestore endpoint/emulator override; empty means
    /// the public Firestore endpoint
    pub base_url: String,
    /// HTTP timeout for a single remote call, in seconds
    pub request_timeout_secs: u64,
}

/// Local cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// SeaORM database URL of the key-value cache
    pub database_url: String,
}

/// Connectivity probe configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectivityConfig {
    /// Delay between two reachability probes, in seconds
    pub poll_interval_secs: u64,
    /// Deadline of one probe, in seconds
    pub probe_timeout_secs: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Write logs to a file
    pub enabled: bool,
    /// Minimum level: error, warn, info, debug or trace
    pub level: String,
    /// Log file path; empty means `<data dir>/sitekeeper/sitekeeper.log`
    pub file: String,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            store_type: "firestore".to_string(),
            project_id: String::new(),
            database: FIRESTORE_DEFAULT_DATABASE.to_string(),
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            base_url: String::new(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        let database_url = dirs::data_dir()
            .map(|dir| {
                format!(
                    "sqlite://{}?mode=rwc",
                    dir.join(APP_DIR_NAME).join("cache.db").display()
                )
            })
            .unwrap_or_else(|| "sqlite://sitekeeper-cache.db?mode=rwc".to_string());
        Self { database_url }
    }
}

impl Default for ConnectivityConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            probe_timeout_secs: DEFAULT_PROBE_TIMEOUT_SECS,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            level: "info".to_string(),
            file: String::new(),
        }
    }
}

impl RemoteConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// API key read from the configured environment variable, if set.
    pub fn api_key(&self) -> Option<String> {
        if self.api_key_env.is_empty() {
            return None;
        }
        std::env::var(&self.api_key_env).ok().filter(|key| !key.is_empty())
    }
}

impl ConnectivityConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }
}

impl Config {
    /// Load configuration from file or return defaults
    pub fn load() -> Result<Self> {
        let config_path = Self::find_config_file()?;

        if let Some(path) = config_path {
            Self::load_from_file(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Find configuration file in order of precedence
    fn find_config_file() -> Result<Option<PathBuf>> {
        // 1. Check current directory
        let current_dir_config = PathBuf::from("sitekeeper.toml");
        if current_dir_config.exists() {
            return Ok(Some(current_dir_config));
        }

        // 2. Check XDG config directory
        if let Some(config_dir) = dirs::config_dir() {
            let xdg_config = config_dir.join(APP_DIR_NAME).join("config.toml");
            if xdg_config.exists() {
                return Ok(Some(xdg_config));
            }
        }

        Ok(None)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        self.validate_remote()?;

        if self.cache.database_url.is_empty() {
            anyhow::bail!("cache.database_url cannot be empty");
        }

        // Validate connectivity timings
        let connectivity = &self.connectivity;
        if connectivity.poll_interval_secs == 0 || connectivity.poll_interval_secs > MAX_POLL_INTERVAL_SECS {
            anyhow::bail!(
                "poll_interval_secs must be between 1 and {}, got {}",
                MAX_POLL_INTERVAL_SECS,
                connectivity.poll_interval_secs
            );
        }
        if connectivity.probe_timeout_secs == 0 || connectivity.probe_timeout_secs >= connectivity.poll_interval_secs {
            anyhow::bail!(
                "probe_timeout_secs must be at least 1 and shorter than poll_interval_secs ({}), got {}",
                connectivity.poll_interval_secs,
                connectivity.probe_timeout_secs
            );
        }

        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            anyhow::bail!(
                "Invalid logging level '{}'. Expected one of: {}",
                self.logging.level,
                LOG_LEVELS.join(", ")
            );
        }

        Ok(())
    }

    /// Validate the remote store section
    fn validate_remote(&self) -> Result<()> {
        let remote = &self.remote;

        if remote.request_timeout_secs == 0 {
            anyhow::bail!("request_timeout_secs must be greater than 0");
        }

        match remote.store_type.as_str() {
            "firestore" => {
                if remote.project_id.is_empty() {
                    anyhow::bail!("Remote store 'firestore': missing required config 'project_id'");
                }
                if remote.database.is_empty() {
                    anyhow::bail!("Remote store 'firestore': database cannot be empty");
                }
            }
            "rest" => {
                if remote.base_url.is_empty() {
                    anyhow::bail!("Remote store 'rest': missing required config 'base_url'");
                }
            }
            "memory" => {}
            store_type => {
                anyhow::bail!(
                    "Unsupported store_type '{}'. Available: {}",
                    store_type,
                    STORE_TYPES.join(", ")
                );
            }
        }

        Ok(())
    }

    /// Generate default configuration file
    pub fn generate_default_config<P: AsRef<Path>>(path: P) -> Result<()> {
        let config = Self::default();
        let toml_content = toml::to_string_pretty(&config).context("Failed to serialize default config")?;

        // Add header comment
        let header = format!(
            "# Sitekeeper Configuration File\n# Generated on {}\n# Set remote.project_id before use.\n\n",
            chrono::Local::now().format("%Y-%m-%d")
        );

        let full_content = header + &toml_content;

        // Ensure the parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        std::fs::write(&path, full_content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        println!("{}: {}", CONFIG_GENERATED, path.as_ref().display());
        Ok(())
    }

    /// Get the XDG config directory path
    pub fn get_xdg_config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))
            .map(|dir| dir.join(APP_DIR_NAME))
    }

    /// Get the default config file path
    pub fn get_default_config_path() -> Result<PathBuf> {
        Ok(Self::get_xdg_config_dir()?.join("config.toml"))
    }
}
