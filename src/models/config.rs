//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Remote gallery endpoint settings
    #[serde(default)]
    pub remote: RemoteConfig,

    /// Sync pacing and scheduling
    #[serde(default)]
    pub sync: SyncConfig,

    /// Item store location
    #[serde(default)]
    pub storage: StorageConfig,

    /// Read cache lifetimes
    #[serde(default)]
    pub cache: CacheConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.remote.user_id.trim().is_empty() {
            return Err(AppError::validation(
                "remote.user_id is empty (set it in the config or GALLERY_USER_ID)",
            ));
        }
        if self.remote.user_agent.trim().is_empty() {
            return Err(AppError::validation("remote.user_agent is empty"));
        }
        if self.remote.timeout_secs == 0 {
            return Err(AppError::validation("remote.timeout_secs must be > 0"));
        }
        url::Url::parse(&self.remote.base_url)
            .map_err(|e| AppError::validation(format!("remote.base_url is invalid: {e}")))?;
        if self.sync.interval_secs == 0 {
            return Err(AppError::validation("sync.interval_secs must be > 0"));
        }
        if self.storage.database.as_os_str().is_empty() {
            return Err(AppError::validation("storage.database is empty"));
        }
        if self.cache.sweep_interval_secs == 0 {
            return Err(AppError::validation("cache.sweep_interval_secs must be > 0"));
        }
        Ok(())
    }
}

/// Remote gallery service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Scheme and host of the gallery service
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// Gallery user whose posts are mirrored
    #[serde(default)]
    pub user_id: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Per-request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            user_id: String::new(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// Sync pacing and scheduling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Delay between listing page requests in milliseconds
    #[serde(default = "defaults::listing_delay")]
    pub listing_delay_ms: u64,

    /// Delay after each detail fetch in milliseconds
    #[serde(default = "defaults::detail_delay")]
    pub detail_delay_ms: u64,

    /// Seconds between scheduled runs
    #[serde(default = "defaults::interval")]
    pub interval_secs: u64,

    /// Seconds to wait before the first scheduled run
    #[serde(default = "defaults::initial_delay")]
    pub initial_delay_secs: u64,
}

impl SyncConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn initial_delay(&self) -> Duration {
        Duration::from_secs(self.initial_delay_secs)
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            listing_delay_ms: defaults::listing_delay(),
            detail_delay_ms: defaults::detail_delay(),
            interval_secs: defaults::interval(),
            initial_delay_secs: defaults::initial_delay(),
        }
    }
}

/// Item store location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path of the SQLite database file
    #[serde(default = "defaults::database")]
    pub database: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database: defaults::database(),
        }
    }
}

/// Read cache lifetimes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// TTL for item list pages in seconds
    #[serde(default = "defaults::list_ttl")]
    pub list_ttl_secs: u64,

    /// TTL for single item reads in seconds
    #[serde(default = "defaults::detail_ttl")]
    pub detail_ttl_secs: u64,

    /// Seconds between expired-entry sweeps
    #[serde(default = "defaults::sweep_interval")]
    pub sweep_interval_secs: u64,
}

impl CacheConfig {
    pub fn list_ttl(&self) -> Duration {
        Duration::from_secs(self.list_ttl_secs)
    }

    pub fn detail_ttl(&self) -> Duration {
        Duration::from_secs(self.detail_ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            list_ttl_secs: defaults::list_ttl(),
            detail_ttl_secs: defaults::detail_ttl(),
            sweep_interval_secs: defaults::sweep_interval(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default log filter when RUST_LOG is unset
    #[serde(default = "defaults::log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    // Remote defaults
    pub fn base_url() -> String {
        "https://gallery.vivo.com.cn".into()
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; gallery-sync/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }

    // Sync defaults
    pub fn listing_delay() -> u64 {
        200
    }
    pub fn detail_delay() -> u64 {
        500
    }
    pub fn interval() -> u64 {
        30 * 60
    }
    pub fn initial_delay() -> u64 {
        2
    }

    // Storage defaults
    pub fn database() -> PathBuf {
        PathBuf::from("gallery.db")
    }

    // Cache defaults
    pub fn list_ttl() -> u64 {
        5 * 60
    }
    pub fn detail_ttl() -> u64 {
        10 * 60
    }
    pub fn sweep_interval() -> u64 {
        5 * 60
    }

    pub fn log_level() -> String {
        "info".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        let mut config = Config::default();
        config.remote.user_id = "1234567".to_string();
        config
    }

    #[test]
    fn test_validate_default_config_requires_user_id() {
        assert!(Config::default().validate().is_err());
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_user_agent() {
        let mut config = valid_config();
        config.remote.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_base_url() {
        let mut config = valid_config();
        config.remote.base_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let mut config = valid_config();
        config.sync.interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [remote]
            user_id = "42"

            [sync]
            detail_delay_ms = 0
            "#,
        )
        .unwrap();

        assert_eq!(config.remote.user_id, "42");
        assert_eq!(config.remote.timeout_secs, 30);
        assert_eq!(config.sync.detail_delay_ms, 0);
        assert_eq!(config.sync.listing_delay_ms, 200);
        assert_eq!(config.cache.list_ttl(), Duration::from_secs(300));
        assert_eq!(config.storage.database, PathBuf::from("gallery.db"));
    }

    #[test]
    fn test_load_or_default_falls_back_on_missing_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let config = Config::load_or_default(tmp.path().join("missing.toml"));
        assert_eq!(config.sync.interval_secs, 1800);
    }

    #[test]
    fn test_load_reads_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "[storage]\ndatabase = \"mirror.db\"\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.storage.database, PathBuf::from("mirror.db"));
    }
}
