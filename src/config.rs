//! Configuration management for quote-sync
//!
//! Configuration can be loaded from:
//! - Default values
//! - Config file (~/.config/quote-sync/config.toml)
//! - Command line overrides (`--data-dir`, `--remote-url`)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::store::CaseMode;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Remote server configuration
    pub remote: RemoteConfig,
    /// Sync scheduling configuration
    pub sync: SyncConfig,
    /// Local storage configuration
    pub storage: StorageConfig,
    /// Status message configuration
    pub notify: NotifyConfig,
    /// Category filter configuration
    pub filter: FilterConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Server base URL
    pub base_url: String,
    /// Maximum posts requested per fetch
    pub fetch_limit: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// User id stamped on created posts
    pub user_id: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Whether periodic sync runs in long-lived sessions
    pub enabled: bool,
    /// Seconds between periodic pulls
    pub interval_secs: u64,
    /// Seconds before the first periodic pull
    pub initial_delay_secs: u64,
    /// Upper bound on a single fetch, independent of the HTTP timeout
    pub fetch_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the persisted slots
    pub data_dir: PathBuf,
    /// Maximum total size of persisted slots (bytes)
    pub quota_bytes: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    /// Seconds a status message stays visible
    pub display_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Compare categories exactly when filtering
    pub case_sensitive: bool,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://jsonplaceholder.typicode.com".to_string(),
            fetch_limit: 10,
            timeout_secs: 10,
            user_id: 1,
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 30,
            initial_delay_secs: 2,
            fetch_timeout_secs: 15,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let data_dir = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
        Self {
            data_dir: data_dir.join("quote-sync"),
            quota_bytes: Some(5 * 1024 * 1024), // 5MB
        }
    }
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self { display_secs: 5 }
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            case_sensitive: true,
        }
    }
}

impl SyncConfig {
    /// Get periodic pull interval
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }

    /// Get delay before the first periodic pull
    pub fn initial_delay(&self) -> Duration {
        Duration::from_secs(self.initial_delay_secs)
    }

    /// Get fetch timeout
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

impl NotifyConfig {
    /// Get status message lifetime
    pub fn display_window(&self) -> Duration {
        Duration::from_secs(self.display_secs)
    }
}

impl FilterConfig {
    pub fn case_mode(&self) -> CaseMode {
        if self.case_sensitive {
            CaseMode::Sensitive
        } else {
            CaseMode::Insensitive
        }
    }
}

impl Config {
    /// Get default configuration file path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("quote-sync")
            .join("config.toml")
    }

    /// Load configuration from file, defaults if it does not exist
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.map(PathBuf::from).unwrap_or_else(Self::default_path);

        if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: Option<&Path>) -> Result<()> {
        let path = path.map(PathBuf::from).unwrap_or_else(Self::default_path);

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&path, content)?;

        Ok(())
    }
}
