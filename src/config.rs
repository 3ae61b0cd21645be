//! Sync configuration
//!
//! Loaded from a YAML file (missing file → defaults); CLI flags override
//! individual fields.

use crate::sync::{SyncOptions, DEFAULT_CLIENT_ID, DEFAULT_TOPIC};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Default backend hostname
pub const DEFAULT_HOSTNAME: &str = "localhost";

/// Default backend WebSocket port
pub const DEFAULT_PORT: u16 = 3001;

/// Errors that can occur while loading or saving configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Hostname of the backend server
    pub hostname: String,
    pub port: u16,
    /// Sync topic to subscribe to
    pub topic: String,
    pub client_id: String,
    /// Vault directory pages are written into
    pub vault: PathBuf,
    /// Seconds to wait for the backend connection; 0 waits indefinitely
    pub ready_timeout_secs: u64,
    /// Cached server URL; cleared whenever the hostname or port changes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_url: Option<String>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            hostname: DEFAULT_HOSTNAME.to_string(),
            port: DEFAULT_PORT,
            topic: DEFAULT_TOPIC.to_string(),
            client_id: DEFAULT_CLIENT_ID.to_string(),
            vault: PathBuf::from("."),
            ready_timeout_secs: 30,
            server_url: None,
        }
    }
}

impl SyncConfig {
    /// Get the default config path (~/.config/unisync/config.yaml)
    pub fn default_path() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".config"));
        config_dir.join("unisync").join("config.yaml")
    }

    /// Load from `path`; a missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        match std::fs::read_to_string(path.as_ref()) {
            Ok(text) if text.trim().is_empty() => Ok(Self::default()),
            Ok(text) => Ok(serde_yaml::from_str(&text)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> ConfigResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_yaml::to_string(self)?)?;
        Ok(())
    }

    /// WebSocket URL of the backend
    pub fn server_url(&self) -> String {
        self.server_url
            .clone()
            .unwrap_or_else(|| format!("ws://{}:{}", self.hostname, self.port))
    }

    /// Change the hostname. Returns true if it changed (and the cached URL was cleared).
    pub fn set_hostname(&mut self, hostname: impl Into<String>) -> bool {
        let hostname = hostname.into();
        if hostname == self.hostname {
            return false;
        }
        self.hostname = hostname;
        self.server_url = None;
        true
    }

    pub fn set_port(&mut self, port: u16) -> bool {
        if port == self.port {
            return false;
        }
        self.port = port;
        self.server_url = None;
        true
    }

    pub fn ready_timeout(&self) -> Option<Duration> {
        (self.ready_timeout_secs > 0).then(|| Duration::from_secs(self.ready_timeout_secs))
    }

    pub fn sync_options(&self) -> SyncOptions {
        SyncOptions {
            topic: self.topic.clone(),
            client_id: self.client_id.clone(),
            ready_timeout: self.ready_timeout(),
        }
    }
}
