use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub poller: PollerConfig,
}

/// Where the wallet node lives and how to talk to it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// URL scheme (http or https)
    #[serde(default = "default_scheme")]
    pub scheme: String,
    /// Host name or IP address
    #[serde(default = "default_host")]
    pub host: String,
    /// HTTP port
    #[serde(default = "default_port")]
    pub port: u16,
    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Send `DNT: 1` with every request
    #[serde(default = "default_true")]
    pub do_not_track: bool,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            scheme: default_scheme(),
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout(),
            do_not_track: true,
        }
    }
}

impl BackendConfig {
    /// Base address all endpoint paths are appended to
    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.scheme, self.host, self.port)
    }
}

fn default_scheme() -> String {
    "http".to_string()
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_request_timeout() -> u64 {
    5
}

fn default_true() -> bool {
    true
}

/// Polling behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollerConfig {
    /// Seconds between fetch cycles
    #[serde(default = "default_interval")]
    pub interval_secs: u64,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval(),
        }
    }
}

impl PollerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

fn default_interval() -> u64 {
    10
}

impl Config {
    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let dirs = directories::ProjectDirs::from("com", "walletdash", "Walletdash")
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        let config_dir = dirs.config_dir();
        std::fs::create_dir_all(config_dir)?;

        Ok(config_dir.join("config.toml"))
    }

    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from a specific file, falling back to defaults if absent
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {:?}", path))?;
            let config: Config = toml::from_str(&content)
                .with_context(|| format!("Invalid configuration in {:?}", path))?;
            config.validate()?;
            tracing::info!("Loaded configuration from {:?}", path);
            Ok(config)
        } else {
            tracing::info!("No configuration file found, using defaults");
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to a specific file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        self.validate()?;
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        tracing::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Reject values the poller or client cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.backend.host.trim().is_empty() {
            anyhow::bail!("backend.host must not be empty");
        }
        if self.backend.port == 0 {
            anyhow::bail!("backend.port must be non-zero");
        }
        if !matches!(self.backend.scheme.as_str(), "http" | "https") {
            anyhow::bail!("backend.scheme must be http or https, got {}", self.backend.scheme);
        }
        if self.backend.request_timeout_secs == 0 {
            anyhow::bail!("backend.request_timeout_secs must be at least 1");
        }
        if self.poller.interval_secs == 0 {
            anyhow::bail!("poller.interval_secs must be at least 1");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_match_local_node() {
        let config = Config::default();
        assert_eq!(config.backend.base_url(), "http://localhost:5000");
        assert!(config.backend.do_not_track);
        assert_eq!(config.poller.interval(), Duration::from_secs(10));
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config::load_from(&temp_dir.path().join("config.toml")).unwrap();
        assert_eq!(config.backend.port, 5000);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[backend]\nport = 5005\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.backend.port, 5005);
        assert_eq!(config.backend.host, "localhost");
        assert_eq!(config.poller.interval_secs, 10);
    }

    #[test]
    fn test_save_then_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");

        let mut config = Config::default();
        config.backend.host = "10.0.0.7".to_string();
        config.poller.interval_secs = 30;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.backend.base_url(), "http://10.0.0.7:5000");
        assert_eq!(loaded.poller.interval_secs, 30);
    }

    #[test]
    fn test_zero_interval_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[poller]\ninterval_secs = 0\n").unwrap();

        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_validate() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.backend.scheme = "ftp".to_string();
        assert!(config.validate().is_err());

        config.backend.scheme = "https".to_string();
        config.backend.port = 0;
        assert!(config.validate().is_err());
    }
}
