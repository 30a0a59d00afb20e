//! Configuration module
//!
//! Handles loading of the status client configuration from a TOML file and
//! environment variables. Settings are passed explicitly to the components
//! that need them, so independent targets can use independent settings.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Status client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusConfig {
    /// Path to the configuration file
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Directory holding one JSON snapshot per host
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,

    /// Maximum age of a cached snapshot in seconds
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,

    /// TCP connect timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Deadline for reading the whole reply in seconds
    #[serde(default = "default_read_timeout")]
    pub read_timeout_secs: u64,

    /// Upper bound on the reply size
    #[serde(default = "default_max_response_bytes")]
    pub max_response_bytes: usize,

    /// Port used when the caller does not give one
    #[serde(default = "default_port")]
    pub default_port: u16,
}

// Default value functions
fn default_cache_dir() -> PathBuf {
    PathBuf::from("./cache")
}

fn default_cache_ttl() -> u64 {
    300 // 5 minutes
}

fn default_connect_timeout() -> u64 {
    5
}

fn default_read_timeout() -> u64 {
    10
}

fn default_max_response_bytes() -> usize {
    1024 * 1024
}

fn default_port() -> u16 {
    7171
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            config_path: PathBuf::from("config/otstatus.toml"),
            cache_dir: default_cache_dir(),
            cache_ttl_secs: default_cache_ttl(),
            connect_timeout_secs: default_connect_timeout(),
            read_timeout_secs: default_read_timeout(),
            max_response_bytes: default_max_response_bytes(),
            default_port: default_port(),
        }
    }
}

impl StatusConfig {
    /// Load configuration from file and environment variables
    pub async fn load() -> Result<Self> {
        let config_path = env::var("OTSTATUS_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config/otstatus.toml"));

        let mut config = if config_path.exists() {
            let content = tokio::fs::read_to_string(&config_path)
                .await
                .with_context(|| {
                    format!("Failed to read config file: {}", config_path.display())
                })?;

            Self::from_toml(&content).with_context(|| {
                format!("Failed to parse config file: {}", config_path.display())
            })?
        } else {
            tracing::warn!(
                "Config file not found at {}, using defaults",
                config_path.display()
            );
            Self::default()
        };

        config.config_path = config_path;
        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Parse configuration from a TOML document
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = env::var("OTSTATUS_CACHE_DIR") {
            self.cache_dir = PathBuf::from(val);
        }
        if let Ok(val) = env::var("OTSTATUS_CACHE_TTL") {
            if let Ok(secs) = val.parse() {
                self.cache_ttl_secs = secs;
            }
        }
        if let Ok(val) = env::var("OTSTATUS_CONNECT_TIMEOUT") {
            if let Ok(secs) = val.parse() {
                self.connect_timeout_secs = secs;
            }
        }
        if let Ok(val) = env::var("OTSTATUS_READ_TIMEOUT") {
            if let Ok(secs) = val.parse() {
                self.read_timeout_secs = secs;
            }
        }
        if let Ok(val) = env::var("OTSTATUS_MAX_RESPONSE_BYTES") {
            if let Ok(max) = val.parse() {
                self.max_response_bytes = max;
            }
        }
        if let Ok(val) = env::var("OTSTATUS_DEFAULT_PORT") {
            if let Ok(port) = val.parse() {
                self.default_port = port;
            }
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.cache_ttl_secs == 0 {
            anyhow::bail!("Cache TTL must be at least 1 second");
        }
        if self.connect_timeout_secs == 0 || self.read_timeout_secs == 0 {
            anyhow::bail!("Connect and read timeouts must be at least 1 second");
        }
        if self.max_response_bytes == 0 {
            anyhow::bail!("Maximum response size must be non-zero");
        }
        if self.default_port == 0 {
            anyhow::bail!("Default port must be between 1 and 65535");
        }

        Ok(())
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = StatusConfig::default();
        assert_eq!(config.cache_dir, PathBuf::from("./cache"));
        assert_eq!(config.cache_ttl_secs, 300);
        assert_eq!(config.connect_timeout(), Duration::from_secs(5));
        assert_eq!(config.read_timeout(), Duration::from_secs(10));
        assert_eq!(config.default_port, 7171);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = StatusConfig::from_toml(
            r#"
            cache_dir = "/var/cache/otstatus"
            cache_ttl_secs = 60
            "#,
        )
        .unwrap();

        assert_eq!(config.cache_dir, PathBuf::from("/var/cache/otstatus"));
        assert_eq!(config.cache_ttl(), Duration::from_secs(60));
        assert_eq!(config.connect_timeout_secs, 5);
        assert_eq!(config.max_response_bytes, 1024 * 1024);
    }

    #[test]
    fn test_validation() {
        let mut config = StatusConfig::default();
        assert!(config.validate().is_ok());

        config.cache_ttl_secs = 0;
        assert!(config.validate().is_err());
        config.cache_ttl_secs = 300;

        config.read_timeout_secs = 0;
        assert!(config.validate().is_err());
        config.read_timeout_secs = 10;

        config.default_port = 0;
        assert!(config.validate().is_err());
    }
}
