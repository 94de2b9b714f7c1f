//! Application configuration.
//!
//! Precedence, lowest to highest: built-in defaults, TOML config file,
//! `NOTIBOX_*` environment variables, CLI flags.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Base URL of the notification REST endpoints
    pub api_url: String,
    /// WebSocket endpoint of the live feed
    pub feed_url: String,
    /// Bearer token used on both transports
    pub token: Option<String>,
    /// Fixed page size of the derived view
    pub page_size: usize,
    /// Uniform HTTP request timeout in seconds
    pub request_timeout_secs: u64,
    /// Fixed delay between live-channel reconnect attempts, in seconds
    pub reconnect_delay_secs: u64,
    /// Optional directory for daily-rotated log files
    pub log_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8080/api".to_string(),
            feed_url: "ws://localhost:8080/ws/feed".to_string(),
            token: None,
            page_size: 10,
            request_timeout_secs: 30,
            reconnect_delay_secs: 5,
            log_dir: None,
        }
    }
}

impl AppConfig {
    /// Load configuration.
    ///
    /// An explicit path must exist and parse. Without one, the platform
    /// config file is used when present, defaults otherwise. Environment
    /// overrides apply last.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };
        config.apply_env();
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        toml::from_str(&raw).map_err(|e| Error::config(format!("{}: {e}", path.display())))
    }

    fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("notibox").join("config.toml"))
    }

    fn apply_env(&mut self) {
        if let Ok(value) = std::env::var("NOTIBOX_API_URL") {
            self.api_url = value;
        }
        if let Ok(value) = std::env::var("NOTIBOX_FEED_URL") {
            self.feed_url = value;
        }
        if let Ok(value) = std::env::var("NOTIBOX_TOKEN") {
            self.token = Some(value);
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.page_size, 10);
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.reconnect_delay_secs, 5);
        assert!(config.token.is_none());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            api_url = "https://backoffice.example.com/api"
            token = "s3cret"
            "#,
        )
        .unwrap();

        assert_eq!(config.api_url, "https://backoffice.example.com/api");
        assert_eq!(config.token.as_deref(), Some("s3cret"));
        assert_eq!(config.page_size, 10);
    }

    #[test]
    fn test_invalid_toml_is_a_config_error() {
        let result: std::result::Result<AppConfig, _> = toml::from_str("page_size = \"ten\"");
        assert!(result.is_err());
    }
}
