//! Configuration module
//!
//! Handles loading the connection and logging settings from TOML files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Connection settings
    #[serde(default)]
    pub connection: ConnectionConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// WebSocket URL to connect to
    #[serde(default = "default_url")]
    pub url: String,

    /// Handshake timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (pretty, json, compact)
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_url() -> String {
    "ws://127.0.0.1:3030".to_string()
}

fn default_connect_timeout() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl ConnectionConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load from `path` if one was given, otherwise use defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Override the connection URL, e.g. from the command line
    pub fn with_url(mut self, url: Option<String>) -> Self {
        if let Some(url) = url {
            self.connection.url = url;
        }
        self
    }

    /// Render the configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.connection.url, "ws://127.0.0.1:3030");
        assert_eq!(config.connection.connect_timeout(), Duration::from_secs(30));
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_parse_minimal_config() {
        let toml_content = r#"
            [connection]
            url = "wss://feed.example.com/ws"
        "#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.connection.url, "wss://feed.example.com/ws");
        assert_eq!(config.connection.connect_timeout_secs, 30);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_url_override() {
        let config = Config::default().with_url(Some("ws://override:9000".to_string()));
        assert_eq!(config.connection.url, "ws://override:9000");

        let config = config.with_url(None);
        assert_eq!(config.connection.url, "ws://override:9000");
    }

    #[test]
    fn test_toml_output_parses_back() {
        let mut config = Config::default();
        config.logging.format = "json".to_string();

        let rendered = config.to_toml().unwrap();
        let parsed: Config = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed.logging.format, "json");
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let result = Config::load("/nonexistent/ws-manager.toml");
        assert!(result.is_err());
    }
}
