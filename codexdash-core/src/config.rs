//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/codexdash/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/codexdash/` (~/.config/codexdash/)
//! - State/Logs: `$XDG_STATE_HOME/codexdash/` (~/.local/state/codexdash/)
//!
//! The server URL can be overridden with the `CODEXDASH_URL` environment variable.

use crate::client::StreamConfig;
use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use url::Url;

/// Environment variable that overrides `server.base_url`
pub const URL_ENV: &str = "CODEXDASH_URL";

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    /// Server connection settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Live event stream settings
    #[serde(default)]
    pub stream: StreamSettings,

    /// Feed capacities and snapshot page sizes
    #[serde(default)]
    pub feeds: FeedsConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server connection settings
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Base URL of the codexdash API (e.g., `http://127.0.0.1:8000`)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// HTTP request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_timeout() -> u64 {
    10
}

/// Live event stream settings
#[derive(Debug, Deserialize, Clone)]
pub struct StreamSettings {
    /// Explicit WebSocket URL; derived from `server.base_url` when unset
    pub url: Option<String>,

    /// Reconnect with backoff after the connection drops
    #[serde(default)]
    pub reconnect: bool,

    /// Events buffered between the socket reader and the consumer
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            url: None,
            reconnect: false,
            channel_capacity: default_channel_capacity(),
        }
    }
}

fn default_channel_capacity() -> usize {
    256
}

/// Feed capacities and snapshot page sizes, scoped per screen
#[derive(Debug, Deserialize, Clone)]
pub struct FeedsConfig {
    /// Capacity of the cross-view live buffer
    #[serde(default = "default_live_capacity")]
    pub live_capacity: usize,

    /// Capacity of the dashboard timeline
    #[serde(default = "default_dashboard_capacity")]
    pub dashboard_capacity: usize,

    /// Capacity of the agents view event store
    #[serde(default = "default_agents_capacity")]
    pub agents_capacity: usize,

    /// Events shown per agent in the agents view
    #[serde(default = "default_agent_feed_limit")]
    pub agent_feed_limit: usize,

    /// Events considered by the token time series
    #[serde(default = "default_series_window")]
    pub series_window: usize,

    /// Jobs fetched by the dashboard
    #[serde(default = "default_dashboard_jobs_limit")]
    pub dashboard_jobs_limit: usize,

    /// Events fetched by the dashboard
    #[serde(default = "default_dashboard_events_limit")]
    pub dashboard_events_limit: usize,

    /// Jobs fetched by the jobs list
    #[serde(default = "default_jobs_limit")]
    pub jobs_limit: usize,
}

impl Default for FeedsConfig {
    fn default() -> Self {
        Self {
            live_capacity: default_live_capacity(),
            dashboard_capacity: default_dashboard_capacity(),
            agents_capacity: default_agents_capacity(),
            agent_feed_limit: default_agent_feed_limit(),
            series_window: default_series_window(),
            dashboard_jobs_limit: default_dashboard_jobs_limit(),
            dashboard_events_limit: default_dashboard_events_limit(),
            jobs_limit: default_jobs_limit(),
        }
    }
}

impl FeedsConfig {
    fn validate(&self) -> Result<()> {
        let fields = [
            ("live_capacity", self.live_capacity),
            ("dashboard_capacity", self.dashboard_capacity),
            ("agents_capacity", self.agents_capacity),
            ("agent_feed_limit", self.agent_feed_limit),
            ("series_window", self.series_window),
            ("dashboard_jobs_limit", self.dashboard_jobs_limit),
            ("dashboard_events_limit", self.dashboard_events_limit),
            ("jobs_limit", self.jobs_limit),
        ];
        for (name, value) in fields {
            if value == 0 {
                return Err(Error::Config(format!("feeds.{} must be at least 1", name)));
            }
        }
        Ok(())
    }
}

fn default_live_capacity() -> usize {
    500
}

fn default_dashboard_capacity() -> usize {
    50
}

fn default_agents_capacity() -> usize {
    200
}

fn default_agent_feed_limit() -> usize {
    100
}

fn default_series_window() -> usize {
    crate::aggregate::SERIES_WINDOW
}

fn default_dashboard_jobs_limit() -> usize {
    20
}

fn default_dashboard_events_limit() -> usize {
    30
}

fn default_jobs_limit() -> usize {
    100
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

impl Config {
    /// Load configuration from the default path, then apply `CODEXDASH_URL`
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        let mut config = if config_path.exists() {
            Self::load_from(&config_path)?
        } else {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            Config::default()
        };

        if let Ok(url) = std::env::var(URL_ENV) {
            if !url.is_empty() {
                config.server.base_url = url;
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration, returning an error describing the first problem
    pub fn validate(&self) -> Result<()> {
        let base = Url::parse(&self.server.base_url)
            .map_err(|e| Error::Config(format!("server.base_url is invalid: {}", e)))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(Error::Config(
                "server.base_url must use http or https".to_string(),
            ));
        }
        if self.server.timeout_secs == 0 {
            return Err(Error::Config(
                "server.timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.stream.channel_capacity == 0 {
            return Err(Error::Config(
                "stream.channel_capacity must be at least 1".to_string(),
            ));
        }
        self.feeds.validate()
    }

    /// Resolve the live stream settings into a connectable [`StreamConfig`]
    pub fn stream_config(&self) -> Result<StreamConfig> {
        let url = match &self.stream.url {
            Some(url) => Url::parse(url)?,
            None => StreamConfig::url_for_server(&self.server.base_url)?,
        };
        Ok(StreamConfig {
            url,
            reconnect: self.stream.reconnect,
            channel_capacity: self.stream.channel_capacity,
        })
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/codexdash/config.toml` (~/.config/codexdash/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("codexdash").join("config.toml")
    }

    /// Directory for rolling log files
    ///
    /// `$XDG_STATE_HOME/codexdash/` (~/.local/state/codexdash/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("codexdash")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.base_url, "http://127.0.0.1:8000");
        assert_eq!(config.feeds.live_capacity, 500);
        assert_eq!(config.feeds.dashboard_capacity, 50);
        assert_eq!(config.feeds.series_window, 40);
        assert!(!config.stream.reconnect);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[server]
base_url = "https://dash.internal:9443"
timeout_secs = 3

[stream]
reconnect = true

[feeds]
dashboard_capacity = 25

[logging]
level = "debug"
"#;
        let config: Config = toml::from_str(toml).unwrap();

        assert_eq!(config.server.base_url, "https://dash.internal:9443");
        assert_eq!(config.server.timeout_secs, 3);
        assert!(config.stream.reconnect);
        assert_eq!(config.feeds.dashboard_capacity, 25);
        assert_eq!(config.feeds.live_capacity, 500);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let config = Config {
            feeds: FeedsConfig {
                dashboard_capacity: 0,
                ..Default::default()
            },
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("dashboard_capacity"));
    }

    #[test]
    fn test_non_http_base_url_rejected() {
        let config = Config {
            server: ServerConfig {
                base_url: "ftp://example.com".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_stream_url_derived_from_server() {
        let config = Config {
            server: ServerConfig {
                base_url: "https://dash.example.com/".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        let stream = config.stream_config().unwrap();
        assert_eq!(stream.url.as_str(), "wss://dash.example.com/ws/events");
    }

    #[test]
    fn test_explicit_stream_url_wins() {
        let config = Config {
            stream: StreamSettings {
                url: Some("ws://10.0.0.2:9000/ws/events".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let stream = config.stream_config().unwrap();
        assert_eq!(stream.url.as_str(), "ws://10.0.0.2:9000/ws/events");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[feeds]\nagents_capacity = 75").unwrap();

        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.feeds.agents_capacity, 75);
    }

    #[test]
    fn test_load_from_invalid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server\nbase_url = ").unwrap();

        let err = Config::load_from(file.path()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
