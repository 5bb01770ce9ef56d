//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/clubboard/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/clubboard/` (~/.config/clubboard/)
//! - State/Logs: `$XDG_STATE_HOME/clubboard/` (~/.local/state/clubboard/)

use crate::analytics::LeaderboardSource;
use crate::error::{Error, Result};
use crate::export::{default_export_dir, ExportFormat};
use crate::types::{HourFilter, Metric, PostMetric, TimeFilter};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

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
    /// Where the two inputs come from and how often to re-fetch them
    #[serde(default)]
    pub sources: SourcesConfig,

    /// Leaderboard table defaults
    #[serde(default)]
    pub leaderboard: LeaderboardConfig,

    /// Analytics panel defaults
    #[serde(default)]
    pub analytics: AnalyticsConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Export defaults
    #[serde(default)]
    pub export: ExportConfig,
}

/// Input locations and polling
#[derive(Debug, Deserialize, Clone)]
pub struct SourcesConfig {
    /// Leaderboard snapshot: an http(s) URL or a local path
    #[serde(default = "default_leaderboard_source")]
    pub leaderboard: String,

    /// Raw activity log: an http(s) URL or a local path
    #[serde(default = "default_events_source")]
    pub events: String,

    /// Seconds between scheduled re-fetches
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// HTTP request timeout in seconds (none when unset)
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            leaderboard: default_leaderboard_source(),
            events: default_events_source(),
            poll_interval_secs: default_poll_interval(),
            timeout_secs: None,
        }
    }
}

impl SourcesConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Validate configuration, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        if self.leaderboard.trim().is_empty() {
            return Err(Error::Config(
                "sources.leaderboard must not be empty".to_string(),
            ));
        }
        if self.events.trim().is_empty() {
            return Err(Error::Config("sources.events must not be empty".to_string()));
        }
        if self.poll_interval_secs == 0 {
            return Err(Error::Config(
                "sources.poll_interval_secs must be at least 1".to_string(),
            ));
        }
        if self.timeout_secs == Some(0) {
            return Err(Error::Config(
                "sources.timeout_secs must be at least 1 when set".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_leaderboard_source() -> String {
    "leaderboard.json".to_string()
}

fn default_events_source() -> String {
    "all_tweets.json".to_string()
}

fn default_poll_interval() -> u64 {
    3600
}

/// Leaderboard table defaults
#[derive(Debug, Deserialize, Default, Clone)]
pub struct LeaderboardConfig {
    /// Where table rows come from (`events` or `snapshot`)
    #[serde(default)]
    pub source: LeaderboardSource,

    /// Initial time filter (`all` or a number of days)
    #[serde(default)]
    pub time_filter: TimeFilter,
}

/// Analytics panel defaults
#[derive(Debug, Deserialize, Default, Clone)]
pub struct AnalyticsConfig {
    #[serde(default)]
    pub period: TimeFilter,

    #[serde(default)]
    pub hour: HourFilter,

    /// Metric ranking the top authors
    #[serde(default)]
    pub author_metric: Metric,

    /// Metric ranking the top posts (`likes` or `views`)
    #[serde(default)]
    pub post_metric: PostMetric,
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

/// Export defaults
#[derive(Debug, Deserialize, Default, Clone)]
pub struct ExportConfig {
    /// Target directory; the user's download directory when unset
    #[serde(default)]
    pub dir: Option<PathBuf>,

    #[serde(default)]
    pub format: ExportFormat,
}

impl ExportConfig {
    pub fn dir(&self) -> PathBuf {
        self.dir.clone().unwrap_or_else(default_export_dir)
    }
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
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

    /// Validate every section
    pub fn validate(&self) -> Result<()> {
        self.sources.validate()?;
        if self.logging.max_files == 0 {
            return Err(Error::Config(
                "logging.max_files must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/clubboard/config.toml` (~/.config/clubboard/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("clubboard").join("config.toml")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/clubboard/` (~/.local/state/clubboard/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("clubboard")
    }

    /// Returns the log file path
    ///
    /// `$XDG_STATE_HOME/clubboard/clubboard.log` (~/.local/state/clubboard/clubboard.log)
    pub fn log_path() -> PathBuf {
        Self::state_dir().join("clubboard.log")
    }
}
