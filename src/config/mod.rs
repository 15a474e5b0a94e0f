//! Configuration management for dictfleet
//!
//! Settings come from an optional TOML file and are then overridden by
//! command-line flags. Defaults match a bare `dictfleet --dir <path>` run:
//! front door on 3000, dictionaries from 44000 upward, all on loopback.

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Default front door port
pub const DEFAULT_PORT: u16 = 3000;

/// Default first port of the dictionary fleet
pub const DEFAULT_BASE_PORT: u16 = 44000;

/// Default autocomplete index file name, relative to the dictionary root
pub const DEFAULT_INDEX_FILE: &str = "ecdict_wfd.db";

/// Default cap on autocomplete suggestions
pub const DEFAULT_MAX_SUGGESTIONS: usize = 50;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Listener configuration
    pub server: ServerConfig,

    /// Autocomplete index configuration
    pub autocomplete: AutocompleteConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Listener configuration shared by the front door and the fleet
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind host for every listener
    pub host: IpAddr,

    /// Front door port
    pub port: u16,

    /// First fleet port; member `i` listens on `base_port + i`
    pub base_port: u16,

    /// Dictionary root directory
    pub dir: Option<PathBuf>,

    /// Directory served at the front door wildcard route (optional)
    pub static_dir: Option<PathBuf>,

    /// Enable per-request trace logging
    pub enable_request_logging: bool,

    /// Upper bound on closing one resource during shutdown
    pub shutdown_timeout_secs: u64,
}

/// Autocomplete index configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AutocompleteConfig {
    /// SQLite file name inside the dictionary root
    pub index_file: String,

    /// Maximum suggestions per query
    pub max_suggestions: usize,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: DEFAULT_PORT,
            base_port: DEFAULT_BASE_PORT,
            dir: None,
            static_dir: None,
            enable_request_logging: true,
            shutdown_timeout_secs: 5,
        }
    }
}

impl Default for AutocompleteConfig {
    fn default() -> Self {
        Self {
            index_file: String::from(DEFAULT_INDEX_FILE),
            max_suggestions: DEFAULT_MAX_SUGGESTIONS,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Unreadable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Unreadable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Validate configuration values that do not depend on discovery
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "port".to_string(),
                reason: "Port must be between 1 and 65535".to_string(),
            });
        }

        if self.server.base_port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "base_port".to_string(),
                reason: "Port must be between 1 and 65535".to_string(),
            });
        }

        self.dir()?;

        if self.autocomplete.index_file.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "index_file".to_string(),
                reason: "Index file name cannot be empty".to_string(),
            });
        }

        if self.autocomplete.max_suggestions == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_suggestions".to_string(),
                reason: "Must allow at least 1 suggestion".to_string(),
            });
        }

        Ok(())
    }

    /// Check that a fleet of `members` listeners fits in the port space and
    /// stays clear of the front door.
    pub fn check_fleet_range(&self, members: usize) -> Result<(), ConfigError> {
        let base = u64::from(self.server.base_port);
        let last = base + members.saturating_sub(1) as u64;

        if members > 0 && last > u64::from(u16::MAX) {
            return Err(ConfigError::InvalidValue {
                field: "base_port".to_string(),
                reason: format!("{members} dictionaries do not fit above port {base}"),
            });
        }

        let front = u64::from(self.server.port);
        if members > 0 && (base..=last).contains(&front) {
            return Err(ConfigError::InvalidValue {
                field: "port".to_string(),
                reason: format!("Front door port {front} overlaps the fleet range {base}-{last}"),
            });
        }

        Ok(())
    }

    /// Dictionary root, required
    pub fn dir(&self) -> Result<&Path, ConfigError> {
        self.server
            .dir
            .as_deref()
            .ok_or_else(|| ConfigError::MissingField {
                field: "dir".to_string(),
            })
    }

    /// Autocomplete index location: `<dir>/<index_file>`
    pub fn index_path(&self) -> Result<PathBuf, ConfigError> {
        Ok(self.dir()?.join(&self.autocomplete.index_file))
    }

    /// Front door socket address
    #[must_use]
    pub fn front_door_addr(&self) -> SocketAddr {
        SocketAddr::new(self.server.host, self.server.port)
    }

    /// Per-resource shutdown timeout as Duration
    #[must_use]
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.server.shutdown_timeout_secs)
    }
}

/// Configuration errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Failed to read config file {}: {reason}", path.display())]
    Unreadable { path: PathBuf, reason: String },
}
