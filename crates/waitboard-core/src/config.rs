//! Configuration loading and typed config structures for Waitboard.
//!
//! Configuration is read from a YAML file (`waitboard.yaml` by default,
//! or the path in `WAITBOARD_CONFIG`). Every field has a default, so an
//! empty or missing file yields a working server. A handful of
//! environment variables override the file afterwards:
//!
//! | Variable | Field |
//! |----------|-------|
//! | `WAIT_TIME` | `display.wait_minutes` |
//! | `OFFER` | `display.offer` |
//! | `MODE` | `display.mode` |
//! | `SHOW_OFFER` | `display.show_offer` (anything but `0` is true) |
//! | `HOST` | `server.host` |
//! | `PORT` | `server.port` |

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::session::StreamSettings;
use crate::state::{DisplayMode, DisplayState, clamp_wait};

/// Environment variable holding an explicit config file path.
pub const CONFIG_PATH_ENV: &str = "WAITBOARD_CONFIG";

/// Config file looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "waitboard.yaml";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value was present but unusable.
    #[error("invalid value for {key}: {message}")]
    InvalidValue {
        /// Config field or environment variable name.
        key: &'static str,
        /// What was wrong with it.
        message: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct WaitboardConfig {
    /// HTTP listener settings.
    #[serde(default)]
    pub server: HttpConfig,

    /// Display state at startup.
    #[serde(default)]
    pub display: DisplayDefaults,

    /// Event stream timing and buffering.
    #[serde(default)]
    pub stream: StreamConfig,

    /// Log output.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl WaitboardConfig {
    /// Load configuration the way the server binary does: from
    /// `WAITBOARD_CONFIG`, else `waitboard.yaml` if present, else
    /// defaults; then apply environment overrides and validate.
    pub fn load() -> Result<Self, ConfigError> {
        let explicit = std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from);
        let default_path = Path::new(DEFAULT_CONFIG_FILE);

        let mut config = match explicit {
            Some(path) => Self::read(&path)?,
            None if default_path.exists() => Self::read(default_path)?,
            None => Self::default(),
        };
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file, with environment overrides.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::read(path)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a YAML string. Environment variables are
    /// not consulted.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config = Self::from_yaml(yaml)?;
        config.validate()?;
        Ok(config)
    }

    fn read(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yml::from_str(yaml)?)
    }

    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup (the environment in production,
    /// a map in tests).
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(val) = lookup("WAIT_TIME") {
            self.display.wait_minutes =
                val.trim()
                    .parse()
                    .map_err(|e| ConfigError::InvalidValue {
                        key: "WAIT_TIME",
                        message: format!("{val:?} is not an integer: {e}"),
                    })?;
        }
        if let Some(val) = lookup("OFFER") {
            self.display.offer = val;
        }
        if let Some(val) = lookup("MODE") {
            self.display.mode = val.parse().map_err(|e| ConfigError::InvalidValue {
                key: "MODE",
                message: format!("{e}"),
            })?;
        }
        if let Some(val) = lookup("SHOW_OFFER") {
            self.display.show_offer = val != "0";
        }
        if let Some(val) = lookup("HOST") {
            self.server.host = val;
        }
        if let Some(val) = lookup("PORT") {
            self.server.port = val.trim().parse().map_err(|e| ConfigError::InvalidValue {
                key: "PORT",
                message: format!("{val:?} is not a port number: {e}"),
            })?;
        }
        Ok(())
    }

    /// Reject values the server cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.stream.heartbeat_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "stream.heartbeat_secs",
                message: String::from("must be at least 1"),
            });
        }
        if self.stream.listener_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                key: "stream.listener_capacity",
                message: String::from("must be at least 1"),
            });
        }
        Ok(())
    }
}

/// HTTP listener configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HttpConfig {
    /// Address to bind (e.g. `0.0.0.0`).
    #[serde(default = "default_host")]
    pub host: String,

    /// TCP port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory served under `/static`.
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,

    /// Directory with page templates overriding the built-in ones.
    #[serde(default)]
    pub templates_dir: Option<PathBuf>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: default_static_dir(),
            templates_dir: None,
        }
    }
}

/// Display state used at startup.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DisplayDefaults {
    /// Initial wait in minutes. Clamped to `0..=10` when applied.
    #[serde(default = "default_wait_minutes")]
    pub wait_minutes: i64,

    /// Initial offer text.
    #[serde(default = "default_offer")]
    pub offer: String,

    /// Initial display mode.
    #[serde(default)]
    pub mode: DisplayMode,

    /// Whether the offer starts visible.
    #[serde(default = "default_true")]
    pub show_offer: bool,
}

impl DisplayDefaults {
    /// The state a fresh board starts with.
    pub fn initial_state(&self) -> DisplayState {
        DisplayState {
            wait_minutes: clamp_wait(self.wait_minutes),
            offer_text: self.offer.clone(),
            display_mode: self.mode,
            show_offer: self.show_offer,
            auto_offer_enabled: false,
        }
    }
}

impl Default for DisplayDefaults {
    fn default() -> Self {
        Self {
            wait_minutes: default_wait_minutes(),
            offer: default_offer(),
            mode: DisplayMode::default(),
            show_offer: true,
        }
    }
}

/// Event stream configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StreamConfig {
    /// Seconds of silence before a heartbeat comment.
    #[serde(default = "default_heartbeat_secs")]
    pub heartbeat_secs: u64,

    /// Reconnection delay advertised to clients, in milliseconds.
    #[serde(default = "default_retry_ms")]
    pub retry_ms: u64,

    /// Payloads buffered per listener before it is dropped as stalled.
    #[serde(default = "default_listener_capacity")]
    pub listener_capacity: usize,
}

impl StreamConfig {
    /// Session timing derived from this config.
    pub const fn settings(&self) -> StreamSettings {
        StreamSettings {
            heartbeat: Duration::from_secs(self.heartbeat_secs),
            retry: Duration::from_millis(self.retry_ms),
        }
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            heartbeat_secs: default_heartbeat_secs(),
            retry_ms: default_retry_ms(),
            listener_capacity: default_listener_capacity(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_host() -> String {
    String::from("0.0.0.0")
}

const fn default_port() -> u16 {
    8000
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("static")
}

const fn default_wait_minutes() -> i64 {
    5
}

fn default_offer() -> String {
    String::from("un expresso")
}

const fn default_true() -> bool {
    true
}

const fn default_heartbeat_secs() -> u64 {
    20
}

const fn default_retry_ms() -> u64 {
    3000
}

const fn default_listener_capacity() -> usize {
    crate::registry::DEFAULT_LISTENER_CAPACITY
}

fn default_log_level() -> String {
    String::from("info")
}
