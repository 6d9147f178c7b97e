//! Client configuration loaded from TOML.

use std::path::Path;
use std::time::Duration;

use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::controller::ControllerSettings;

/// Environment variable overriding [`ClientConfig::server_url`].
pub const SERVER_URL_ENV: &str = "DRAGON_SERVER_URL";

/// Configuration of the game client.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the game API.
    #[serde(default = "default_server_url")]
    server_url: String,

    /// Countdown length of a NORMAL game, in seconds.
    #[serde(default = "default_duration_secs")]
    default_duration_secs: u64,

    /// Per-request timeout, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    request_timeout_secs: u64,

    /// Countdown refresh period, in milliseconds.
    #[serde(default = "default_timer_tick_millis")]
    timer_tick_millis: u64,

    /// File the console client logs to.
    #[serde(default = "default_log_file")]
    log_file: String,
}

fn default_server_url() -> String {
    "http://localhost:8080/libreDragon/api".to_string()
}

fn default_duration_secs() -> u64 {
    120
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_timer_tick_millis() -> u64 {
    1000
}

fn default_log_file() -> String {
    "dragon_client.log".to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            default_duration_secs: default_duration_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            timer_tick_millis: default_timer_tick_millis(),
            log_file: default_log_file(),
        }
    }
}

impl ClientConfig {
    /// Loads configuration from a TOML file. Missing keys take defaults.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;
        config.validate()?;

        info!(server_url = %config.server_url, "Config loaded successfully");
        Ok(config)
    }

    /// Applies environment overrides.
    #[instrument(skip(self))]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var(SERVER_URL_ENV) {
            debug!(server_url = %url, "Server URL overridden from environment");
            self.server_url = url;
        }
        self
    }

    /// Replaces the server URL.
    pub fn with_server_url(mut self, server_url: impl Into<String>) -> Self {
        self.server_url = server_url.into();
        self
    }

    /// Countdown length of a NORMAL game.
    pub fn default_duration(&self) -> Duration {
        Duration::from_secs(self.default_duration_secs)
    }

    /// Per-request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Countdown refresh period.
    pub fn timer_tick(&self) -> Duration {
        Duration::from_millis(self.timer_tick_millis)
    }

    /// Controller tunables derived from this configuration.
    pub fn controller_settings(&self) -> ControllerSettings {
        ControllerSettings {
            default_duration: self.default_duration(),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.default_duration_secs == 0 {
            return Err(ConfigError::new("default_duration_secs must be positive".to_string()));
        }
        if self.timer_tick_millis == 0 {
            return Err(ConfigError::new("timer_tick_millis must be positive".to_string()));
        }
        Ok(())
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}
