//! Client settings loading.
//!
//! All fields are required unless explicitly marked optional. No defaults.
//! The API key and preload list can be supplied (or overridden) through the
//! environment; everything else comes from the TOML file.

use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Full URL of the pull endpoint, e.g. `https://host/api/v1/value`.
    pub value_url: String,
    /// WebSocket URL of the push endpoint.
    pub stream_url: String,
    pub auth: AuthSettings,
    /// Keys fetched eagerly during initialization.
    #[serde(default)]
    pub preload_keys: Vec<String>,
    pub request_timeout_ms: u64,
    pub keepalive_interval_ms: u64,
    pub reconnect: ReconnectSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthSettings {
    /// Absent keys are tolerated: the client starts, but every lookup
    /// fails until a key is configured.
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReconnectSettings {
    pub initial_ms: u64,
    pub max_ms: u64,
    pub multiplier: f64,
    pub jitter_ms: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Missing settings file path (set CONFIGSYNC_CONFIG)")]
    MissingConfigPath,
    #[error("Failed to read settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse settings TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid settings value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

impl Settings {
    /// Load from the file named by `CONFIGSYNC_CONFIG`, apply environment
    /// overrides, and validate.
    pub fn load() -> Result<Self, SettingsError> {
        let path = std::env::var("CONFIGSYNC_CONFIG")
            .ok()
            .map(PathBuf::from)
            .ok_or(SettingsError::MissingConfigPath)?;
        let mut settings = Self::from_path(&path)?;
        settings.apply_env();
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_path(path: &Path) -> Result<Self, SettingsError> {
        let contents = std::fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&contents)?;
        Ok(settings)
    }

    /// `CONFIGSYNC_API_KEY` and `CONFIGSYNC_PRELOAD_KEYS` (comma-separated)
    /// override whatever the file says.
    pub fn apply_env(&mut self) {
        if let Ok(api_key) = std::env::var("CONFIGSYNC_API_KEY") {
            self.auth.api_key = Some(api_key);
        }
        if let Ok(raw) = std::env::var("CONFIGSYNC_PRELOAD_KEYS") {
            self.preload_keys = parse_preload_list(&raw);
        }
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.value_url.trim().is_empty() {
            return Err(SettingsError::InvalidValue {
                field: "value_url",
                reason: "must not be empty".to_string(),
            });
        }
        if self.stream_url.trim().is_empty() {
            return Err(SettingsError::InvalidValue {
                field: "stream_url",
                reason: "must not be empty".to_string(),
            });
        }
        if self.request_timeout_ms == 0 {
            return Err(SettingsError::InvalidValue {
                field: "request_timeout_ms",
                reason: "must be > 0".to_string(),
            });
        }
        if self.keepalive_interval_ms == 0 {
            return Err(SettingsError::InvalidValue {
                field: "keepalive_interval_ms",
                reason: "must be > 0".to_string(),
            });
        }
        if self.preload_keys.iter().any(|key| key.trim().is_empty()) {
            return Err(SettingsError::InvalidValue {
                field: "preload_keys",
                reason: "entries must not be empty".to_string(),
            });
        }
        if self.reconnect.initial_ms == 0 {
            return Err(SettingsError::InvalidValue {
                field: "reconnect.initial_ms",
                reason: "must be > 0".to_string(),
            });
        }
        if self.reconnect.max_ms < self.reconnect.initial_ms {
            return Err(SettingsError::InvalidValue {
                field: "reconnect.max_ms",
                reason: "must be >= initial_ms".to_string(),
            });
        }
        if self.reconnect.multiplier < 1.0 {
            return Err(SettingsError::InvalidValue {
                field: "reconnect.multiplier",
                reason: "must be >= 1.0".to_string(),
            });
        }
        Ok(())
    }
}

fn parse_preload_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(str::to_string)
        .collect()
}
