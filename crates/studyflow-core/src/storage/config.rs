//! TOML-based application configuration.
//!
//! Holds runtime knobs that are not part of the user's study data:
//! - Tick loop interval
//! - Daily rollover poll interval
//! - Default calendar window
//! - Storage namespace and database file name
//! - Log filter
//!
//! Timer durations are study preferences, not configuration; they live in the
//! store alongside the rest of the timer state.
//!
//! Configuration is stored at `~/.config/studyflow/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::ConfigError;

/// Tick loop configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerLoopConfig {
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

/// Daily rollover polling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RolloverConfig {
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

/// Calendar view defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityConfig {
    #[serde(default = "default_window_days")]
    pub default_window_days: u32,
}

/// Where study data is kept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default = "default_database_file")]
    pub database_file: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `tracing` env-filter directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/studyflow/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub timer: TimerLoopConfig,
    #[serde(default)]
    pub rollover: RolloverConfig,
    #[serde(default)]
    pub activity: ActivityConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_tick_interval_ms() -> u64 {
    1000
}
fn default_poll_interval_secs() -> u64 {
    3600
}
fn default_window_days() -> u32 {
    365
}
fn default_namespace() -> String {
    "studyflow".into()
}
fn default_database_file() -> String {
    "studyflow.db".into()
}
fn default_log_filter() -> String {
    "info".into()
}

impl Default for TimerLoopConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

impl Default for RolloverConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
        }
    }
}

impl Default for ActivityConfig {
    fn default() -> Self {
        Self {
            default_window_days: default_window_days(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            database_file: default_database_file(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() || key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        let n = value
                            .parse::<u64>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?;
                        serde_json::Value::Number(n.into())
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        return Err(invalid("only leaf values can be set".into()));
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    /// Default location of `config.toml`.
    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default location, writing defaults if no file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from `path`, writing defaults there if the file does not exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by dot-separated key without saving.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value cannot be parsed
    /// as the key's type.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        let mut json = serde_json::to_value(&*self).map_err(|e| invalid(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| invalid(e.to_string()))?;
        Ok(())
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "config unavailable, using defaults");
            Self::default()
        })
    }
}
