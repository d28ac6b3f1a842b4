//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Recurrence expansion limits
//! - Storage location and blob key
//! - Defaults for new events (color, times, recurrence type)
//!
//! Configuration is stored at `<data_dir>/config.toml`.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::{ConfigError, CoreError, Result};
use crate::event::time_format;
use crate::event::{Color, RecurrenceType};
use crate::recurrence::DEFAULT_OCCURRENCE_CAP;

/// Recurrence expansion configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecurrenceConfig {
    /// Occurrences emitted for a series with neither an end date nor a count.
    #[serde(default = "default_occurrence_cap")]
    pub default_occurrence_cap: u32,
}

/// Storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Key under which the definition blob is stored.
    #[serde(default = "default_storage_key")]
    pub storage_key: String,
    /// SQLite file name, relative to the data directory.
    #[serde(default = "default_database_file")]
    pub database_file: String,
}

/// Defaults applied to new event forms.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    #[serde(default)]
    pub color: Color,
    #[serde(default = "default_start_time", with = "time_format::required")]
    pub start_time: NaiveTime,
    #[serde(default = "default_end_time", with = "time_format::required")]
    pub end_time: NaiveTime,
    /// Used when a recurring event is created without an explicit type.
    #[serde(default = "default_recurrence_type")]
    pub recurrence_type: RecurrenceType,
}

/// Application configuration.
///
/// Serialized to/from TOML at `<data_dir>/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub recurrence: RecurrenceConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub defaults: DefaultsConfig,
}

// Default functions
fn default_occurrence_cap() -> u32 {
    DEFAULT_OCCURRENCE_CAP
}
fn default_storage_key() -> String {
    "calendar-events".into()
}
fn default_database_file() -> String {
    "eventide.db".into()
}
fn default_start_time() -> NaiveTime {
    NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default()
}
fn default_end_time() -> NaiveTime {
    NaiveTime::from_hms_opt(10, 0, 0).unwrap_or_default()
}
fn default_recurrence_type() -> RecurrenceType {
    RecurrenceType::Weekly
}

impl Default for RecurrenceConfig {
    fn default() -> Self {
        Self {
            default_occurrence_cap: default_occurrence_cap(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            storage_key: default_storage_key(),
            database_file: default_database_file(),
        }
    }
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            color: Color::default(),
            start_time: default_start_time(),
            end_time: default_end_time(),
            recurrence_type: default_recurrence_type(),
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
    ) -> std::result::Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_some() {
                current = current.get_mut(part).ok_or_else(unknown)?;
                continue;
            }

            let obj = current.as_object_mut().ok_or_else(unknown)?;
            let existing = obj.get(part).ok_or_else(unknown)?;
            let new_value = match existing {
                serde_json::Value::Bool(_) => serde_json::Value::Bool(
                    value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                ),
                serde_json::Value::Number(_) => serde_json::Value::Number(
                    value
                        .parse::<u64>()
                        .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?
                        .into(),
                ),
                serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                    serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                }
                _ => serde_json::Value::String(value.into()),
            };
            obj.insert(part.to_string(), new_value);
            return Ok(());
        }

        Err(unknown())
    }

    /// `<data_dir>/config.toml`.
    pub fn path() -> Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Path of the SQLite database this configuration points at.
    pub fn database_path(&self) -> Result<PathBuf> {
        Ok(data_dir()?.join(&self.storage.database_file))
    }

    /// Load from disk or return default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    /// Load from `path`, writing defaults there if the file does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| {
                CoreError::from(ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
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

    /// Set a config value by key without persisting it.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value does not parse as
    /// the field's type (times as `HH:MM`, colors as CSS hex).
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!("using default configuration: {e}");
            Self::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.recurrence.default_occurrence_cap, 50);
        assert_eq!(parsed.storage.storage_key, "calendar-events");
        assert_eq!(parsed.defaults.color.as_str(), "#3b82f6");
        assert_eq!(parsed.defaults.recurrence_type, RecurrenceType::Weekly);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let parsed: Config = toml::from_str("[recurrence]\ndefault_occurrence_cap = 12\n").unwrap();
        assert_eq!(parsed.recurrence.default_occurrence_cap, 12);
        assert_eq!(parsed.storage.database_file, "eventide.db");
        assert_eq!(parsed.defaults.start_time, default_start_time());
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("defaults.start_time").as_deref(), Some("09:00"));
        assert_eq!(cfg.get("recurrence.default_occurrence_cap").as_deref(), Some("50"));
        assert!(cfg.get("defaults.missing_key").is_none());
    }

    #[test]
    fn set_updates_nested_number() {
        let mut cfg = Config::default();
        cfg.set("recurrence.default_occurrence_cap", "75").unwrap();
        assert_eq!(cfg.recurrence.default_occurrence_cap, 75);
    }

    #[test]
    fn set_updates_nested_string() {
        let mut cfg = Config::default();
        cfg.set("defaults.color", "#FF5733").unwrap();
        assert_eq!(cfg.defaults.color.as_str(), "#FF5733");
        cfg.set("defaults.end_time", "17:30").unwrap();
        assert_eq!(cfg.get("defaults.end_time").as_deref(), Some("17:30"));
    }

    #[test]
    fn set_rejects_unknown_key() {
        let mut cfg = Config::default();
        let result = cfg.set("defaults.nonexistent_key", "value");
        assert!(matches!(
            result,
            Err(CoreError::Config(ConfigError::UnknownKey(_)))
        ));
    }

    #[test]
    fn set_rejects_invalid_typed_values() {
        let mut cfg = Config::default();
        assert!(cfg.set("defaults.color", "blue").is_err());
        assert!(cfg.set("defaults.start_time", "9am").is_err());
        assert!(cfg.set("recurrence.default_occurrence_cap", "-1").is_err());
        // A failed set leaves the config untouched.
        assert_eq!(cfg.defaults.color.as_str(), "#3b82f6");
    }

    #[test]
    fn load_from_writes_defaults_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg.recurrence.default_occurrence_cap, 50);
        assert!(path.exists());

        let mut changed = cfg.clone();
        changed.set("storage.storage_key", "work-calendar").unwrap();
        changed.save_to(&path).unwrap();
        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded.storage.storage_key, "work-calendar");
    }

    #[test]
    fn load_from_reports_parse_failures() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "recurrence = 3").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(CoreError::Config(ConfigError::LoadFailed { .. }))
        ));
    }
}
