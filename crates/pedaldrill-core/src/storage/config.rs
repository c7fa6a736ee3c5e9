//! TOML-based drill configuration.
//!
//! Stores tuning for every part of a drill:
//! - Activation threshold, tolerance tiers and hold rules
//! - Score weights
//! - Countdown length
//! - Tick cadence
//! - Random generator presets
//!
//! Configuration is stored at `~/.config/pedaldrill/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::drill::{CountdownConfig, DrillSettings, JudgeConfig, TransportConfig};
use crate::error::ConfigError;
use crate::generator::GeneratorConfig;
use crate::score::ScoreWeights;

/// Drill configuration.
///
/// Serialized to/from TOML at `~/.config/pedaldrill/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub judge: JudgeConfig,
    #[serde(default)]
    pub scoring: ScoreWeights,
    #[serde(default)]
    pub countdown: CountdownConfig,
    #[serde(default)]
    pub transport: TransportConfig,
    #[serde(default)]
    pub generator: GeneratorConfig,
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
            current = match current {
                serde_json::Value::Array(items) => items.get(part.parse::<usize>().ok()?)?,
                other => other.get(part)?,
            };
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        let unknown = || ConfigError::UnknownKey(key.to_string());

        if key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        for part in key.split('.') {
            current = match current {
                serde_json::Value::Array(items) => part
                    .parse::<usize>()
                    .ok()
                    .and_then(|i| items.get_mut(i))
                    .ok_or_else(unknown)?,
                other => other.get_mut(part).ok_or_else(unknown)?,
            };
        }

        let new_value = match &*current {
            serde_json::Value::Bool(_) => serde_json::Value::Bool(
                value
                    .parse::<bool>()
                    .map_err(|e| invalid(e.to_string()))?,
            ),
            serde_json::Value::Number(_) => {
                if let Ok(n) = value.parse::<u64>() {
                    serde_json::Value::Number(n.into())
                } else if let Ok(n) = value.parse::<f64>() {
                    serde_json::Number::from_f64(n)
                        .map(serde_json::Value::Number)
                        .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?
                } else {
                    return Err(invalid(format!("cannot parse '{value}' as number")));
                }
            }
            serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
            }
            _ => serde_json::Value::String(value.into()),
        };
        *current = new_value;
        Ok(())
    }

    /// Location of `config.toml` in the data directory.
    ///
    /// # Errors
    ///
    /// Returns `DirUnavailable` if no data directory can be resolved.
    pub fn file_path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the data directory, writing defaults when missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::file_path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            let cfg = Self::default();
            cfg.save_to(&path)?;
            Ok(cfg)
        }
    }

    /// Load and validate a config file at an explicit path.
    ///
    /// # Errors
    ///
    /// Returns `LoadFailed` if the file cannot be read or parsed, or
    /// `InvalidValue` if it parses but fails validation.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let load_failed = |message: String| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = std::fs::read_to_string(path).map_err(|e| load_failed(e.to_string()))?;
        let cfg: Config = toml::from_str(&content).map_err(|e| load_failed(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Persist to the data directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::file_path()?)
    }

    /// Persist to an explicit path.
    ///
    /// # Errors
    ///
    /// Returns `SaveFailed` if serialization or the write fails.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    /// Array elements are addressed by index, e.g. `judge.tolerance.tiers.0.early_secs`.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key in memory. The result must still validate.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the updated config is invalid. `self` is unchanged on error.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        let mut json = serde_json::to_value(&*self).map_err(|e| invalid(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| invalid(e.to_string()))?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Check cross-field constraints serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns `InvalidValue` naming the offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.judge.validate()?;
        if self.countdown.step_secs.is_nan() || self.countdown.step_secs < 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "countdown.step_secs".into(),
                message: "must be zero or positive".into(),
            });
        }
        if self.transport.tick_hz == 0 {
            return Err(ConfigError::InvalidValue {
                key: "transport.tick_hz".into(),
                message: "must be at least 1".into(),
            });
        }
        if self.generator.lanes.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "generator.lanes".into(),
                message: "at least one lane is required".into(),
            });
        }
        Ok(())
    }

    /// Everything a drill session needs.
    pub fn settings(&self) -> DrillSettings {
        DrillSettings {
            judge: self.judge.clone(),
            scoring: self.scoring.clone(),
            countdown: self.countdown.clone(),
            transport: self.transport.clone(),
            generator: self.generator.clone(),
        }
    }
}
