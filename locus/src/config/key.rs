//! Addressable configuration keys.
//!
//! Every setting in `config.ini` is named `section.key`. The same table
//! drives parsing, saving, and the CLI's `config get/set/list`.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use super::file::{ConfigError, ConfigFile, LOGGING_SECTION, REQUEST_SECTION};

/// One configuration setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    /// `request.time_relevance_secs`
    RequestTimeRelevanceSecs,
    /// `request.desired_accuracy_m`
    RequestDesiredAccuracyM,
    /// `request.min_accuracy_m`
    RequestMinAccuracyM,
    /// `request.timeout_secs`
    RequestTimeoutSecs,
    /// `logging.level`
    LoggingLevel,
    /// `logging.file`
    LoggingFile,
}

impl ConfigKey {
    /// Every key, in file order.
    pub fn all() -> &'static [ConfigKey] {
        &[
            ConfigKey::RequestTimeRelevanceSecs,
            ConfigKey::RequestDesiredAccuracyM,
            ConfigKey::RequestMinAccuracyM,
            ConfigKey::RequestTimeoutSecs,
            ConfigKey::LoggingLevel,
            ConfigKey::LoggingFile,
        ]
    }

    /// INI section the key lives in.
    pub fn section(&self) -> &'static str {
        match self {
            ConfigKey::RequestTimeRelevanceSecs
            | ConfigKey::RequestDesiredAccuracyM
            | ConfigKey::RequestMinAccuracyM
            | ConfigKey::RequestTimeoutSecs => REQUEST_SECTION,
            ConfigKey::LoggingLevel | ConfigKey::LoggingFile => LOGGING_SECTION,
        }
    }

    /// Key name within its section.
    pub fn key_name(&self) -> &'static str {
        match self {
            ConfigKey::RequestTimeRelevanceSecs => "time_relevance_secs",
            ConfigKey::RequestDesiredAccuracyM => "desired_accuracy_m",
            ConfigKey::RequestMinAccuracyM => "min_accuracy_m",
            ConfigKey::RequestTimeoutSecs => "timeout_secs",
            ConfigKey::LoggingLevel => "level",
            ConfigKey::LoggingFile => "file",
        }
    }

    /// Full `section.key` name.
    pub fn name(&self) -> String {
        format!("{}.{}", self.section(), self.key_name())
    }

    /// Current value as written to the file. Empty when unset.
    pub fn get(&self, config: &ConfigFile) -> String {
        let request = &config.request;
        match self {
            ConfigKey::RequestTimeRelevanceSecs => request.time_relevance.as_secs().to_string(),
            ConfigKey::RequestDesiredAccuracyM => request.desired_accuracy.to_string(),
            ConfigKey::RequestMinAccuracyM => request.min_accuracy.to_string(),
            ConfigKey::RequestTimeoutSecs => request.timeout.as_secs().to_string(),
            ConfigKey::LoggingLevel => config.logging.level.clone(),
            ConfigKey::LoggingFile => config
                .logging
                .file
                .as_ref()
                .map(|file| file.to_string_lossy().to_string())
                .unwrap_or_default(),
        }
    }

    /// Parse `value` and store it. An empty `logging.file` unsets it.
    pub fn set(&self, config: &mut ConfigFile, value: &str) -> Result<(), ConfigError> {
        let request = &mut config.request;
        match self {
            ConfigKey::RequestTimeRelevanceSecs => {
                request.time_relevance = Duration::from_secs(self.parse_value(value)?);
            }
            ConfigKey::RequestDesiredAccuracyM => {
                request.desired_accuracy = self.parse_meters(value)?;
            }
            ConfigKey::RequestMinAccuracyM => {
                request.min_accuracy = self.parse_meters(value)?;
            }
            ConfigKey::RequestTimeoutSecs => {
                request.timeout = Duration::from_secs(self.parse_value(value)?);
            }
            ConfigKey::LoggingLevel => {
                let level = value.trim();
                if level.is_empty() {
                    return Err(self.invalid(value));
                }
                config.logging.level = level.to_string();
            }
            ConfigKey::LoggingFile => {
                let file = value.trim();
                config.logging.file = (!file.is_empty()).then(|| PathBuf::from(file));
            }
        }
        Ok(())
    }

    fn parse_value<T: FromStr>(&self, value: &str) -> Result<T, ConfigError> {
        value.trim().parse().map_err(|_| self.invalid(value))
    }

    fn parse_meters(&self, value: &str) -> Result<f64, ConfigError> {
        let meters: f64 = self.parse_value(value)?;
        if !meters.is_finite() || meters < 0.0 {
            return Err(self.invalid(value));
        }
        Ok(meters)
    }

    fn invalid(&self, value: &str) -> ConfigError {
        ConfigError::InvalidValue {
            section: self.section(),
            key: self.key_name(),
            value: value.to_string(),
        }
    }
}

impl FromStr for ConfigKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_lowercase();
        ConfigKey::all()
            .iter()
            .copied()
            .find(|key| key.name() == name)
            .ok_or_else(|| ConfigError::UnknownKey(s.to_string()))
    }
}
