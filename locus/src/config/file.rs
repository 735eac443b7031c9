//! INI configuration file.
//!
//! Lives at `~/.locus/config.ini`:
//!
//! ```ini
//! [request]
//! time_relevance_secs = 60
//! desired_accuracy_m = 10
//! min_accuracy_m = 1000
//! timeout_secs = 30
//!
//! [logging]
//! level = info
//! file = /tmp/locus.log
//! ```
//!
//! Missing keys keep their defaults; a missing file is the same as an empty one.

use std::path::{Path, PathBuf};

use ini::Ini;
use thiserror::Error;

use super::{CenterConfig, ConfigKey, RequestDefaults};

pub(super) const REQUEST_SECTION: &str = "request";
pub(super) const LOGGING_SECTION: &str = "logging";

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Errors reading or writing the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error reading or writing the file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid INI.
    #[error("Failed to parse config file: {0}")]
    Parse(String),

    /// A key has a value of the wrong shape.
    #[error("Invalid value '{value}' for {section}.{key}")]
    InvalidValue {
        section: &'static str,
        key: &'static str,
        value: String,
    },

    /// The key does not name a known setting.
    #[error("Unknown configuration key '{0}'")]
    UnknownKey(String),

    /// No home directory to place the config file in.
    #[error("Could not determine home directory")]
    NoHomeDirectory,
}

/// Logging section of the config file.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    /// Default filter directive (overridden by `RUST_LOG`).
    pub level: String,
    /// Optional log file; logs go to stderr when unset.
    pub file: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            file: None,
        }
    }
}

/// Parsed configuration file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigFile {
    /// Request defaults.
    pub request: RequestDefaults,
    /// Logging settings.
    pub logging: LoggingSettings,
}

/// Path of the user configuration file.
pub fn config_file_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".locus").join("config.ini"))
}

impl ConfigFile {
    /// Load from the default location, falling back to defaults if it is absent.
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_file_path().ok_or(ConfigError::NoHomeDirectory)?;
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Load from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse INI text.
    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
        let mut config = Self::default();
        for key in ConfigKey::all() {
            if let Some(value) = ini.get_from(Some(key.section()), key.key_name()) {
                key.set(&mut config, value)?;
            }
        }
        Ok(config)
    }

    /// Write to the default location, creating the directory if needed.
    pub fn save(&self) -> Result<PathBuf, ConfigError> {
        let path = config_file_path().ok_or(ConfigError::NoHomeDirectory)?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Write to an explicit path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut ini = Ini::new();
        for key in ConfigKey::all() {
            let value = key.get(self);
            if !value.is_empty() {
                ini.with_section(Some(key.section()))
                    .set(key.key_name(), value);
            }
        }

        ini.write_to_file(path)?;
        Ok(())
    }

    /// Center configuration derived from this file.
    pub fn center_config(&self) -> CenterConfig {
        CenterConfig::default().with_defaults(self.request.clone())
    }
}
