//! Coordinator configuration.
//!
//! [`CenterConfig`] is what a [`crate::LocationCenter`] is built with.
//! [`ConfigFile`] is the user-editable INI file the CLI reads it from.

mod file;
mod key;

pub use file::{config_file_path, ConfigError, ConfigFile, LoggingSettings};
pub use key::ConfigKey;

use std::time::Duration;

/// Default maximum age of a reported reading in seconds.
pub const DEFAULT_TIME_RELEVANCE_SECS: u64 = 60;

/// Default accuracy at which a request finishes, in metres.
pub const DEFAULT_DESIRED_ACCURACY_M: f64 = 10.0;

/// Default coarsest accuracy still reported, in metres.
pub const DEFAULT_MIN_ACCURACY_M: f64 = 1000.0;

/// Default request deadline in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Constraints applied to requests that leave them unset.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDefaults {
    /// Maximum age of a reported reading.
    pub time_relevance: Duration,
    /// Accuracy in metres at which a request finishes successfully.
    pub desired_accuracy: f64,
    /// Coarsest accuracy in metres still reported to the caller.
    pub min_accuracy: f64,
    /// Deadline measured from submission.
    pub timeout: Duration,
}

impl Default for RequestDefaults {
    fn default() -> Self {
        Self {
            time_relevance: Duration::from_secs(DEFAULT_TIME_RELEVANCE_SECS),
            desired_accuracy: DEFAULT_DESIRED_ACCURACY_M,
            min_accuracy: DEFAULT_MIN_ACCURACY_M,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl RequestDefaults {
    /// Set the freshness bound.
    pub fn with_time_relevance(mut self, time_relevance: Duration) -> Self {
        self.time_relevance = time_relevance;
        self
    }

    /// Set the desired accuracy.
    pub fn with_desired_accuracy(mut self, meters: f64) -> Self {
        self.desired_accuracy = meters;
        self
    }

    /// Set the minimum reported accuracy.
    pub fn with_min_accuracy(mut self, meters: f64) -> Self {
        self.min_accuracy = meters;
        self
    }

    /// Set the timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Configuration for a [`crate::LocationCenter`].
#[derive(Debug, Clone, PartialEq)]
pub struct CenterConfig {
    /// Constraints for requests that leave them unset.
    pub defaults: RequestDefaults,

    /// Pass the finest desired accuracy of the active requests to the provider.
    ///
    /// Default: true.
    pub accuracy_hint: bool,
}

impl Default for CenterConfig {
    fn default() -> Self {
        Self {
            defaults: RequestDefaults::default(),
            accuracy_hint: true,
        }
    }
}

impl CenterConfig {
    /// Set the request defaults.
    pub fn with_defaults(mut self, defaults: RequestDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// Enable or disable the provider accuracy hint.
    pub fn with_accuracy_hint(mut self, enabled: bool) -> Self {
        self.accuracy_hint = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults() {
        let defaults = RequestDefaults::default();
        assert_eq!(defaults.time_relevance, Duration::from_secs(60));
        assert_eq!(defaults.desired_accuracy, 10.0);
        assert_eq!(defaults.min_accuracy, 1000.0);
        assert_eq!(defaults.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_center_config_builder() {
        let config = CenterConfig::default()
            .with_defaults(RequestDefaults::default().with_timeout(Duration::from_secs(5)))
            .with_accuracy_hint(false);
        assert_eq!(config.defaults.timeout, Duration::from_secs(5));
        assert!(!config.accuracy_hint);
    }
}
