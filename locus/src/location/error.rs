//! Positioning failures reported by the platform.

use thiserror::Error;

/// A positioning failure reported by the location provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    /// The provider could not determine a position right now.
    #[error("Location currently unknown")]
    LocationUnknown,

    /// Access to location services was denied.
    #[error("Location access denied")]
    Denied,

    /// A network-assisted positioning source failed.
    #[error("Network error: {0}")]
    Network(String),

    /// The provider could not be started or is not available on this host.
    #[error("Location provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Any other provider-specific failure.
    #[error("Positioning failed: {0}")]
    Other(String),
}

impl LocationError {
    /// Whether this failure is really an authorization refusal.
    pub fn is_denied(&self) -> bool {
        matches!(self, LocationError::Denied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(
            LocationError::Network("timeout".to_string()).to_string(),
            "Network error: timeout"
        );
        assert!(LocationError::Denied.is_denied());
        assert!(!LocationError::LocationUnknown.is_denied());
    }
}
