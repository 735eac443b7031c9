//! Platform authorization state.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Whether the host platform lets this process receive locations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthorizationStatus {
    /// The user has not been asked yet.
    NotDetermined,
    /// Access is blocked by policy (parental controls, MDM, ...).
    Restricted,
    /// The user refused access.
    Denied,
    /// Access granted at all times.
    AuthorizedAlways,
    /// Access granted while the app is in use.
    AuthorizedWhenInUse,
}

impl AuthorizationStatus {
    /// Whether readings can be delivered.
    pub fn is_authorized(&self) -> bool {
        matches!(
            self,
            AuthorizationStatus::AuthorizedAlways | AuthorizationStatus::AuthorizedWhenInUse
        )
    }

    /// Whether access has been definitively refused.
    ///
    /// Requests cannot succeed in this state and are finished with
    /// `NotProperlyAuthorized`.
    pub fn is_refused(&self) -> bool {
        matches!(
            self,
            AuthorizationStatus::Denied | AuthorizationStatus::Restricted
        )
    }

    /// Stable snake_case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthorizationStatus::NotDetermined => "not_determined",
            AuthorizationStatus::Restricted => "restricted",
            AuthorizationStatus::Denied => "denied",
            AuthorizationStatus::AuthorizedAlways => "always",
            AuthorizationStatus::AuthorizedWhenInUse => "when_in_use",
        }
    }
}

impl fmt::Display for AuthorizationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when an authorization status name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown authorization status '{0}'")]
pub struct ParseAuthorizationError(String);

impl FromStr for AuthorizationStatus {
    type Err = ParseAuthorizationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "not_determined" => Ok(AuthorizationStatus::NotDetermined),
            "restricted" => Ok(AuthorizationStatus::Restricted),
            "denied" => Ok(AuthorizationStatus::Denied),
            "always" | "authorized_always" => Ok(AuthorizationStatus::AuthorizedAlways),
            "when_in_use" | "authorized_when_in_use" => {
                Ok(AuthorizationStatus::AuthorizedWhenInUse)
            }
            _ => Err(ParseAuthorizationError(s.to_string())),
        }
    }
}
