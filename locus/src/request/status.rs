//! Terminal statuses and callback decisions.

use std::fmt;

/// Why a request finished.
///
/// Every submitted request finishes exactly once with exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FinishStatus {
    /// A reading met the desired accuracy, or the caller asked to stop.
    ReachedAccuracy,
    /// The caller cancelled the request.
    Canceled,
    /// The deadline passed before the desired accuracy was reached.
    TimedOut,
    /// The platform reported a positioning failure before any reading was accepted.
    Error,
    /// Location access is denied or restricted.
    NotProperlyAuthorized,
}

impl FinishStatus {
    /// All statuses, in declaration order.
    pub const ALL: [FinishStatus; 5] = [
        FinishStatus::ReachedAccuracy,
        FinishStatus::Canceled,
        FinishStatus::TimedOut,
        FinishStatus::Error,
        FinishStatus::NotProperlyAuthorized,
    ];

    /// Human-readable description.
    pub fn as_str(&self) -> &'static str {
        match self {
            FinishStatus::ReachedAccuracy => "Reached desired accuracy",
            FinishStatus::Canceled => "Canceled",
            FinishStatus::TimedOut => "Timed out",
            FinishStatus::Error => "Error",
            FinishStatus::NotProperlyAuthorized => "Not properly authorized",
        }
    }

    /// Whether this is the success status.
    pub fn is_success(&self) -> bool {
        matches!(self, FinishStatus::ReachedAccuracy)
    }
}

impl fmt::Display for FinishStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Format a finish status for display.
pub fn string_for_finish_status(status: FinishStatus) -> &'static str {
    status.as_str()
}

/// What a "new best location" callback wants the coordinator to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Decision {
    /// Keep the request running.
    #[default]
    Continue,
    /// Finish the request now with `ReachedAccuracy`.
    Finish,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strings_are_distinct() {
        let mut seen = std::collections::HashSet::new();
        for status in FinishStatus::ALL {
            assert!(seen.insert(string_for_finish_status(status)));
            assert_eq!(status.to_string(), status.as_str());
        }
    }

    #[test]
    fn test_only_reached_accuracy_is_success() {
        let successes: Vec<_> = FinishStatus::ALL
            .into_iter()
            .filter(FinishStatus::is_success)
            .collect();
        assert_eq!(successes, vec![FinishStatus::ReachedAccuracy]);
    }

    #[test]
    fn test_decision_defaults_to_continue() {
        assert_eq!(Decision::default(), Decision::Continue);
    }
}
