//! Error-handling policy applied when a tick callback fails

use serde::{Deserialize, Serialize};

/// Response to a tick callback failure.
///
/// The policy is read at the moment each failure is handled, so a
/// `set_policy` call takes effect for the next failure that occurs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Discard the failure silently and keep going
    Ignore,
    /// Notify error subscribers with the failure and keep going
    LogAndContinue,
    /// Notify error subscribers, then disarm the scheduler
    Stop,
}

impl Default for ErrorPolicy {
    fn default() -> Self {
        ErrorPolicy::LogAndContinue
    }
}

impl std::fmt::Display for ErrorPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorPolicy::Ignore => write!(f, "ignore"),
            ErrorPolicy::LogAndContinue => write!(f, "log_and_continue"),
            ErrorPolicy::Stop => write!(f, "stop"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_default() {
        assert_eq!(ErrorPolicy::default(), ErrorPolicy::LogAndContinue);
    }

    #[test]
    fn test_policy_display() {
        assert_eq!(ErrorPolicy::Ignore.to_string(), "ignore");
        assert_eq!(ErrorPolicy::LogAndContinue.to_string(), "log_and_continue");
        assert_eq!(ErrorPolicy::Stop.to_string(), "stop");
    }

    #[test]
    fn test_policy_serialization() {
        let json = serde_json::to_string(&ErrorPolicy::Stop).unwrap();
        assert_eq!(json, "\"stop\"");

        let policy: ErrorPolicy = serde_json::from_str("\"log_and_continue\"").unwrap();
        assert_eq!(policy, ErrorPolicy::LogAndContinue);
    }

    #[test]
    fn test_unknown_policy_rejected() {
        // Unrecognized policy values are a configuration error and must
        // fail at the deserialization boundary.
        let result = serde_json::from_str::<ErrorPolicy>("\"retry\"");
        assert!(result.is_err());
    }
}
