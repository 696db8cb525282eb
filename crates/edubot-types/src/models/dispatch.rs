//! Dispatch audit models.
//!
//! A logical request produces one [`DispatchOutcome`] holding every
//! [`RequestAttempt`] it made. Attempts only exist for logging and auditing.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Flavour of canned reply served when live generation is exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackKind {
    Generic,
    RateLimited,
    Timeout,
    Connection,
}

impl FallbackKind {
    pub const ALL: [FallbackKind; 4] =
        [Self::Generic, Self::RateLimited, Self::Timeout, Self::Connection];
}

/// Classified result of one outbound call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "class", content = "status", rename_all = "snake_case")]
pub enum AttemptOutcome {
    /// 2xx with a non-empty answer
    Success,
    /// 2xx with an empty or malformed body
    Empty,
    /// HTTP 429
    RateLimited,
    /// HTTP 5xx
    ServerError(u16),
    /// Any other non-2xx status
    ClientError(u16),
    /// Per-attempt timeout elapsed
    Timeout,
    /// Could not reach the endpoint
    Connection,
    /// Anything else
    Unexpected,
}

impl AttemptOutcome {
    pub fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }

    /// Fallback flavour used when this is the final attempt.
    pub fn fallback_kind(self) -> FallbackKind {
        match self {
            Self::RateLimited => FallbackKind::RateLimited,
            Self::Timeout => FallbackKind::Timeout,
            Self::Connection => FallbackKind::Connection,
            Self::Success
            | Self::Empty
            | Self::ServerError(_)
            | Self::ClientError(_)
            | Self::Unexpected => FallbackKind::Generic,
        }
    }
}

impl fmt::Display for AttemptOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => f.write_str("success"),
            Self::Empty => f.write_str("malformed-response"),
            Self::RateLimited => f.write_str("rate-limited"),
            Self::ServerError(status) => write!(f, "server-error({status})"),
            Self::ClientError(status) => write!(f, "client-error({status})"),
            Self::Timeout => f.write_str("timeout"),
            Self::Connection => f.write_str("connection-error"),
            Self::Unexpected => f.write_str("unexpected"),
        }
    }
}

/// Record of one outbound call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestAttempt {
    /// 1-based attempt number within the logical request
    pub ordinal: u32,
    /// Last 6 characters of the credential used
    pub credential_tail: String,
    pub model: String,
    pub outcome: AttemptOutcome,
    pub latency_ms: u64,
    /// Delay slept after this attempt before the next one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backoff_ms: Option<u64>,
}

/// Terminal state of a logical request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchState {
    BuildingPrompt,
    Admitted,
    Attempting(u32),
    Succeeded,
    Fallback,
}

impl DispatchState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Fallback)
    }
}

/// Result of one logical "get an empathetic reply" request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchOutcome {
    pub text: String,
    pub state: DispatchState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<FallbackKind>,
    pub model: String,
    /// Credential tail of the successful attempt, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_tail: Option<String>,
    pub attempts: Vec<RequestAttempt>,
}

impl DispatchOutcome {
    pub fn is_live(&self) -> bool {
        self.state == DispatchState::Succeeded
    }
}

/// Snapshot of the rotation pool, for monitoring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStatus {
    pub total_keys: usize,
    pub key_endings: Vec<String>,
    pub models: Vec<String>,
    pub max_attempts: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_kind_mapping() {
        assert_eq!(AttemptOutcome::RateLimited.fallback_kind(), FallbackKind::RateLimited);
        assert_eq!(AttemptOutcome::Timeout.fallback_kind(), FallbackKind::Timeout);
        assert_eq!(AttemptOutcome::Connection.fallback_kind(), FallbackKind::Connection);
        assert_eq!(AttemptOutcome::ServerError(503).fallback_kind(), FallbackKind::Generic);
        assert_eq!(AttemptOutcome::ClientError(401).fallback_kind(), FallbackKind::Generic);
        assert_eq!(AttemptOutcome::Empty.fallback_kind(), FallbackKind::Generic);
    }

    #[test]
    fn test_outcome_display() {
        assert_eq!(AttemptOutcome::ServerError(502).to_string(), "server-error(502)");
        assert_eq!(AttemptOutcome::Empty.to_string(), "malformed-response");
    }

    #[test]
    fn test_terminal_states() {
        assert!(DispatchState::Succeeded.is_terminal());
        assert!(DispatchState::Fallback.is_terminal());
        assert!(!DispatchState::Attempting(2).is_terminal());
    }
}
