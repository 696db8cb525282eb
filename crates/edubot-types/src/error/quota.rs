//! Per-identity quota errors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Raised when an identity has used up its prompts for the current window.
///
/// Non-retryable by the system: callers must wait for the window to roll.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "details")]
pub enum QuotaError {
    #[error("Daily prompt limit reached ({used}/{max}). Try again after the window resets.")]
    Exceeded {
        used: u32,
        max: u32,
        /// When the oldest counted prompt leaves the window
        next_reset: Option<DateTime<Utc>>,
    },
}

impl QuotaError {
    /// HTTP status code surfaced to the student.
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::Exceeded { .. } => 429,
        }
    }
}
