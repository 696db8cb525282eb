//! Unified error types for EduBot Core.

use edubot_types::{ConfigError, QuotaError};
use serde::Serialize;
use thiserror::Error;

/// Main error type for all EduBot core operations.
///
/// Downstream LLM failures never appear here: the dispatch core folds
/// them into canned replies before returning.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum AppError {
    /// Configuration loading or validation failed.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The identity has no prompts left in the current window.
    #[error(transparent)]
    Quota(#[from] QuotaError),

    /// The student sent something we cannot process.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Conversation does not exist for this identity.
    #[error("Conversation not found: {0}")]
    ConversationNotFound(String),

    /// File system I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AppError {
    /// HTTP status code surfaced to API clients.
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::Quota(err) => err.http_status_code(),
            Self::InvalidRequest(_) => 400,
            Self::ConversationNotFound(_) => 404,
            Self::Config(_) | Self::Io(_) | Self::Json(_) => 500,
        }
    }
}

impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.to_string().as_str())
    }
}

/// Result type alias for EduBot core operations.
pub type AppResult<T> = Result<T, AppError>;
