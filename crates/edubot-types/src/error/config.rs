//! Configuration-related errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while loading or validating configuration.
///
/// All of these are startup-time failures; none of them is expected per request.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "details")]
pub enum ConfigError {
    /// The credential rotation pool is empty
    #[error("No API credentials configured (set OPENROUTER_API_KEY_1..6 or OPENROUTER_API_KEY)")]
    NoCredentialsConfigured,

    /// The candidate model list is empty
    #[error("No candidate models configured")]
    NoModelsConfigured,

    /// A raw value could not be parsed into the expected type
    #[error("Config parse error for {key}: {message}")]
    ParseError {
        /// Environment key that held the bad value
        key: String,
        /// Description of the parse failure
        message: String,
    },

    /// Config validation error (value out of range, malformed URL, ...)
    #[error("Config validation error for {field}: {message}")]
    ValidationError {
        /// Name of the field that failed validation
        field: String,
        /// Description of the validation failure
        message: String,
    },
}

impl ConfigError {
    /// Build a parse error for an environment key.
    pub fn parse(key: &str, message: impl Into<String>) -> Self {
        Self::ParseError { key: key.to_string(), message: message.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display_names_key() {
        let err = ConfigError::parse("CONCURRENCY_CAP", "invalid digit found in string");
        let msg = err.to_string();
        assert!(msg.contains("CONCURRENCY_CAP"));
        assert!(msg.contains("invalid digit"));
    }
}
