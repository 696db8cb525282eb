//! Research interaction log record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Above this end-to-end duration the system is reported as under high load.
pub const HIGH_LOAD_THRESHOLD_MS: f64 = 5000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SystemLoad {
    Normal,
    High,
}

impl SystemLoad {
    pub fn from_total_ms(total_ms: f64) -> Self {
        if total_ms < HIGH_LOAD_THRESHOLD_MS {
            Self::Normal
        } else {
            Self::High
        }
    }
}

/// One student interaction, as written to the interaction log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionRecord {
    pub timestamp: DateTime<Utc>,
    pub student_message: String,
    pub ai_response: String,
    pub emotion: String,
    pub emotion_confidence: f64,
    /// e.g. `Bingung(0.912), Netral(0.050)`
    pub top_emotions: String,
    pub classifier: String,
    pub emotion_time_ms: f64,
    pub llm_model: String,
    /// Last 6 characters of the credential that answered, or `unknown`
    pub api_key_ending: String,
    pub llm_time_ms: f64,
    pub total_time_ms: f64,
    pub attempts: usize,
    pub fallback: bool,
    pub conversation_id: Option<String>,
    /// Fingerprint of the identity
    pub user: String,
    pub prompt_summary: String,
    pub available_keys: usize,
    pub system_load: SystemLoad,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_load_threshold() {
        assert_eq!(SystemLoad::from_total_ms(4999.0), SystemLoad::Normal);
        assert_eq!(SystemLoad::from_total_ms(5000.0), SystemLoad::High);
    }
}
