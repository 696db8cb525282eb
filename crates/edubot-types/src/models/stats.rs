//! Statistics and monitoring models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Admission gate counters.
///
/// Counters are read independently, so a snapshot taken under load may mix
/// values from slightly different instants.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct GateStats {
    /// Logical requests admitted since startup
    pub total_attempted: u64,
    /// Admitted requests whose wrapped operation failed
    pub total_failed: u64,
    /// Percentage of admitted requests that did not fail
    pub success_rate: f64,
    /// Maximum concurrently held permits
    pub capacity: usize,
    /// Permits held right now
    pub in_flight: usize,
}

impl GateStats {
    pub fn success_rate(total_attempted: u64, total_failed: u64) -> f64 {
        let succeeded = total_attempted.saturating_sub(total_failed);
        succeeded as f64 / total_attempted.max(1) as f64 * 100.0
    }
}

/// Quota usage for one identity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuotaStatus {
    /// Short fingerprint of the identity (never the raw token)
    pub identity: String,
    pub used: u32,
    pub remaining: u32,
    pub max: u32,
    pub allowed: bool,
    /// Set only when the identity is at its limit
    pub next_reset: Option<DateTime<Utc>>,
    pub window_hours: u64,
}

/// Aggregate quota usage across identities.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuotaOverview {
    pub enabled: bool,
    pub active_identities: usize,
    pub total_prompts: usize,
    pub identities_at_limit: usize,
    pub max_per_window: u32,
    pub window_hours: u64,
    pub timestamp: DateTime<Utc>,
}
