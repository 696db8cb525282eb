//! Per-identity sliding-window prompt quota.
//!
//! Each identity owns a queue of timestamps, oldest first. Entries that fell
//! out of the window are evicted lazily whenever the identity is read.

mod clock;


pub use clock::{Clock, ManualClock, SystemClock};

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use edubot_types::{QuotaConfig, QuotaError, QuotaOverview, QuotaStatus};
use tracing::{info, warn};

use crate::modules::logger::fingerprint;

/// Shared by every caller without an authorization token.
pub const UNKNOWN_USER: &str = "unknown_user";

/// Result of a quota check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaCheck {
    pub allowed: bool,
    pub used: u32,
    pub remaining: u32,
}

pub struct QuotaTracker {
    windows: DashMap<String, VecDeque<DateTime<Utc>>>,
    enabled: AtomicBool,
    max_per_window: u32,
    window: Duration,
    window_hours: u64,
    clock: Arc<dyn Clock>,
}

impl QuotaTracker {
    pub fn new(config: &QuotaConfig, clock: Arc<dyn Clock>) -> Self {
        let hours = i64::try_from(config.window_hours).unwrap_or(i64::MAX);
        info!(
            "QuotaTracker initialized: {} prompts per identity, resets every {} hours (enabled: {})",
            config.max_per_window, config.window_hours, config.enabled
        );
        Self {
            windows: DashMap::new(),
            enabled: AtomicBool::new(config.enabled),
            max_per_window: config.max_per_window,
            window: Duration::try_hours(hours).unwrap_or(Duration::MAX),
            window_hours: config.window_hours,
            clock,
        }
    }

    pub fn with_system_clock(config: &QuotaConfig) -> Self {
        Self::new(config, Arc::new(SystemClock))
    }

    /// Identity key from an `Authorization` header value.
    ///
    /// Strips a case-insensitive `Bearer ` prefix. Missing or blank tokens map
    /// to [`UNKNOWN_USER`].
    pub fn identity_from_authorization(header: Option<&str>) -> String {
        let token = header
            .map(str::trim)
            .map(|value| {
                let lower = value.to_ascii_lowercase();
                if lower == "bearer" {
                    ""
                } else if lower.starts_with("bearer ") {
                    value[7..].trim()
                } else {
                    value
                }
            })
            .unwrap_or_default();

        if token.is_empty() {
            UNKNOWN_USER.to_string()
        } else {
            token.to_string()
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
        info!("Prompt quota enforcement {}", if enabled { "enabled" } else { "disabled" });
    }

    pub fn max_per_window(&self) -> u32 {
        self.max_per_window
    }

    fn evict(window: &mut VecDeque<DateTime<Utc>>, cutoff: DateTime<Utc>) {
        while window.front().is_some_and(|oldest| *oldest < cutoff) {
            window.pop_front();
        }
    }

    fn cutoff_from(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_sub_signed(self.window).unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    fn cutoff(&self) -> DateTime<Utc> {
        self.cutoff_from(self.clock.now())
    }

    fn evaluate(&self, used: usize) -> QuotaCheck {
        let used = u32::try_from(used).unwrap_or(u32::MAX);
        QuotaCheck {
            allowed: used < self.max_per_window,
            used,
            remaining: self.max_per_window.saturating_sub(used),
        }
    }

    /// Evicts expired entries, then compares against the limit.
    pub fn check(&self, identity: &str) -> QuotaCheck {
        if !self.is_enabled() {
            return QuotaCheck { allowed: true, used: 0, remaining: self.max_per_window };
        }

        let cutoff = self.cutoff();
        let used = match self.windows.get_mut(identity) {
            Some(mut window) => {
                Self::evict(&mut window, cutoff);
                window.len()
            },
            None => 0,
        };
        self.evaluate(used)
    }

    /// Like [`check`](Self::check), but a rejection becomes
    /// [`QuotaError::Exceeded`].
    pub fn ensure_allowed(&self, identity: &str) -> Result<QuotaCheck, QuotaError> {
        let check = self.check(identity);
        if check.allowed {
            return Ok(check);
        }
        warn!(
            identity = %fingerprint(identity),
            "Prompt limit reached ({}/{})",
            check.used,
            self.max_per_window
        );
        Err(QuotaError::Exceeded {
            used: check.used,
            max: self.max_per_window,
            next_reset: self.next_reset(identity),
        })
    }

    /// Consumes one prompt. Returns `false` without mutating when the
    /// identity is already at the limit.
    ///
    /// Check and append happen under one map entry lock, so two concurrent
    /// records cannot both take the last slot.
    pub fn record(&self, identity: &str) -> bool {
        if !self.is_enabled() {
            return true;
        }

        let now = self.clock.now();
        let cutoff = self.cutoff_from(now);
        let mut window = self.windows.entry(identity.to_string()).or_default();
        Self::evict(&mut window, cutoff);

        let check = self.evaluate(window.len());
        if !check.allowed {
            warn!(
                identity = %fingerprint(identity),
                "Identity exceeded prompt limit ({}/{})",
                check.used,
                self.max_per_window
            );
            return false;
        }

        window.push_back(now);
        info!(
            identity = %fingerprint(identity),
            "Prompt {}/{} recorded",
            check.used + 1,
            self.max_per_window
        );
        true
    }

    fn next_reset(&self, identity: &str) -> Option<DateTime<Utc>> {
        self.windows
            .get(identity)
            .and_then(|w| w.front().and_then(|oldest| oldest.checked_add_signed(self.window)))
    }

    /// Per-identity view; `next_reset` is only set at the limit.
    pub fn status(&self, identity: &str) -> QuotaStatus {
        let check = self.check(identity);
        let next_reset = if check.allowed { None } else { self.next_reset(identity) };
        QuotaStatus {
            identity: fingerprint(identity),
            used: check.used,
            remaining: check.remaining,
            max: self.max_per_window,
            allowed: check.allowed,
            next_reset,
            window_hours: self.window_hours,
        }
    }

    /// Evicts every identity, drops empty windows, then aggregates.
    pub fn overview(&self) -> QuotaOverview {
        let cutoff = self.cutoff();
        for mut window in self.windows.iter_mut() {
            Self::evict(&mut window, cutoff);
        }
        self.windows.retain(|_, window| !window.is_empty());

        let mut total_prompts = 0;
        let mut identities_at_limit = 0;
        for window in self.windows.iter() {
            total_prompts += window.len();
            if !self.evaluate(window.len()).allowed {
                identities_at_limit += 1;
            }
        }

        QuotaOverview {
            enabled: self.is_enabled(),
            active_identities: self.windows.len(),
            total_prompts,
            identities_at_limit,
            max_per_window: self.max_per_window,
            window_hours: self.window_hours,
            timestamp: self.clock.now(),
        }
    }
}
