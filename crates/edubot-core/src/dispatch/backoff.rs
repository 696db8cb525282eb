//! Delay policy between attempts of one logical request.
//!
//! Every retryable outcome goes through [`BackoffPolicy::delay_for`] and then
//! one async sleep, so no branch ever blocks a runtime worker.

use std::time::Duration;

use edubot_types::{AttemptOutcome, DispatchConfig};

use super::random::RandomSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub base_ms: u64,
    pub max_ms: u64,
    pub rate_limit_min_ms: u64,
    pub rate_limit_max_ms: u64,
    pub connection_jitter_max_ms: u64,
}

impl BackoffPolicy {
    pub fn from_config(config: &DispatchConfig) -> Self {
        Self {
            base_ms: config.base_backoff_ms,
            max_ms: config.max_backoff_ms,
            rate_limit_min_ms: config.rate_limit_jitter_min_ms,
            rate_limit_max_ms: config.rate_limit_jitter_max_ms,
            connection_jitter_max_ms: config.connection_jitter_max_ms,
        }
    }

    /// `base * 2^attempt_index`, capped at `max_ms`.
    pub fn exponential_ms(&self, attempt_index: u32) -> u64 {
        self.base_ms.saturating_mul(2_u64.saturating_pow(attempt_index)).min(self.max_ms)
    }

    /// Delay before the attempt following a failed one.
    ///
    /// `attempt_index` is zero-based. A 429 only waits a short random interval
    /// since the next attempt uses a different credential anyway.
    pub fn delay_for(
        &self,
        outcome: AttemptOutcome,
        attempt_index: u32,
        rng: &dyn RandomSource,
    ) -> Duration {
        let ms = match outcome {
            AttemptOutcome::Success => 0,
            AttemptOutcome::RateLimited => {
                rng.uniform_ms(self.rate_limit_min_ms, self.rate_limit_max_ms)
            },
            AttemptOutcome::Connection => self
                .exponential_ms(attempt_index)
                .saturating_add(rng.uniform_ms(0, self.connection_jitter_max_ms)),
            AttemptOutcome::Empty
            | AttemptOutcome::ServerError(_)
            | AttemptOutcome::ClientError(_)
            | AttemptOutcome::Timeout
            | AttemptOutcome::Unexpected => self.exponential_ms(attempt_index),
        };
        Duration::from_millis(ms)
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::from_config(&DispatchConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::random::SeededRandom;

    #[test]
    fn test_exponential_doubles_and_caps() {
        let policy = BackoffPolicy { max_ms: 3000, ..BackoffPolicy::default() };
        assert_eq!(policy.exponential_ms(0), 500);
        assert_eq!(policy.exponential_ms(1), 1000);
        assert_eq!(policy.exponential_ms(2), 2000);
        assert_eq!(policy.exponential_ms(3), 3000);
        assert_eq!(policy.exponential_ms(60), 3000);
    }

    #[test]
    fn test_rate_limited_uses_short_jitter() {
        let policy = BackoffPolicy::default();
        let rng = SeededRandom::new(11);
        for index in 0..10 {
            let delay = policy.delay_for(AttemptOutcome::RateLimited, index, &rng);
            assert!(delay >= Duration::from_millis(100));
            assert!(delay <= Duration::from_millis(300));
        }
    }

    #[test]
    fn test_connection_adds_jitter_on_top() {
        let policy = BackoffPolicy::default();
        let rng = SeededRandom::new(5);
        let delay = policy.delay_for(AttemptOutcome::Connection, 1, &rng);
        assert!(delay >= Duration::from_millis(1000));
        assert!(delay <= Duration::from_millis(2000));
    }

    #[test]
    fn test_server_error_sequence_non_decreasing() {
        let policy = BackoffPolicy::default();
        let rng = SeededRandom::new(1);
        let delays: Vec<Duration> = (0..12)
            .map(|i| policy.delay_for(AttemptOutcome::ServerError(500), i, &rng))
            .collect();
        assert!(delays.windows(2).all(|w| w[0] <= w[1]));
    }
}
