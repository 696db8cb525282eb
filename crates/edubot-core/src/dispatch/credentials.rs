//! Round-robin credential rotation.

use edubot_types::ConfigError;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

const TAIL_LEN: usize = 6;

/// An opaque API key. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Last 6 characters, the only part that may appear in logs.
    pub fn tail(&self) -> String {
        let chars: Vec<char> = self.0.chars().collect();
        let start = chars.len().saturating_sub(TAIL_LEN);
        chars[start..].iter().collect()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credential(…{})", self.tail())
    }
}

/// Fixed pool handed out in strict round-robin order.
///
/// The cursor is a single atomic counter, so concurrent callers each get the
/// next slot and no credential is skipped or handed out twice in a row.
pub struct CredentialRotator {
    pool: Vec<Credential>,
    cursor: AtomicUsize,
}

impl CredentialRotator {
    /// Fails with [`ConfigError::NoCredentialsConfigured`] on an empty pool.
    pub fn new(pool: Vec<Credential>) -> Result<Self, ConfigError> {
        if pool.is_empty() {
            return Err(ConfigError::NoCredentialsConfigured);
        }
        Ok(Self { pool, cursor: AtomicUsize::new(0) })
    }

    pub fn from_secrets<I, S>(secrets: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(secrets.into_iter().map(Credential::new).collect())
    }

    /// Returns the credential at the cursor and advances it.
    pub fn next(&self) -> &Credential {
        let slot = self.cursor.fetch_add(1, Ordering::Relaxed) % self.pool.len();
        &self.pool[slot]
    }

    pub fn len(&self) -> usize {
        self.pool.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    /// Two passes over the pool.
    pub fn max_attempts(&self) -> u32 {
        u32::try_from(self.pool.len().saturating_mul(2)).unwrap_or(u32::MAX)
    }

    pub fn tails(&self) -> Vec<String> {
        self.pool.iter().map(Credential::tail).collect()
    }
}

impl fmt::Debug for CredentialRotator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialRotator")
            .field("pool", &self.tails())
            .field("cursor", &self.cursor.load(Ordering::Relaxed))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;

    #[test]
    fn test_empty_pool_rejected() {
        let result = CredentialRotator::new(Vec::new());
        assert!(matches!(result, Err(ConfigError::NoCredentialsConfigured)));
    }

    #[test]
    fn test_round_robin_order() {
        let rotator = CredentialRotator::from_secrets(["key-a", "key-b", "key-c"]).unwrap();
        let seen: Vec<&str> = (0..7).map(|_| rotator.next().expose()).collect();
        assert_eq!(seen, vec!["key-a", "key-b", "key-c", "key-a", "key-b", "key-c", "key-a"]);
    }

    #[test]
    fn test_max_attempts_is_twice_pool() {
        let rotator = CredentialRotator::from_secrets(["a", "b", "c"]).unwrap();
        assert_eq!(rotator.max_attempts(), 6);
    }

    #[test]
    fn test_tail_and_debug_hide_secret() {
        let credential = Credential::new("sk-or-v1-0123456789abcdef");
        assert_eq!(credential.tail(), "abcdef");
        let debug = format!("{credential:?}");
        assert!(!debug.contains("0123456789"));
        assert!(debug.contains("abcdef"));

        assert_eq!(Credential::new("abc").tail(), "abc");
    }

    #[test]
    fn test_concurrent_next_is_balanced() {
        let rotator = Arc::new(CredentialRotator::from_secrets(["a", "b", "c", "d"]).unwrap());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let rotator = Arc::clone(&rotator);
                std::thread::spawn(move || {
                    (0..100).map(|_| rotator.next().expose().to_string()).collect::<Vec<_>>()
                })
            })
            .collect();

        let mut counts: HashMap<String, usize> = HashMap::new();
        for handle in handles {
            for key in handle.join().unwrap() {
                *counts.entry(key).or_insert(0) += 1;
            }
        }
        assert_eq!(counts.len(), 4);
        assert!(counts.values().all(|&c| c == 200));
    }
}
