//! Tracing setup and log-safe identity rendering.

use std::path::Path;

use sha2::{Digest, Sha256};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

pub const LOG_FILE_PREFIX: &str = "edubot.log";

const FINGERPRINT_BYTES: usize = 6;

/// Installs the global subscriber: `EnvFilter` (falling back to
/// `default_level`), a stderr layer, and a daily-rolling file layer under
/// `log_dir` when that directory is usable.
///
/// The returned guard flushes the file writer on drop; hold it for the
/// process lifetime.
pub fn init_tracing(log_dir: Option<&Path>, default_level: &str) -> Option<WorkerGuard> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let mut dir_error = None;
    let (file_layer, guard) = match log_dir {
        Some(dir) => match std::fs::create_dir_all(dir) {
            Ok(()) => {
                let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
                let (writer, guard) = tracing_appender::non_blocking(appender);
                (Some(fmt::layer().with_ansi(false).with_writer(writer)), Some(guard))
            },
            Err(e) => {
                dir_error = Some(format!("{}: {}", dir.display(), e));
                (None, None)
            },
        },
        None => (None, None),
    };

    let result = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .try_init();

    if let Err(e) = result {
        tracing::warn!("Tracing subscriber already installed: {}", e);
    }
    if let Some(e) = dir_error {
        tracing::warn!("Failed to create log directory {}, file logging disabled", e);
    }
    guard
}

/// Short stable hash of an identity. Identities are bearer tokens, so only
/// this form goes into logs and API responses.
pub fn fingerprint(identity: &str) -> String {
    let digest = Sha256::digest(identity.as_bytes());
    digest[..FINGERPRINT_BYTES].iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_is_stable_and_opaque() {
        let a = fingerprint("token-abc");
        assert_eq!(a.len(), 12);
        assert_eq!(a, fingerprint("token-abc"));
        assert_ne!(a, fingerprint("token-abd"));
        assert!(!a.contains("token"));
    }
}
