//! Environment-driven configuration loading.
//!
//! All keys are optional except the credential pool. The lookup function is
//! injectable so tests never touch the process environment.

use std::str::FromStr;

use edubot_types::{AppConfig, ConfigError, LogConfig};
use tracing::info;
use validator::Validate;

/// Numbered rotation-pool keys, tried in order.
pub const CREDENTIAL_KEYS: [&str; 6] = [
    "OPENROUTER_API_KEY_1",
    "OPENROUTER_API_KEY_2",
    "OPENROUTER_API_KEY_3",
    "OPENROUTER_API_KEY_4",
    "OPENROUTER_API_KEY_5",
    "OPENROUTER_API_KEY_6",
];
/// Single key used only when no numbered key is set.
pub const FALLBACK_CREDENTIAL_KEY: &str = "OPENROUTER_API_KEY";

pub const API_URL_KEY: &str = "OPENROUTER_API_URL";
pub const MODELS_KEY: &str = "EDUBOT_MODELS";
pub const CONCURRENCY_CAP_KEY: &str = "CONCURRENCY_CAP";
pub const QUOTA_MAX_KEY: &str = "PROMPT_LIMIT_MAX";
pub const QUOTA_WINDOW_KEY: &str = "PROMPT_LIMIT_WINDOW_HOURS";
pub const QUOTA_ENABLED_KEY: &str = "PROMPT_LIMIT_ENABLED";
pub const QUOTA_CHARGE_FALLBACK_KEY: &str = "PROMPT_LIMIT_CHARGE_FALLBACK";
pub const LOG_DIR_KEY: &str = "EDUBOT_LOG_DIR";
pub const ATTEMPT_TIMEOUT_KEY: &str = "EDUBOT_ATTEMPT_TIMEOUT_SECS";
pub const REQUEST_TIMEOUT_KEY: &str = "EDUBOT_REQUEST_TIMEOUT_SECS";

/// Loads from the process environment.
pub fn load_from_env() -> Result<AppConfig, ConfigError> {
    load_with(|key| std::env::var(key).ok())
}

/// Log directory alone, so tracing can start before the full load.
pub fn log_dir_from_env() -> String {
    log_dir_with(|key| std::env::var(key).ok())
}

pub fn log_dir_with<F>(lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    lookup(LOG_DIR_KEY)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| LogConfig::default().dir)
}

/// Loads using `lookup` for every key, then validates.
pub fn load_with<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
    let mut config = AppConfig::default();

    config.dispatch.credentials = collect_credentials(&get);
    if config.dispatch.credentials.is_empty() {
        return Err(ConfigError::NoCredentialsConfigured);
    }

    if let Some(url) = get(API_URL_KEY) {
        config.dispatch.api_url = url;
    }
    url::Url::parse(&config.dispatch.api_url)
        .map_err(|e| ConfigError::parse(API_URL_KEY, e.to_string()))?;

    if let Some(models) = get(MODELS_KEY) {
        config.dispatch.models = models
            .split(',')
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_string)
            .collect();
    }

    if let Some(capacity) = parse(&get, CONCURRENCY_CAP_KEY)? {
        config.gate.capacity = capacity;
    }
    if let Some(max) = parse(&get, QUOTA_MAX_KEY)? {
        config.quota.max_per_window = max;
    }
    if let Some(hours) = parse(&get, QUOTA_WINDOW_KEY)? {
        config.quota.window_hours = hours;
    }
    if let Some(enabled) = parse_bool(&get, QUOTA_ENABLED_KEY)? {
        config.quota.enabled = enabled;
    }
    if let Some(charge) = parse_bool(&get, QUOTA_CHARGE_FALLBACK_KEY)? {
        config.quota.charge_fallback = charge;
    }
    config.log.dir = log_dir_with(&lookup);
    if let Some(secs) = parse(&get, ATTEMPT_TIMEOUT_KEY)? {
        config.dispatch.attempt_timeout_secs = secs;
    }
    if let Some(secs) = parse(&get, REQUEST_TIMEOUT_KEY)? {
        config.dispatch.request_timeout_secs = secs;
    }

    config.validate().map_err(|e| ConfigError::ValidationError {
        field: "config".to_string(),
        message: e.to_string(),
    })?;
    if !config.dispatch.attempt_fits_deadline() {
        return Err(ConfigError::ValidationError {
            field: ATTEMPT_TIMEOUT_KEY.to_string(),
            message: format!(
                "attempt timeout ({}s) must be shorter than the request timeout ({}s)",
                config.dispatch.attempt_timeout_secs, config.dispatch.request_timeout_secs
            ),
        });
    }

    info!(
        keys = config.dispatch.credentials.len(),
        models = config.dispatch.models.len(),
        capacity = config.gate.capacity,
        quota_max = config.quota.max_per_window,
        quota_window_hours = config.quota.window_hours,
        quota_enabled = config.quota.enabled,
        "Configuration loaded"
    );
    Ok(config)
}

/// Numbered keys in order, de-duplicated; the single key only if none set.
fn collect_credentials(get: &dyn Fn(&str) -> Option<String>) -> Vec<String> {
    let mut keys: Vec<String> = Vec::new();
    for name in CREDENTIAL_KEYS {
        if let Some(key) = get(name) {
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
    }
    if keys.is_empty() {
        keys.extend(get(FALLBACK_CREDENTIAL_KEY));
    }
    keys
}

fn parse<T>(get: &dyn Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get(key)
        .map(|raw| raw.parse::<T>().map_err(|e| ConfigError::parse(key, e.to_string())))
        .transpose()
}

fn parse_bool(get: &dyn Fn(&str) -> Option<String>, key: &str) -> Result<Option<bool>, ConfigError> {
    get(key)
        .map(|raw| match raw.to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            other => Err(ConfigError::parse(key, format!("expected a boolean, got '{other}'"))),
        })
        .transpose()
}
