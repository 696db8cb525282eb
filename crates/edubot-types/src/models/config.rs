//! Application configuration.
//!
//! Every section carries serde defaults so partial documents deserialize, and
//! `validator` range checks that the loader runs once at startup.

use serde::{Deserialize, Serialize};
use validator::Validate;

pub const DEFAULT_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

/// Free OpenRouter models used when `EDUBOT_MODELS` is unset.
pub const DEFAULT_MODELS: &[&str] = &[
    "mistralai/mistral-7b-instruct:free",
    "google/gemini-2.0-flash-exp:free",
    "deepseek/deepseek-r1-0528-qwen3-8b:free",
    "z-ai/glm-4.5-air:free",
    "deepseek/deepseek-chat-v3.1:free",
];

/// Full application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Validate)]
pub struct AppConfig {
    #[serde(default)]
    #[validate(nested)]
    pub dispatch: DispatchConfig,
    #[serde(default)]
    #[validate(nested)]
    pub gate: GateConfig,
    #[serde(default)]
    #[validate(nested)]
    pub quota: QuotaConfig,
    #[serde(default)]
    pub log: LogConfig,
}

/// Downstream LLM call settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
pub struct DispatchConfig {
    /// Rotation pool. Never serialized.
    #[serde(default, skip_serializing)]
    pub credentials: Vec<String>,
    /// Candidate models, one picked per logical request
    #[serde(default = "default_models")]
    #[validate(length(min = 1_u64))]
    pub models: Vec<String>,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_max_tokens")]
    #[validate(range(min = 1_u32, max = 32_768_u32))]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    #[validate(range(min = 0.0, max = 2.0))]
    pub temperature: f32,
    #[serde(default = "default_top_p")]
    #[validate(range(min = 0.0, max = 1.0))]
    pub top_p: f32,
    /// Inner bound on a single outbound call; must stay below
    /// `request_timeout_secs`
    #[serde(default = "default_attempt_timeout")]
    #[validate(range(min = 1_u64, max = 600_u64))]
    pub attempt_timeout_secs: u64,
    /// Outer bound on a whole logical request, enforced by the caller
    #[serde(default = "default_request_timeout")]
    #[validate(range(min = 1_u64, max = 3600_u64))]
    pub request_timeout_secs: u64,
    /// Exponential backoff base (`base * 2^attempt`)
    #[serde(default = "default_base_backoff")]
    pub base_backoff_ms: u64,
    #[serde(default = "default_max_backoff")]
    pub max_backoff_ms: u64,
    #[serde(default = "default_pre_call_jitter_min")]
    pub pre_call_jitter_min_ms: u64,
    #[serde(default = "default_pre_call_jitter_max")]
    pub pre_call_jitter_max_ms: u64,
    #[serde(default = "default_rate_limit_jitter_min")]
    pub rate_limit_jitter_min_ms: u64,
    #[serde(default = "default_rate_limit_jitter_max")]
    pub rate_limit_jitter_max_ms: u64,
    /// Extra random delay added on connection failures
    #[serde(default = "default_connection_jitter_max")]
    pub connection_jitter_max_ms: u64,
    /// Prior turns forwarded as context
    #[serde(default = "default_context_turns")]
    #[validate(range(max = 50_usize))]
    pub context_turns: usize,
    /// Above this confidence the reply acknowledges the emotion
    #[serde(default = "default_ack_confidence")]
    #[validate(range(min = 0.0, max = 1.0))]
    pub acknowledge_confidence: f64,
    /// Above this confidence the reply carries a learning tip
    #[serde(default = "default_tip_confidence")]
    #[validate(range(min = 0.0, max = 1.0))]
    pub tip_confidence: f64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            credentials: Vec::new(),
            models: default_models(),
            api_url: default_api_url(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            attempt_timeout_secs: default_attempt_timeout(),
            request_timeout_secs: default_request_timeout(),
            base_backoff_ms: default_base_backoff(),
            max_backoff_ms: default_max_backoff(),
            pre_call_jitter_min_ms: default_pre_call_jitter_min(),
            pre_call_jitter_max_ms: default_pre_call_jitter_max(),
            rate_limit_jitter_min_ms: default_rate_limit_jitter_min(),
            rate_limit_jitter_max_ms: default_rate_limit_jitter_max(),
            connection_jitter_max_ms: default_connection_jitter_max(),
            context_turns: default_context_turns(),
            acknowledge_confidence: default_ack_confidence(),
            tip_confidence: default_tip_confidence(),
        }
    }
}

impl DispatchConfig {
    /// Whether a single attempt can time out before the caller's deadline.
    pub fn attempt_fits_deadline(&self) -> bool {
        self.attempt_timeout_secs < self.request_timeout_secs
    }

    /// Two passes over the pool, at least one attempt.
    pub fn max_attempts(&self) -> u32 {
        u32::try_from(self.credentials.len().saturating_mul(2)).unwrap_or(u32::MAX).max(1)
    }
}

/// Admission gate settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct GateConfig {
    /// Maximum concurrently admitted logical requests
    #[serde(default = "default_capacity")]
    #[validate(range(min = 1_usize, max = 10_000_usize))]
    pub capacity: usize,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self { capacity: default_capacity() }
    }
}

/// Per-identity prompt quota settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct QuotaConfig {
    /// Runtime toggle; disabled means every check passes
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_quota_max")]
    #[validate(range(min = 1_u32))]
    pub max_per_window: u32,
    #[serde(default = "default_window_hours")]
    #[validate(range(min = 1_u64, max = 8760_u64))]
    pub window_hours: u64,
    /// Whether canned fallback replies consume quota
    #[serde(default = "default_true")]
    pub charge_fallback: bool,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_per_window: default_quota_max(),
            window_hours: default_window_hours(),
            charge_fallback: true,
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LogConfig {
    /// Directory for the rolling application log and the interaction log
    #[serde(default = "default_log_dir")]
    pub dir: String,
    /// Append interaction records to `chat_logs.jsonl`
    #[serde(default = "default_true")]
    pub interaction_log: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { dir: default_log_dir(), interaction_log: true }
    }
}

fn default_models() -> Vec<String> {
    DEFAULT_MODELS.iter().map(|m| (*m).to_string()).collect()
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

const fn default_max_tokens() -> u32 {
    1000
}

const fn default_temperature() -> f32 {
    0.8
}

const fn default_top_p() -> f32 {
    0.9
}

const fn default_attempt_timeout() -> u64 {
    20
}

const fn default_request_timeout() -> u64 {
    30
}

const fn default_base_backoff() -> u64 {
    500
}

const fn default_max_backoff() -> u64 {
    30_000
}

const fn default_pre_call_jitter_min() -> u64 {
    50
}

const fn default_pre_call_jitter_max() -> u64 {
    300
}

const fn default_rate_limit_jitter_min() -> u64 {
    100
}

const fn default_rate_limit_jitter_max() -> u64 {
    300
}

const fn default_connection_jitter_max() -> u64 {
    1000
}

const fn default_context_turns() -> usize {
    5
}

const fn default_ack_confidence() -> f64 {
    0.85
}

const fn default_tip_confidence() -> f64 {
    0.7
}

const fn default_capacity() -> usize {
    50
}

const fn default_quota_max() -> u32 {
    3
}

const fn default_window_hours() -> u64 {
    24
}

const fn default_true() -> bool {
    true
}

fn default_log_dir() -> String {
    "logs".to_string()
}
