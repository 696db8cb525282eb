//! Core domain models for EduBot.
//!
//! This module contains all shared data structures used across the EduBot workspace.

mod config;
mod conversation;
mod dispatch;
mod emotion;
mod interaction;
mod stats;

// Re-export all models
pub use config::{AppConfig, DispatchConfig, GateConfig, LogConfig, QuotaConfig};
pub use conversation::{
    Conversation, ConversationMessage, ConversationSummary, Sender, DEFAULT_CONVERSATION_TITLE,
};
pub use dispatch::{
    AttemptOutcome, DispatchOutcome, DispatchState, FallbackKind, PoolStatus, RequestAttempt,
};
pub use emotion::{Emotion, EmotionReading};
pub use interaction::{InteractionRecord, SystemLoad};
pub use stats::{GateStats, QuotaOverview, QuotaStatus};
