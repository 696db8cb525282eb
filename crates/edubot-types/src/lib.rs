//! # EduBot Types
//!
//! Core types, models, and error definitions for the EduBot chat backend.
//!
//! - **`error`** - Typed error hierarchy for configuration and quota
//! - **`models`** - Domain models (emotion, conversation, dispatch audit, stats, config)
//! - **`protocol`** - OpenAI-compatible chat completion wire types
//!
//! ## Architecture Role
//!
//! `edubot-types` sits at the bottom of the dependency graph:
//!
//! ```text
//!          edubot-types (this crate)
//!                  │
//!                  ▼
//!             edubot-core
//!                  │
//!                  ▼
//!            edubot-server
//! ```

pub mod error;
pub mod models;
pub mod protocol;

// Re-export error types for convenience
pub use error::{ConfigError, QuotaError, Result, TypedError};

// Re-export core model types
pub use models::{
    AppConfig, AttemptOutcome, Conversation, ConversationMessage, ConversationSummary,
    DispatchConfig, DispatchOutcome, DispatchState, Emotion, EmotionReading, FallbackKind,
    GateConfig, GateStats, InteractionRecord, LogConfig, PoolStatus, QuotaConfig, QuotaOverview,
    QuotaStatus, RequestAttempt, Sender,
};
