//! # EduBot Core
//!
//! Core business logic for the EduBot empathetic tutoring backend.
//!
//! ## Architecture
//!
//! ```text
//! edubot-core/src/
//! ├── dispatch/   # credential rotation, model pick, admission gate, retry loop, fallback
//! ├── quota/      # sliding-window per-identity prompt quota
//! ├── service/    # chat orchestration, emotion classifier seam, conversation store
//! ├── modules/    # env config loading, logging init, token issuing
//! └── monitor.rs  # interaction record buffer + JSONL sink
//! ```
//!
//! A student message flows: quota check → classification → dispatch (gate,
//! retries, fallback) → conversation append → quota record → interaction log.

#![allow(
    clippy::significant_drop_tightening,
    reason = "DashMap guards in async code require careful lifetime management"
)]
#![allow(
    clippy::redundant_else,
    reason = "Explicit else blocks improve readability in complex control flow"
)]
#![allow(clippy::map_err_ignore, reason = "Error context is provided in the replacement message")]
#![allow(
    clippy::derive_partial_eq_without_eq,
    reason = "Some types intentionally don't implement Eq"
)]
// Test-only lints: allow panic!, println!, etc. in test code
#![cfg_attr(
    test,
    allow(
        clippy::panic,
        clippy::print_stdout,
        clippy::float_cmp,
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::assertions_on_result_states
    )
)]

pub mod dispatch;
pub mod error;
pub mod modules;
pub mod monitor;
pub mod quota;
pub mod service;

// Re-export commonly used types
pub use dispatch::{AdmissionGate, CredentialRotator, Dispatcher, FallbackResponder, ModelSelector};
pub use error::{AppError, AppResult};
pub use monitor::InteractionMonitor;
pub use quota::QuotaTracker;
pub use service::ChatService;
