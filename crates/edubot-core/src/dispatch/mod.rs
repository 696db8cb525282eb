//! Downstream LLM dispatch.
//!
//! One logical request moves through `BuildingPrompt → Admitted →
//! Attempting(n) → Succeeded | Fallback`. Every attempt rotates to the next
//! credential; the model is chosen once per request. The caller always gets
//! text back, either live or canned.

mod backoff;
mod credentials;
mod dispatcher;
mod fallback;
mod gate;
mod model_selector;
pub mod prompt;
mod random;
mod upstream;

#[cfg(test)]
mod tests;

pub use backoff::BackoffPolicy;
pub use credentials::{Credential, CredentialRotator};
pub use dispatcher::{DispatchRequest, Dispatcher};
pub use fallback::FallbackResponder;
pub use gate::{AdmissionGate, AdmissionPermit};
pub use model_selector::ModelSelector;
pub use random::{RandomSource, SeededRandom, ThreadRandom};
pub use upstream::{ChatBackend, OpenRouterBackend, UpstreamFailure};
