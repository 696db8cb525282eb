//! Test helpers for edubot-server unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::http::{header::AUTHORIZATION, HeaderMap, HeaderValue};

use edubot_core::dispatch::{
    AdmissionGate, ChatBackend, Credential, Dispatcher, SeededRandom, UpstreamFailure,
};
use edubot_core::service::{InMemoryConversationStore, LexiconClassifier};
use edubot_core::{ChatService, InteractionMonitor, QuotaTracker};
use edubot_types::protocol::ChatCompletionRequest;
use edubot_types::{DispatchConfig, QuotaConfig};

use crate::state::AppState;

pub const TUTOR_REPLY: &str = "Let's break the problem into small steps.";

/// Downstream stand-in that always answers the same way.
pub struct StubBackend {
    reply: Result<String, UpstreamFailure>,
    calls: AtomicUsize,
}

impl StubBackend {
    pub fn answering(text: &str) -> Self {
        Self { reply: Ok(text.to_string()), calls: AtomicUsize::new(0) }
    }

    pub fn failing(failure: UpstreamFailure) -> Self {
        Self { reply: Err(failure), calls: AtomicUsize::new(0) }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatBackend for StubBackend {
    async fn complete(
        &self,
        _credential: &Credential,
        _request: &ChatCompletionRequest,
        _timeout: Duration,
    ) -> Result<String, UpstreamFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reply.clone()
    }
}

/// `AppState` over in-memory collaborators, a two-key pool and the given
/// per-identity prompt limit.
pub fn test_app_state_with(backend: Arc<StubBackend>, max_per_window: u32) -> AppState {
    let config = DispatchConfig {
        credentials: vec!["sk-or-v1-test-111111".into(), "sk-or-v1-test-222222".into()],
        models: vec!["test/model:free".into()],
        pre_call_jitter_min_ms: 0,
        pre_call_jitter_max_ms: 0,
        ..DispatchConfig::default()
    };
    let dispatcher = Dispatcher::new(
        config,
        Arc::new(AdmissionGate::new(4)),
        backend,
        Arc::new(SeededRandom::new(7)),
    )
    .expect("failed to create test dispatcher");
    let quota =
        QuotaTracker::with_system_clock(&QuotaConfig { max_per_window, ..QuotaConfig::default() });

    AppState::new(ChatService::new(
        Arc::new(dispatcher),
        Arc::new(quota),
        Arc::new(LexiconClassifier),
        Arc::new(InMemoryConversationStore::new()),
        Arc::new(InteractionMonitor::new()),
    ))
}

pub fn test_app_state() -> AppState {
    test_app_state_with(Arc::new(StubBackend::answering(TUTOR_REPLY)), 3)
}

pub fn bearer(token: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    let value = HeaderValue::from_str(&format!("Bearer {token}")).expect("valid header value");
    headers.insert(AUTHORIZATION, value);
    headers
}
