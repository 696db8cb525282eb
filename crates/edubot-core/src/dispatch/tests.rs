use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use edubot_types::protocol::{ChatCompletionRequest, OpenAIMessage};
use edubot_types::{
    AttemptOutcome, DispatchConfig, DispatchState, Emotion, EmotionReading, FallbackKind,
};
use parking_lot::Mutex;
use serde_json::json;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::*;

/// Replays a fixed script of results and records every call it receives.
struct ScriptedBackend {
    script: Mutex<VecDeque<Result<String, UpstreamFailure>>>,
    otherwise: Result<String, UpstreamFailure>,
    calls: Mutex<Vec<(String, String)>>,
}

impl ScriptedBackend {
    fn new(script: Vec<Result<String, UpstreamFailure>>) -> Self {
        Self::with_default(script, Err(UpstreamFailure::Unexpected("script exhausted".into())))
    }

    fn with_default(
        script: Vec<Result<String, UpstreamFailure>>,
        otherwise: Result<String, UpstreamFailure>,
    ) -> Self {
        Self { script: Mutex::new(script.into()), otherwise, calls: Mutex::new(Vec::new()) }
    }

    fn always(result: Result<String, UpstreamFailure>) -> Self {
        Self::with_default(Vec::new(), result)
    }

    fn credentials_used(&self) -> Vec<String> {
        self.calls.lock().iter().map(|(key, _)| key.clone()).collect()
    }

    fn models_used(&self) -> Vec<String> {
        self.calls.lock().iter().map(|(_, model)| model.clone()).collect()
    }
}

#[async_trait]
impl ChatBackend for ScriptedBackend {
    async fn complete(
        &self,
        credential: &Credential,
        request: &ChatCompletionRequest,
        _timeout: Duration,
    ) -> Result<String, UpstreamFailure> {
        self.calls.lock().push((credential.expose().to_string(), request.model.clone()));
        let next = self.script.lock().pop_front();
        next.unwrap_or_else(|| self.otherwise.clone())
    }
}

fn config(keys: &[&str]) -> DispatchConfig {
    DispatchConfig {
        credentials: keys.iter().map(|k| (*k).to_string()).collect(),
        models: vec!["model-a".into(), "model-b".into(), "model-c".into()],
        ..DispatchConfig::default()
    }
}

fn dispatcher(config: DispatchConfig, backend: Arc<ScriptedBackend>) -> Dispatcher {
    Dispatcher::new(config, Arc::new(AdmissionGate::new(8)), backend, Arc::new(SeededRandom::new(9)))
        .unwrap()
}

fn reading(emotion: Emotion, confidence: f64) -> EmotionReading {
    EmotionReading::new(emotion, confidence, BTreeMap::new())
}

fn request() -> DispatchRequest {
    DispatchRequest::new("Explain photosynthesis", reading(Emotion::Neutral, 0.4))
}

const KEYS: [&str; 3] = ["key-aaaaaa-111111", "key-bbbbbb-222222", "key-cccccc-333333"];

#[test]
fn test_empty_pool_is_config_error() {
    let result = Dispatcher::new(
        config(&[]),
        Arc::new(AdmissionGate::new(1)),
        Arc::new(ScriptedBackend::new(Vec::new())),
        Arc::new(ThreadRandom),
    );
    assert!(matches!(result, Err(edubot_types::ConfigError::NoCredentialsConfigured)));
}

#[tokio::test(start_paused = true)]
async fn test_first_attempt_success() {
    let backend = Arc::new(ScriptedBackend::new(vec![Ok("Plants make food from light.".into())]));
    let dispatcher = dispatcher(config(&KEYS), Arc::clone(&backend));

    let outcome = dispatcher.dispatch(&request()).await;

    assert_eq!(outcome.state, DispatchState::Succeeded);
    assert!(outcome.is_live());
    assert_eq!(outcome.text, "Plants make food from light.");
    assert_eq!(outcome.attempts.len(), 1);
    assert_eq!(outcome.credential_tail.as_deref(), Some("111111"));
    assert_eq!(backend.credentials_used(), vec![KEYS[0].to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_rate_limited_until_last_attempt_then_success() {
    let max_attempts = 6;
    let mut script: Vec<Result<String, UpstreamFailure>> =
        (1..max_attempts).map(|_| Err(UpstreamFailure::RateLimited)).collect();
    script.push(Ok("finally".into()));
    let backend = Arc::new(ScriptedBackend::new(script));
    let dispatcher = dispatcher(config(&KEYS), Arc::clone(&backend));
    assert_eq!(dispatcher.max_attempts(), max_attempts);

    let outcome = dispatcher.dispatch(&request()).await;

    assert_eq!(outcome.state, DispatchState::Succeeded);
    assert_eq!(outcome.text, "finally");
    assert_eq!(outcome.attempts.len(), max_attempts as usize);

    // One rotation per attempt, cycling through the pool twice.
    let expected: Vec<String> = KEYS.iter().chain(KEYS.iter()).map(|k| (*k).to_string()).collect();
    assert_eq!(backend.credentials_used(), expected);
    assert_eq!(outcome.credential_tail.as_deref(), Some("333333"));

    for attempt in &outcome.attempts[..5] {
        assert_eq!(attempt.outcome, AttemptOutcome::RateLimited);
        let backoff = attempt.backoff_ms.unwrap();
        assert!((100..=300).contains(&backoff));
    }
    assert_eq!(outcome.attempts[5].outcome, AttemptOutcome::Success);

    // The next request starts from where the cursor stopped.
    backend.script.lock().push_back(Ok("again".into()));
    dispatcher.dispatch(&request()).await;
    assert_eq!(backend.credentials_used().last().map(String::as_str), Some(KEYS[0]));
}

#[tokio::test(start_paused = true)]
async fn test_server_errors_exhaust_into_generic_fallback() {
    let backend = Arc::new(ScriptedBackend::always(Err(UpstreamFailure::Server {
        status: 500,
        body: "internal".into(),
    })));
    let dispatcher = dispatcher(config(&KEYS), Arc::clone(&backend));

    let outcome = dispatcher.dispatch(&request()).await;

    assert_eq!(outcome.state, DispatchState::Fallback);
    assert_eq!(outcome.fallback, Some(FallbackKind::Generic));
    assert_eq!(outcome.attempts.len(), 6);
    assert_eq!(backend.credentials_used().len(), 6);
    assert_eq!(outcome.credential_tail, None);
    assert_eq!(
        outcome.text,
        FallbackResponder.respond_for_message(
            &Emotion::Neutral,
            FallbackKind::Generic,
            "Explain photosynthesis"
        )
    );

    let backoffs: Vec<u64> = outcome.attempts.iter().filter_map(|a| a.backoff_ms).collect();
    assert_eq!(backoffs, vec![500, 1000, 2000, 4000, 8000]);
    assert!(backoffs.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(outcome.attempts[5].backoff_ms, None);

    let stats = dispatcher.gate().stats();
    assert_eq!(stats.total_attempted, 1);
    assert_eq!(stats.total_failed, 1);
    assert_eq!(stats.in_flight, 0);
}

#[tokio::test(start_paused = true)]
async fn test_model_is_chosen_once_per_request() {
    let backend = Arc::new(ScriptedBackend::always(Err(UpstreamFailure::Timeout)));
    let dispatcher = dispatcher(config(&KEYS), Arc::clone(&backend));

    let outcome = dispatcher.dispatch(&request()).await;

    let models = backend.models_used();
    assert_eq!(models.len(), 6);
    assert!(models.iter().all(|m| *m == outcome.model));
    assert_eq!(outcome.fallback, Some(FallbackKind::Timeout));
}

#[tokio::test(start_paused = true)]
async fn test_final_outcome_selects_fallback_flavour() {
    let cases = [
        (UpstreamFailure::RateLimited, FallbackKind::RateLimited),
        (UpstreamFailure::Connection("refused".into()), FallbackKind::Connection),
        (UpstreamFailure::Empty, FallbackKind::Generic),
        (UpstreamFailure::Client { status: 401, body: String::new() }, FallbackKind::Generic),
        (UpstreamFailure::Unexpected("boom".into()), FallbackKind::Generic),
    ];

    for (failure, kind) in cases {
        let backend = Arc::new(ScriptedBackend::always(Err(failure)));
        let dispatcher = dispatcher(config(&["only-key-xyz"]), backend);
        let outcome = dispatcher.dispatch(&request()).await;
        assert_eq!(outcome.state, DispatchState::Fallback);
        assert_eq!(outcome.fallback, Some(kind));
        assert_eq!(outcome.attempts.len(), 2);
    }
}

#[tokio::test(start_paused = true)]
async fn test_recovers_after_mixed_failures() {
    let backend = Arc::new(ScriptedBackend::new(vec![
        Err(UpstreamFailure::Empty),
        Err(UpstreamFailure::Connection("reset".into())),
        Ok("recovered".into()),
    ]));
    let dispatcher = dispatcher(config(&KEYS), backend);

    let outcome = dispatcher.dispatch(&request()).await;

    assert!(outcome.is_live());
    let outcomes: Vec<AttemptOutcome> = outcome.attempts.iter().map(|a| a.outcome).collect();
    assert_eq!(
        outcomes,
        vec![AttemptOutcome::Empty, AttemptOutcome::Connection, AttemptOutcome::Success]
    );
    // Connection waits base * 2 plus up to one second of jitter.
    let connection_backoff = outcome.attempts[1].backoff_ms.unwrap();
    assert!((1000..=2000).contains(&connection_backoff));
}

#[tokio::test(start_paused = true)]
async fn test_high_confidence_answer_is_enhanced() {
    let backend = Arc::new(ScriptedBackend::new(vec![Ok("Let's go step by step.".into())]));
    let dispatcher = dispatcher(config(&KEYS), backend);
    let request = DispatchRequest::new("I don't get fractions", reading(Emotion::Confused, 0.92));

    let outcome = dispatcher.dispatch(&request).await;

    assert!(outcome.text.starts_with("Let's go step by step."));
    assert!(outcome.text.contains("🤔"));
    assert!(outcome.text.contains("**Tip**"));
}

#[tokio::test(start_paused = true)]
async fn test_context_is_forwarded_with_limit() {
    struct Capture(Mutex<Option<ChatCompletionRequest>>);

    #[async_trait]
    impl ChatBackend for Capture {
        async fn complete(
            &self,
            _credential: &Credential,
            request: &ChatCompletionRequest,
            _timeout: Duration,
        ) -> Result<String, UpstreamFailure> {
            *self.0.lock() = Some(request.clone());
            Ok("ok".into())
        }
    }

    let capture = Arc::new(Capture(Mutex::new(None)));
    let dispatcher = Dispatcher::new(
        config(&KEYS),
        Arc::new(AdmissionGate::new(1)),
        Arc::clone(&capture) as Arc<dyn ChatBackend>,
        Arc::new(SeededRandom::new(1)),
    )
    .unwrap();

    let context: Vec<OpenAIMessage> = (0..6)
        .map(|i| {
            if i % 2 == 0 {
                OpenAIMessage::user(format!("q{i}"))
            } else {
                OpenAIMessage::assistant(format!("a{i}"))
            }
        })
        .collect();
    let request = request().with_context(context).with_subject(Some("biologi".into()));
    dispatcher.dispatch(&request).await;

    let sent = capture.0.lock().clone().unwrap();
    assert_eq!(sent.messages.len(), 7);
    assert!(sent.messages[0].content.contains("biologist"));
    assert_eq!(sent.messages[1].content, "a1");
    assert_eq!(sent.messages[6].content, "Explain photosynthesis");
    assert_eq!(sent.max_tokens, 1000);
}

#[test]
fn test_pool_status_shows_tails_only() {
    let dispatcher = dispatcher(config(&KEYS), Arc::new(ScriptedBackend::new(Vec::new())));
    let status = dispatcher.pool_status();
    assert_eq!(status.total_keys, 3);
    assert_eq!(status.key_endings, vec!["111111", "222222", "333333"]);
    assert_eq!(status.max_attempts, 6);
    assert_eq!(status.models.len(), 3);
}

#[tokio::test]
async fn test_http_backend_rotates_past_rate_limit() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": "Halo!"}}]
        })))
        .with_priority(2)
        .mount(&server)
        .await;

    let config = DispatchConfig {
        base_backoff_ms: 0,
        pre_call_jitter_min_ms: 0,
        pre_call_jitter_max_ms: 0,
        rate_limit_jitter_min_ms: 0,
        rate_limit_jitter_max_ms: 0,
        ..config(&KEYS[..2])
    };
    let backend = OpenRouterBackend::new(reqwest::Client::new(), server.uri());
    let dispatcher = Dispatcher::new(
        config,
        Arc::new(AdmissionGate::new(4)),
        Arc::new(backend),
        Arc::new(ThreadRandom),
    )
    .unwrap();

    let outcome = dispatcher.dispatch(&request()).await;

    assert!(outcome.is_live());
    assert_eq!(outcome.text, "Halo!");
    assert_eq!(outcome.attempts.len(), 2);
    assert_eq!(outcome.credential_tail.as_deref(), Some("222222"));
}
