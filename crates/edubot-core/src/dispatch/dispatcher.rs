//! The dispatch state machine.

use std::sync::Arc;
use std::time::Duration;

use edubot_types::protocol::{ChatCompletionRequest, OpenAIMessage};
use edubot_types::{
    AttemptOutcome, ConfigError, DispatchConfig, DispatchOutcome, DispatchState, Emotion,
    EmotionReading, FallbackKind, PoolStatus, RequestAttempt,
};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::backoff::BackoffPolicy;
use super::credentials::CredentialRotator;
use super::fallback::FallbackResponder;
use super::gate::AdmissionGate;
use super::model_selector::ModelSelector;
use super::prompt;
use super::random::RandomSource;
use super::upstream::ChatBackend;

/// Input of one logical "get an empathetic reply" request.
#[derive(Debug, Clone)]
pub struct DispatchRequest {
    pub message: String,
    pub reading: EmotionReading,
    /// Prior turns, oldest first. Only the most recent ones are forwarded.
    pub context: Vec<OpenAIMessage>,
    pub subject: Option<String>,
}

impl DispatchRequest {
    pub fn new(message: impl Into<String>, reading: EmotionReading) -> Self {
        Self { message: message.into(), reading, context: Vec::new(), subject: None }
    }

    pub fn with_context(mut self, context: Vec<OpenAIMessage>) -> Self {
        self.context = context;
        self
    }

    pub fn with_subject(mut self, subject: Option<String>) -> Self {
        self.subject = subject;
        self
    }
}

#[derive(Default)]
struct AttemptTrace {
    model: String,
    credential_tail: Option<String>,
    attempts: Vec<RequestAttempt>,
}

pub struct Dispatcher {
    config: DispatchConfig,
    rotator: CredentialRotator,
    models: ModelSelector,
    gate: Arc<AdmissionGate>,
    backend: Arc<dyn ChatBackend>,
    rng: Arc<dyn RandomSource>,
    backoff: BackoffPolicy,
    fallback: FallbackResponder,
}

impl Dispatcher {
    /// Fails when the credential pool or the model list is empty.
    pub fn new(
        config: DispatchConfig,
        gate: Arc<AdmissionGate>,
        backend: Arc<dyn ChatBackend>,
        rng: Arc<dyn RandomSource>,
    ) -> Result<Self, ConfigError> {
        let rotator = CredentialRotator::from_secrets(config.credentials.iter().cloned())?;
        let models = ModelSelector::new(config.models.clone(), Arc::clone(&rng))?;
        let backoff = BackoffPolicy::from_config(&config);

        info!(
            keys = ?rotator.tails(),
            models = models.models().len(),
            "Dispatcher initialized with {} API keys",
            rotator.len()
        );

        Ok(Self {
            config,
            rotator,
            models,
            gate,
            backend,
            rng,
            backoff,
            fallback: FallbackResponder,
        })
    }

    pub fn gate(&self) -> &Arc<AdmissionGate> {
        &self.gate
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    pub fn max_attempts(&self) -> u32 {
        self.rotator.max_attempts().max(1)
    }

    pub fn pool_status(&self) -> PoolStatus {
        PoolStatus {
            total_keys: self.rotator.len(),
            key_endings: self.rotator.tails(),
            models: self.models.models().to_vec(),
            max_attempts: self.max_attempts(),
        }
    }

    /// Canned reply for failures the caller detects itself, such as its own
    /// end-to-end deadline.
    pub fn fallback_text(&self, emotion: &Emotion, kind: FallbackKind, message: &str) -> String {
        self.fallback.respond_for_message(emotion, kind, message)
    }

    /// Runs one logical request to a terminal state. Never fails: exhaustion
    /// yields a canned reply.
    pub async fn dispatch(&self, request: &DispatchRequest) -> DispatchOutcome {
        debug!(state = ?DispatchState::BuildingPrompt, "Building prompt");
        let messages = prompt::build_messages(
            &request.message,
            &request.reading.emotion,
            request.subject.as_deref(),
            &request.context,
            self.config.context_turns,
        );

        info!(
            "🎭 EMOTION: {} (confidence: {:.3}) - {} chars",
            request.reading.emotion,
            request.reading.confidence,
            request.message.chars().count()
        );

        // Desynchronise bursts of simultaneous callers.
        let jitter = self
            .rng
            .uniform_ms(self.config.pre_call_jitter_min_ms, self.config.pre_call_jitter_max_ms);
        tokio::time::sleep(Duration::from_millis(jitter)).await;

        let mut trace = AttemptTrace::default();
        let result = self.gate.run(self.attempt_loop(messages, &mut trace)).await;

        match result {
            Ok(answer) => DispatchOutcome {
                text: prompt::enhance(&answer, &request.reading, &self.config),
                state: DispatchState::Succeeded,
                fallback: None,
                model: trace.model,
                credential_tail: trace.credential_tail,
                attempts: trace.attempts,
            },
            Err(last) => {
                let kind = last.fallback_kind();
                warn!(
                    last_outcome = %last,
                    attempts = trace.attempts.len(),
                    "⚠️ FALLBACK: serving {:?} canned reply",
                    kind
                );
                DispatchOutcome {
                    text: self.fallback.respond_for_message(
                        &request.reading.emotion,
                        kind,
                        &request.message,
                    ),
                    state: DispatchState::Fallback,
                    fallback: Some(kind),
                    model: trace.model,
                    credential_tail: None,
                    attempts: trace.attempts,
                }
            },
        }
    }

    /// Runs inside the admission slot. `Err` carries the last attempt's
    /// outcome once every attempt is spent.
    async fn attempt_loop(
        &self,
        messages: Vec<OpenAIMessage>,
        trace: &mut AttemptTrace,
    ) -> Result<String, AttemptOutcome> {
        debug!(state = ?DispatchState::Admitted, in_flight = self.gate.in_flight(), "Admitted");

        let model = self.models.choose().to_string();
        trace.model.clone_from(&model);
        let body = ChatCompletionRequest {
            model,
            messages,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            top_p: self.config.top_p,
        };

        let max_attempts = self.max_attempts();
        let attempt_timeout = Duration::from_secs(self.config.attempt_timeout_secs);
        let started = Instant::now();
        let mut last = AttemptOutcome::Unexpected;

        for ordinal in 1..=max_attempts {
            let credential = self.rotator.next();
            let tail = credential.tail();
            debug!(state = ?DispatchState::Attempting(ordinal), "Attempting");
            info!(
                "🚀 ATTEMPT {}/{}: key=...{}, model={}",
                ordinal, max_attempts, tail, body.model
            );

            let attempt_started = Instant::now();
            let result = self.backend.complete(credential, &body, attempt_timeout).await;
            let latency_ms = attempt_started.elapsed().as_millis() as u64;

            match result {
                Ok(answer) => {
                    info!(
                        "✅ SUCCESS: {} via key ...{} ({}ms attempt, {}ms total) - {} chars",
                        body.model,
                        tail,
                        latency_ms,
                        started.elapsed().as_millis(),
                        answer.chars().count()
                    );
                    trace.attempts.push(RequestAttempt {
                        ordinal,
                        credential_tail: tail.clone(),
                        model: body.model.clone(),
                        outcome: AttemptOutcome::Success,
                        latency_ms,
                        backoff_ms: None,
                    });
                    trace.credential_tail = Some(tail);
                    return Ok(answer);
                },
                Err(failure) => {
                    let outcome = failure.outcome();
                    let delay = (ordinal < max_attempts)
                        .then(|| self.backoff.delay_for(outcome, ordinal - 1, &*self.rng));

                    trace.attempts.push(RequestAttempt {
                        ordinal,
                        credential_tail: tail.clone(),
                        model: body.model.clone(),
                        outcome,
                        latency_ms,
                        backoff_ms: delay.map(|d| d.as_millis() as u64),
                    });
                    last = outcome;

                    match delay {
                        Some(delay) => {
                            warn!(
                                "❌ {} via key ...{}: {} - retrying in {}ms (attempt {}/{})",
                                outcome,
                                tail,
                                failure,
                                delay.as_millis(),
                                ordinal,
                                max_attempts
                            );
                            tokio::time::sleep(delay).await;
                        },
                        None => warn!(
                            "❌ {} via key ...{} on final attempt {}/{}: {}",
                            outcome, tail, ordinal, max_attempts, failure
                        ),
                    }
                },
            }
        }

        Err(last)
    }
}
