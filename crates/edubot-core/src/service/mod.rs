//! Chat orchestration.
//!
//! Ties the collaborators together for one student message:
//! quota check → classification → dispatch under a deadline → conversation
//! append → quota record → interaction log.

pub mod classifier;
pub mod conversations;


pub use classifier::{EmotionClassifier, LexiconClassifier};
pub use conversations::{generate_title, push_message, ConversationStore, InMemoryConversationStore};

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use edubot_types::models::SystemLoad;
use edubot_types::protocol::OpenAIMessage;
use edubot_types::{
    Conversation, ConversationMessage, ConversationSummary, DispatchOutcome, EmotionReading,
    FallbackKind, InteractionRecord, Sender,
};
use serde::Serialize;
use tracing::{info, warn};

use crate::dispatch::{DispatchRequest, Dispatcher};
use crate::error::{AppError, AppResult};
use crate::modules::logger::fingerprint;
use crate::monitor::InteractionMonitor;
use crate::quota::QuotaTracker;

/// Reply handed back to the HTTP layer.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChatReply {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    pub content: String,
    pub emotion: String,
    pub emotion_confidence: f64,
    pub timestamp: DateTime<Utc>,
    /// `false` when a canned reply was served
    pub live: bool,
    pub prompts_remaining: u32,
}

/// Result of one dispatch under the end-to-end deadline.
struct Generated {
    text: String,
    live: bool,
    model: String,
    credential_tail: Option<String>,
    attempts: usize,
    llm_time_ms: f64,
}

pub struct ChatService {
    dispatcher: Arc<Dispatcher>,
    quota: Arc<QuotaTracker>,
    classifier: Arc<dyn EmotionClassifier>,
    store: Arc<dyn ConversationStore>,
    monitor: Arc<InteractionMonitor>,
    request_timeout: Duration,
    charge_fallback: bool,
}

impl ChatService {
    pub fn new(
        dispatcher: Arc<Dispatcher>,
        quota: Arc<QuotaTracker>,
        classifier: Arc<dyn EmotionClassifier>,
        store: Arc<dyn ConversationStore>,
        monitor: Arc<InteractionMonitor>,
    ) -> Self {
        let request_timeout = Duration::from_secs(dispatcher.config().request_timeout_secs);
        Self {
            dispatcher,
            quota,
            classifier,
            store,
            monitor,
            request_timeout,
            charge_fallback: true,
        }
    }

    /// Whether canned replies consume quota.
    pub fn with_charge_fallback(mut self, charge_fallback: bool) -> Self {
        self.charge_fallback = charge_fallback;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    pub fn quota(&self) -> &Arc<QuotaTracker> {
        &self.quota
    }

    pub fn monitor(&self) -> &Arc<InteractionMonitor> {
        &self.monitor
    }

    /// Handles one message in a conversation.
    ///
    /// An unknown `conversation_id` starts a fresh conversation and the reply
    /// is prefixed with a notice carrying the new id.
    pub async fn send_message(
        &self,
        identity: &str,
        conversation_id: &str,
        content: &str,
    ) -> AppResult<ChatReply> {
        self.quota.ensure_allowed(identity)?;
        let content = validate_content(content)?;
        let total_start = Instant::now();

        let (conversation, notice) = match self.store.get(identity, conversation_id).await? {
            Some(conversation) => (conversation, None),
            None => {
                let created = self.store.create(Conversation::new(identity, None, None, None)).await?;
                warn!(
                    user = %fingerprint(identity),
                    "Conversation {} not found, created {}",
                    conversation_id,
                    created.id
                );
                let notice = format!(
                    "Conversation not found. A new conversation was created (id: {}).",
                    created.id
                );
                (created, Some(notice))
            },
        };
        let conversation_id = conversation.id.clone();

        self.store.append(identity, &conversation_id, ConversationMessage::user(content)).await?;

        let emotion_start = Instant::now();
        let reading = self.classifier.classify(content).await;
        let emotion_time_ms = elapsed_ms(emotion_start);

        // Every stored turn before the one just appended.
        let context: Vec<OpenAIMessage> = conversation.messages.iter().map(to_wire).collect();
        let request = DispatchRequest::new(content, reading.clone())
            .with_context(context)
            .with_subject(conversation.subject.clone());

        let generated = self.generate(&request).await;

        let reply_message = ConversationMessage::assistant(generated.text.clone(), &reading);
        self.store.append(identity, &conversation_id, reply_message.clone()).await?;
        self.charge(identity, generated.live);

        let prompt_summary = format!(
            "Conv:{} | Emotion:{} | Context:{} msgs",
            conversation_id.chars().take(8).collect::<String>(),
            reading.emotion,
            request.context.len().min(self.dispatcher.config().context_turns)
        );
        self.log_interaction(
            identity,
            Some(conversation_id.clone()),
            content,
            &reading,
            emotion_time_ms,
            &generated,
            elapsed_ms(total_start),
            prompt_summary,
        )
        .await;

        let content = match notice {
            Some(notice) => format!("⚠️ {notice}\n\n{}", generated.text),
            None => generated.text,
        };
        Ok(ChatReply {
            id: reply_message.id,
            conversation_id: Some(conversation_id),
            content,
            emotion: reading.emotion.label().to_string(),
            emotion_confidence: reading.confidence,
            timestamp: reply_message.timestamp,
            live: generated.live,
            prompts_remaining: self.quota.check(identity).remaining,
        })
    }

    /// Stateless single-turn chat with the same quota and dispatch rules.
    pub async fn legacy_chat(&self, identity: &str, message: &str) -> AppResult<ChatReply> {
        self.quota.ensure_allowed(identity)?;
        let message = validate_content(message)?;
        let total_start = Instant::now();

        let emotion_start = Instant::now();
        let reading = self.classifier.classify(message).await;
        let emotion_time_ms = elapsed_ms(emotion_start);

        let generated = self.generate(&DispatchRequest::new(message, reading.clone())).await;
        self.charge(identity, generated.live);

        let prompt_summary = format!("Legacy | Emotion:{}", reading.emotion);
        self.log_interaction(
            identity,
            None,
            message,
            &reading,
            emotion_time_ms,
            &generated,
            elapsed_ms(total_start),
            prompt_summary,
        )
        .await;

        Ok(ChatReply {
            id: uuid::Uuid::new_v4().to_string(),
            conversation_id: None,
            content: generated.text,
            emotion: reading.emotion.label().to_string(),
            emotion_confidence: reading.confidence,
            timestamp: Utc::now(),
            live: generated.live,
            prompts_remaining: self.quota.check(identity).remaining,
        })
    }

    async fn generate(&self, request: &DispatchRequest) -> Generated {
        let llm_start = Instant::now();
        match tokio::time::timeout(self.request_timeout, self.dispatcher.dispatch(request)).await {
            Ok(outcome) => Generated::from_outcome(outcome, elapsed_ms(llm_start)),
            Err(_) => {
                warn!(
                    "AI response generation exceeded the {}s deadline",
                    self.request_timeout.as_secs()
                );
                Generated {
                    text: self.dispatcher.fallback_text(
                        &request.reading.emotion,
                        FallbackKind::Timeout,
                        &request.message,
                    ),
                    live: false,
                    model: "unknown".to_string(),
                    credential_tail: None,
                    attempts: 0,
                    llm_time_ms: elapsed_ms(llm_start),
                }
            },
        }
    }

    fn charge(&self, identity: &str, live: bool) {
        if live || self.charge_fallback {
            if !self.quota.record(identity) {
                warn!(user = %fingerprint(identity), "Reply served but quota was already full");
            }
        } else {
            info!(user = %fingerprint(identity), "Canned reply served, quota not charged");
        }
    }

    #[allow(clippy::too_many_arguments, reason = "flat record assembly")]
    async fn log_interaction(
        &self,
        identity: &str,
        conversation_id: Option<String>,
        message: &str,
        reading: &EmotionReading,
        emotion_time_ms: f64,
        generated: &Generated,
        total_time_ms: f64,
        prompt_summary: String,
    ) {
        let record = InteractionRecord {
            timestamp: Utc::now(),
            student_message: message.to_string(),
            ai_response: generated.text.clone(),
            emotion: reading.emotion.label().to_string(),
            emotion_confidence: reading.confidence,
            top_emotions: reading.summary(2),
            classifier: self.classifier.name().to_string(),
            emotion_time_ms,
            llm_model: generated.model.clone(),
            api_key_ending: generated
                .credential_tail
                .clone()
                .unwrap_or_else(|| "unknown".to_string()),
            llm_time_ms: generated.llm_time_ms,
            total_time_ms,
            attempts: generated.attempts,
            fallback: !generated.live,
            conversation_id,
            user: fingerprint(identity),
            prompt_summary,
            available_keys: self.dispatcher.pool_status().total_keys,
            system_load: SystemLoad::from_total_ms(total_time_ms),
        };
        self.monitor.log_interaction(record).await;
    }

    pub async fn create_conversation(
        &self,
        identity: &str,
        title: Option<String>,
        subject: Option<String>,
        study_level: Option<String>,
    ) -> AppResult<Conversation> {
        let conversation = Conversation::new(identity, title, subject, study_level);
        info!(user = %fingerprint(identity), "Creating conversation {}", conversation.id);
        self.store.create(conversation).await
    }

    pub async fn list_conversations(&self, identity: &str) -> AppResult<Vec<ConversationSummary>> {
        self.store.list(identity).await
    }

    pub async fn get_conversation(&self, identity: &str, id: &str) -> AppResult<Conversation> {
        self.store
            .get(identity, id)
            .await?
            .ok_or_else(|| AppError::ConversationNotFound(id.to_string()))
    }

    pub async fn rename_conversation(&self, identity: &str, id: &str, title: &str) -> AppResult<()> {
        let title = title.trim();
        if title.is_empty() {
            return Err(AppError::InvalidRequest("Title cannot be empty".to_string()));
        }
        if self.store.rename(identity, id, title).await? {
            Ok(())
        } else {
            Err(AppError::ConversationNotFound(id.to_string()))
        }
    }

    pub async fn delete_conversation(&self, identity: &str, id: &str) -> AppResult<()> {
        if self.store.delete(identity, id).await? {
            Ok(())
        } else {
            Err(AppError::ConversationNotFound(id.to_string()))
        }
    }
}

impl Generated {
    fn from_outcome(outcome: DispatchOutcome, llm_time_ms: f64) -> Self {
        Self {
            live: outcome.is_live(),
            attempts: outcome.attempts.len(),
            text: outcome.text,
            model: outcome.model,
            credential_tail: outcome.credential_tail,
            llm_time_ms,
        }
    }
}

fn validate_content(content: &str) -> AppResult<&str> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(AppError::InvalidRequest("Message cannot be empty".to_string()));
    }
    Ok(trimmed)
}

fn to_wire(message: &ConversationMessage) -> OpenAIMessage {
    match message.sender {
        Sender::User => OpenAIMessage::user(message.content.clone()),
        Sender::Assistant => OpenAIMessage::assistant(message.content.clone()),
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    (start.elapsed().as_secs_f64() * 1000.0 * 100.0).round() / 100.0
}
