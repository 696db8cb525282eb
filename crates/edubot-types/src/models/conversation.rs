//! Conversation models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::EmotionReading;

/// Title given to conversations until the first student turn names them.
pub const DEFAULT_CONVERSATION_TITLE: &str = "💭 New conversation";

const SUMMARY_PREVIEW_CHARS: usize = 80;
const DOMINANT_EMOTION_WINDOW: usize = 5;

/// Author of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

/// One stored turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub id: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub sender: Sender,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emotion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emotion_confidence: Option<f64>,
}

impl ConversationMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            content: content.into(),
            timestamp: Utc::now(),
            sender: Sender::User,
            emotion: None,
            emotion_confidence: None,
        }
    }

    pub fn assistant(content: impl Into<String>, reading: &EmotionReading) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            content: content.into(),
            timestamp: Utc::now(),
            sender: Sender::Assistant,
            emotion: Some(reading.emotion.label().to_string()),
            emotion_confidence: Some(reading.confidence),
        }
    }
}

/// A per-identity educational conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    /// Owning identity. Never serialized: identities are bearer tokens.
    #[serde(skip)]
    pub owner: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub messages: Vec<ConversationMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub study_level: Option<String>,
}

impl Conversation {
    pub fn new(
        owner: impl Into<String>,
        title: Option<String>,
        subject: Option<String>,
        study_level: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            owner: owner.into(),
            title: title
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_CONVERSATION_TITLE.to_string()),
            created_at: now,
            updated_at: now,
            messages: Vec::new(),
            subject,
            study_level,
        }
    }

    pub fn user_turns(&self) -> usize {
        self.messages.iter().filter(|m| m.sender == Sender::User).count()
    }

    /// Most frequent emotion among the last few turns. Ties go to the most recent.
    pub fn dominant_emotion(&self) -> Option<String> {
        let start = self.messages.len().saturating_sub(DOMINANT_EMOTION_WINDOW);
        let recent: Vec<&str> =
            self.messages[start..].iter().filter_map(|m| m.emotion.as_deref()).collect();

        let mut counts: HashMap<&str, usize> = HashMap::new();
        for emotion in &recent {
            *counts.entry(*emotion).or_insert(0) += 1;
        }

        let best = counts.values().copied().max()?;
        recent.iter().rev().find(|e| counts.get(*e) == Some(&best)).map(|e| (*e).to_string())
    }

    pub fn summary(&self) -> ConversationSummary {
        let last_message = self
            .messages
            .iter()
            .rev()
            .find(|m| m.sender == Sender::User)
            .map(|m| preview(&m.content));

        ConversationSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            last_message,
            message_count: self.messages.len(),
            subject: self.subject.clone(),
            dominant_emotion: self.dominant_emotion(),
        }
    }
}

fn preview(content: &str) -> String {
    if content.chars().count() > SUMMARY_PREVIEW_CHARS {
        let cut: String = content.chars().take(SUMMARY_PREVIEW_CHARS).collect();
        format!("{cut}...")
    } else {
        content.to_string()
    }
}

/// Listing entry for a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_message: Option<String>,
    pub message_count: usize,
    pub subject: Option<String>,
    pub dominant_emotion: Option<String>,
}
