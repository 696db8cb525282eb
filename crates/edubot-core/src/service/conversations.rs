//! Conversation persistence seam and the in-memory implementation.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use edubot_types::models::DEFAULT_CONVERSATION_TITLE;
use edubot_types::{Conversation, ConversationMessage, ConversationSummary, Sender};

use crate::error::AppResult;

const SUBJECT_TITLE_CHARS: usize = 30;
const TITLE_WORDS: usize = 6;
const TITLE_CHARS: usize = 45;

/// Conversations are always scoped to their owner's identity.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    async fn create(&self, conversation: Conversation) -> AppResult<Conversation>;

    async fn get(&self, owner: &str, id: &str) -> AppResult<Option<Conversation>>;

    /// Newest first.
    async fn list(&self, owner: &str) -> AppResult<Vec<ConversationSummary>>;

    /// Returns `false` if the conversation does not exist.
    async fn append(&self, owner: &str, id: &str, message: ConversationMessage) -> AppResult<bool>;

    async fn rename(&self, owner: &str, id: &str, title: &str) -> AppResult<bool>;

    async fn delete(&self, owner: &str, id: &str) -> AppResult<bool>;
}

/// Title for a conversation, from its first student message.
pub fn generate_title(first_message: &str) -> String {
    const SUBJECTS: [(&[&str], &str); 9] = [
        (&["matematika", "math"], "🔢 Mathematics"),
        (&["fisika", "physics"], "⚛️ Physics"),
        (&["kimia", "chemistry"], "🧪 Chemistry"),
        (&["biologi", "biology"], "🌿 Biology"),
        (&["sejarah", "history"], "📚 History"),
        (&["bahasa", "language"], "📝 Language"),
        (&["geografi", "geography"], "🌍 Geography"),
        (&["ekonomi", "economics"], "💰 Economics"),
        (&["sains", "science"], "🔬 Science"),
    ];

    let lower = first_message.to_lowercase();
    for (keywords, subject) in SUBJECTS {
        if keywords.iter().any(|k| lower.contains(k)) {
            let head: String = first_message.chars().take(SUBJECT_TITLE_CHARS).collect();
            return format!("{subject}: {head}...");
        }
    }

    let words: Vec<&str> = first_message.split_whitespace().collect();
    let mut title = words.iter().take(TITLE_WORDS).copied().collect::<Vec<_>>().join(" ");
    if words.len() > TITLE_WORDS {
        title.push_str("...");
    }
    let title: String = title.chars().take(TITLE_CHARS).collect();
    format!("📖 {title}")
}

/// Appends `message`, bumps `updated_at`, and replaces the default title
/// once the first student message arrives.
pub fn push_message(conversation: &mut Conversation, message: ConversationMessage) {
    let retitle = message.sender == Sender::User
        && conversation.user_turns() == 0
        && conversation.title == DEFAULT_CONVERSATION_TITLE;
    if retitle {
        conversation.title = generate_title(&message.content);
    }
    conversation.messages.push(message);
    conversation.updated_at = Utc::now();
}

/// Process-local store keyed by `(owner, id)`.
#[derive(Default)]
pub struct InMemoryConversationStore {
    conversations: DashMap<(String, String), Conversation>,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(owner: &str, id: &str) -> (String, String) {
        (owner.to_string(), id.to_string())
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn create(&self, conversation: Conversation) -> AppResult<Conversation> {
        self.conversations
            .insert(Self::key(&conversation.owner, &conversation.id), conversation.clone());
        Ok(conversation)
    }

    async fn get(&self, owner: &str, id: &str) -> AppResult<Option<Conversation>> {
        Ok(self.conversations.get(&Self::key(owner, id)).map(|c| c.clone()))
    }

    async fn list(&self, owner: &str) -> AppResult<Vec<ConversationSummary>> {
        let mut summaries: Vec<ConversationSummary> = self
            .conversations
            .iter()
            .filter(|entry| entry.key().0 == owner)
            .map(|entry| entry.value().summary())
            .collect();
        summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(summaries)
    }

    async fn append(&self, owner: &str, id: &str, message: ConversationMessage) -> AppResult<bool> {
        match self.conversations.get_mut(&Self::key(owner, id)) {
            Some(mut conversation) => {
                push_message(&mut conversation, message);
                Ok(true)
            },
            None => Ok(false),
        }
    }

    async fn rename(&self, owner: &str, id: &str, title: &str) -> AppResult<bool> {
        match self.conversations.get_mut(&Self::key(owner, id)) {
            Some(mut conversation) => {
                conversation.title = title.to_string();
                conversation.updated_at = Utc::now();
                Ok(true)
            },
            None => Ok(false),
        }
    }

    async fn delete(&self, owner: &str, id: &str) -> AppResult<bool> {
        Ok(self.conversations.remove(&Self::key(owner, id)).is_some())
    }
}
