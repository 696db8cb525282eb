//! Application State
//!
//! Shared handles for the HTTP handlers.

use std::sync::Arc;

use edubot_core::{ChatService, Dispatcher, InteractionMonitor, QuotaTracker};

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

pub struct AppStateInner {
    pub chat: Arc<ChatService>,
}

impl AppState {
    pub fn new(chat: ChatService) -> Self {
        Self { inner: Arc::new(AppStateInner { chat: Arc::new(chat) }) }
    }

    pub fn chat(&self) -> &ChatService {
        &self.inner.chat
    }

    pub fn quota(&self) -> &QuotaTracker {
        self.inner.chat.quota()
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        self.inner.chat.dispatcher()
    }

    pub fn monitor(&self) -> &InteractionMonitor {
        self.inner.chat.monitor()
    }
}
