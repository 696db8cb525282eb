//! API Routes
//!
//! Student-facing chat endpoints plus a few read-only monitoring views.
//! Every handler scopes its work to the identity in the `Authorization`
//! bearer token; requests without one share the anonymous identity.

mod chat;
mod conversations;
mod error;
pub mod stats;
mod token;

#[cfg(test)]
mod conversations_tests;

pub use error::ApiError;

use axum::{
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Json},
    routing::{get, post, put},
    Router,
};
use edubot_core::QuotaTracker;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        // Identity
        .route("/token/new", post(token::new_token))
        // Conversations
        .route(
            "/conversations",
            post(conversations::create_conversation).get(conversations::list_conversations),
        )
        .route(
            "/conversations/:id",
            get(conversations::get_conversation).delete(conversations::delete_conversation),
        )
        .route("/conversations/:id/title", put(conversations::update_title))
        .route("/conversations/:id/messages", post(conversations::send_message))
        // Legacy stateless chat
        .route("/chat", post(chat::legacy_chat))
        // Monitoring
        .route("/stats", get(stats::get_stats))
        .route("/quota", get(stats::get_quota))
        .route("/queue/stats", get(stats::get_queue_stats))
        .route("/health", get(stats::get_health))
        .fallback(api_not_found)
}

async fn api_not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(serde_json::json!({"detail": "Not found"})))
}

/// Caller identity from the bearer token.
pub(crate) fn identity(headers: &HeaderMap) -> String {
    let header = headers.get(AUTHORIZATION).and_then(|value| value.to_str().ok());
    QuotaTracker::identity_from_authorization(header)
}
