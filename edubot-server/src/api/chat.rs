//! Legacy single-turn chat

use axum::{extract::State, http::HeaderMap, response::Json};
use serde::Deserialize;

use edubot_core::service::ChatReply;

use super::{identity, ApiError};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LegacyMessage {
    pub message: String,
}

pub async fn legacy_chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<LegacyMessage>,
) -> Result<Json<ChatReply>, ApiError> {
    Ok(Json(state.chat().legacy_chat(&identity(&headers), &body.message).await?))
}
