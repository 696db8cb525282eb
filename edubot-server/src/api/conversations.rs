//! Conversation handlers: create, list, get, rename, delete, send message

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    response::Json,
};
use serde::{Deserialize, Serialize};

use edubot_core::service::ChatReply;
use edubot_types::{Conversation, ConversationSummary};

use super::{identity, ApiError};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct CreateConversationRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub study_level: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTitleRequest {
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

pub async fn create_conversation(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CreateConversationRequest>,
) -> Result<Json<Conversation>, ApiError> {
    let conversation = state
        .chat()
        .create_conversation(&identity(&headers), body.title, body.subject, body.study_level)
        .await?;
    Ok(Json(conversation))
}

pub async fn list_conversations(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<ConversationSummary>>, ApiError> {
    Ok(Json(state.chat().list_conversations(&identity(&headers)).await?))
}

pub async fn get_conversation(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Conversation>, ApiError> {
    Ok(Json(state.chat().get_conversation(&identity(&headers), &id).await?))
}

pub async fn update_title(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<UpdateTitleRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.chat().rename_conversation(&identity(&headers), &id, &body.title).await?;
    Ok(Json(MessageResponse { message: "Title updated successfully".to_string() }))
}

pub async fn delete_conversation(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.chat().delete_conversation(&identity(&headers), &id).await?;
    Ok(Json(MessageResponse { message: "Conversation deleted successfully".to_string() }))
}

pub async fn send_message(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<MessageRequest>,
) -> Result<Json<ChatReply>, ApiError> {
    let reply = state.chat().send_message(&identity(&headers), &id, &body.content).await?;
    Ok(Json(reply))
}
