use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Json;

use super::conversations::{
    create_conversation, delete_conversation, get_conversation, list_conversations, send_message,
    update_title, CreateConversationRequest, MessageRequest, UpdateTitleRequest,
};
use crate::test_helpers::{bearer, test_app_state, test_app_state_with, StubBackend, TUTOR_REPLY};

fn message(content: &str) -> Json<MessageRequest> {
    Json(MessageRequest { content: content.to_string() })
}

#[tokio::test]
async fn test_create_and_list_are_scoped_per_token() {
    let state = test_app_state();
    let body = CreateConversationRequest {
        title: Some("Fractions".into()),
        subject: Some("matematika".into()),
        study_level: None,
    };

    let Json(created) = create_conversation(State(state.clone()), bearer("alice"), Json(body))
        .await
        .unwrap();
    assert_eq!(created.title, "Fractions");

    let Json(mine) = list_conversations(State(state.clone()), bearer("alice")).await.unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].id, created.id);

    let Json(theirs) = list_conversations(State(state.clone()), bearer("bob")).await.unwrap();
    assert!(theirs.is_empty());

    let err = get_conversation(State(state), bearer("bob"), Path(created.id)).await.unwrap_err();
    assert_eq!(err.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_rename_and_delete() {
    let state = test_app_state();
    let Json(created) = create_conversation(
        State(state.clone()),
        HeaderMap::new(),
        Json(CreateConversationRequest::default()),
    )
    .await
    .unwrap();

    let Json(updated) = update_title(
        State(state.clone()),
        HeaderMap::new(),
        Path(created.id.clone()),
        Json(UpdateTitleRequest { title: "Homework".into() }),
    )
    .await
    .unwrap();
    assert_eq!(updated.message, "Title updated successfully");

    let Json(fetched) =
        get_conversation(State(state.clone()), HeaderMap::new(), Path(created.id.clone()))
            .await
            .unwrap();
    assert_eq!(fetched.title, "Homework");

    delete_conversation(State(state.clone()), HeaderMap::new(), Path(created.id.clone()))
        .await
        .unwrap();
    let err = delete_conversation(State(state), HeaderMap::new(), Path(created.id))
        .await
        .unwrap_err();
    assert_eq!(err.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_send_message_until_quota_runs_out() {
    let backend = Arc::new(StubBackend::answering(TUTOR_REPLY));
    let state = test_app_state_with(Arc::clone(&backend), 3);
    let Json(created) = create_conversation(
        State(state.clone()),
        bearer("u1"),
        Json(CreateConversationRequest::default()),
    )
    .await
    .unwrap();

    for _ in 0..3 {
        let Json(reply) = send_message(
            State(state.clone()),
            bearer("u1"),
            Path(created.id.clone()),
            message("How do I add fractions?"),
        )
        .await
        .unwrap();
        assert!(reply.content.starts_with(TUTOR_REPLY));
        assert!(reply.live);
    }

    let err = send_message(
        State(state.clone()),
        bearer("u1"),
        Path(created.id.clone()),
        message("And subtraction?"),
    )
    .await
    .unwrap_err();
    assert_eq!(err.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(err.body().used, Some(3));
    assert_eq!(backend.calls(), 3);

    let Json(conversation) =
        get_conversation(State(state), bearer("u1"), Path(created.id)).await.unwrap();
    assert_eq!(conversation.messages.len(), 6);
}

#[tokio::test]
async fn test_send_message_to_unknown_conversation_creates_one() {
    let state = test_app_state();

    let Json(reply) = send_message(
        State(state.clone()),
        bearer("u1"),
        Path("gone".to_string()),
        message("Hello?"),
    )
    .await
    .unwrap();

    assert!(reply.content.starts_with("⚠️ Conversation not found."));
    let Json(list) = list_conversations(State(state), bearer("u1")).await.unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(reply.conversation_id.as_deref(), Some(list[0].id.as_str()));
}

#[tokio::test]
async fn test_blank_message_is_bad_request() {
    let state = test_app_state();
    let err = send_message(State(state), bearer("u1"), Path("any".into()), message("  "))
        .await
        .unwrap_err();
    assert_eq!(err.status(), StatusCode::BAD_REQUEST);
}
