//! Anonymous identity tokens

use axum::response::Json;
use serde::Serialize;

use edubot_core::modules::issue_token;

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

pub async fn new_token() -> Json<TokenResponse> {
    Json(TokenResponse { token: issue_token() })
}
