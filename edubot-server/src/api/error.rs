//! Maps core errors onto HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use edubot_core::AppError;
use edubot_types::QuotaError;
use serde::Serialize;
use tracing::error;

#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<QuotaError> for ApiError {
    fn from(err: QuotaError) -> Self {
        Self(AppError::Quota(err))
    }
}

/// Error body. Quota rejections carry the counters so the client can show
/// when prompting becomes possible again.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub used: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_reset: Option<DateTime<Utc>>,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.0.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn body(&self) -> ErrorBody {
        match &self.0 {
            AppError::Quota(QuotaError::Exceeded { used, max, next_reset }) => ErrorBody {
                detail: self.0.to_string(),
                used: Some(*used),
                max: Some(*max),
                next_reset: *next_reset,
            },
            other => {
                let detail = if self.status().is_server_error() {
                    error!("Request failed: {}", other);
                    "Internal server error".to_string()
                } else {
                    other.to_string()
                };
                ErrorBody { detail, used: None, max: None, next_reset: None }
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}
