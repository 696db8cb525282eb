//! Downstream chat-completion endpoint.

use std::time::Duration;

use async_trait::async_trait;
use edubot_types::protocol::{ChatCompletionRequest, ChatCompletionResponse};
use edubot_types::AttemptOutcome;
use reqwest::{Client, StatusCode};
use thiserror::Error;

use super::credentials::Credential;

const ERROR_BODY_PREVIEW: usize = 200;

/// Why one outbound call produced no usable answer.
///
/// Internal to dispatch: always folded into an [`AttemptOutcome`] and, on
/// exhaustion, a canned reply.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UpstreamFailure {
    #[error("empty or malformed response body")]
    Empty,
    #[error("rate limited (429)")]
    RateLimited,
    #[error("server error {status}: {body}")]
    Server { status: u16, body: String },
    #[error("HTTP {status}: {body}")]
    Client { status: u16, body: String },
    #[error("request timed out")]
    Timeout,
    #[error("connection failed: {0}")]
    Connection(String),
    #[error("unexpected failure: {0}")]
    Unexpected(String),
}

impl UpstreamFailure {
    pub fn outcome(&self) -> AttemptOutcome {
        match self {
            Self::Empty => AttemptOutcome::Empty,
            Self::RateLimited => AttemptOutcome::RateLimited,
            Self::Server { status, .. } => AttemptOutcome::ServerError(*status),
            Self::Client { status, .. } => AttemptOutcome::ClientError(*status),
            Self::Timeout => AttemptOutcome::Timeout,
            Self::Connection(_) => AttemptOutcome::Connection,
            Self::Unexpected(_) => AttemptOutcome::Unexpected,
        }
    }

    fn from_status(status: StatusCode, body: &str) -> Self {
        let body = truncate(body);
        match status.as_u16() {
            429 => Self::RateLimited,
            code @ 500..=599 => Self::Server { status: code, body },
            code => Self::Client { status: code, body },
        }
    }
}

impl From<reqwest::Error> for UpstreamFailure {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_connect() {
            Self::Connection(err.to_string())
        } else {
            Self::Unexpected(err.to_string())
        }
    }
}

fn truncate(body: &str) -> String {
    if body.chars().count() > ERROR_BODY_PREVIEW {
        let cut: String = body.chars().take(ERROR_BODY_PREVIEW).collect();
        format!("{cut}...")
    } else {
        body.to_string()
    }
}

/// A single chat-completion call with a bearer credential.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Returns the trimmed, non-empty answer text.
    async fn complete(
        &self,
        credential: &Credential,
        request: &ChatCompletionRequest,
        timeout: Duration,
    ) -> Result<String, UpstreamFailure>;
}

/// OpenAI-compatible HTTP backend (OpenRouter by default).
#[derive(Clone)]
pub struct OpenRouterBackend {
    http_client: Client,
    api_url: String,
}

impl OpenRouterBackend {
    /// Accepts a pre-built client so TLS setup happens once at startup.
    pub fn new(http_client: Client, api_url: impl Into<String>) -> Self {
        Self { http_client, api_url: api_url.into() }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    async fn send(
        &self,
        credential: &Credential,
        request: &ChatCompletionRequest,
    ) -> Result<String, UpstreamFailure> {
        let response = self
            .http_client
            .post(&self.api_url)
            .bearer_auth(credential.expose())
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(UpstreamFailure::from_status(status, &body));
        }

        let parsed: ChatCompletionResponse =
            serde_json::from_str(&body).map_err(|_| UpstreamFailure::Empty)?;
        parsed.first_content().map(str::to_string).ok_or(UpstreamFailure::Empty)
    }
}

#[async_trait]
impl ChatBackend for OpenRouterBackend {
    async fn complete(
        &self,
        credential: &Credential,
        request: &ChatCompletionRequest,
        timeout: Duration,
    ) -> Result<String, UpstreamFailure> {
        match tokio::time::timeout(timeout, self.send(credential, request)).await {
            Ok(result) => result,
            Err(_) => Err(UpstreamFailure::Timeout),
        }
    }
}
