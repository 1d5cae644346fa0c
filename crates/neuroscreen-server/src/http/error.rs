//! Mapping of pipeline failures to HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use neuroscreen_core::domain::QuestionnaireError;
use neuroscreen_core::{AnalysisError, ChatError};
use tracing::error;

/// Error returned by request handlers.
///
/// Client errors carry a message safe to echo. Server errors are logged with
/// their full cause chain and answered with a fixed short body.
#[derive(Debug)]
pub enum ApiError {
    /// 400 with a message for the caller.
    BadRequest(String),
    /// 413, upload exceeded the body limit.
    PayloadTooLarge,
    /// 500, cause is logged only.
    Internal(anyhow::Error),
    /// 502, the chat upstream failed.
    Upstream(String),
    /// 503, chat is not configured.
    ChatUnavailable,
}

impl ApiError {
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message).into_response(),
            Self::PayloadTooLarge => {
                (StatusCode::PAYLOAD_TOO_LARGE, "Upload too large").into_response()
            }
            Self::Internal(e) => {
                error!("Request failed: {e:#}");
                (StatusCode::INTERNAL_SERVER_ERROR, "Analysis failed").into_response()
            }
            Self::Upstream(cause) => {
                error!("Chat upstream failed: {cause}");
                (StatusCode::BAD_GATEWAY, "upstream unavailable").into_response()
            }
            Self::ChatUnavailable => {
                (StatusCode::SERVICE_UNAVAILABLE, "chat is not configured").into_response()
            }
        }
    }
}

impl From<AnalysisError> for ApiError {
    fn from(e: AnalysisError) -> Self {
        if e.is_client_error() {
            Self::BadRequest(e.to_string())
        } else {
            Self::Internal(e.into())
        }
    }
}

impl From<ChatError> for ApiError {
    fn from(e: ChatError) -> Self {
        match e {
            ChatError::EmptyMessage => Self::BadRequest(e.to_string()),
            ChatError::Upstream(cause) => Self::Upstream(cause),
            ChatError::NotConfigured => Self::ChatUnavailable,
        }
    }
}

impl From<QuestionnaireError> for ApiError {
    fn from(e: QuestionnaireError) -> Self {
        Self::BadRequest(e.to_string())
    }
}
