//! API error types and JSON error response formatting.
//!
//! ApiError provides a consistent JSON error response format across all
//! endpoints, mapping subsystem errors to appropriate HTTP status codes.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use advisor_chat::ChatError;
use advisor_voice::TranscriptionError;
use advisor_weather::LookupError;

/// JSON error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code (e.g., "bad_request", "not_found").
    pub error: String,
    /// Human-readable error message.
    pub message: String,
}

/// API error type that maps to HTTP status codes and JSON responses.
#[derive(Debug)]
pub enum ApiError {
    /// 400 Bad Request - missing or invalid input.
    BadRequest(String),
    /// 404 Not Found - resource does not exist.
    NotFound(String),
    /// 500 Internal Server Error - unexpected server error.
    Internal(String),
    /// 502 Bad Gateway - an upstream provider failed.
    BadGateway(String),
    /// 503 Service Unavailable - a provider is not configured.
    ServiceUnavailable(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            ApiError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg)
            }
            ApiError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, "bad_gateway", msg),
            ApiError::ServiceUnavailable(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, "service_unavailable", msg)
            }
        };

        let body = ErrorBody {
            error: error_code.to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

impl From<LookupError> for ApiError {
    fn from(err: LookupError) -> Self {
        match err {
            LookupError::MissingApiKey => ApiError::ServiceUnavailable(err.to_string()),
            ref e if e.is_client_error() => ApiError::BadRequest(e.to_string()),
            other => {
                tracing::warn!(error = %other, "Weather provider failure");
                ApiError::BadGateway(format!("Weather service error: {other}"))
            }
        }
    }
}

impl From<TranscriptionError> for ApiError {
    fn from(err: TranscriptionError) -> Self {
        match err {
            TranscriptionError::MissingApiKey => ApiError::ServiceUnavailable(err.to_string()),
            ref e if e.is_client_error() => ApiError::BadRequest(e.to_string()),
            other => ApiError::BadGateway(format!("Transcription error: {other}")),
        }
    }
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::EmptyMessage | ChatError::MessageTooLong(_) => {
                ApiError::BadRequest(err.to_string())
            }
            ChatError::SessionNotFound(_) => ApiError::NotFound("Session not found".to_string()),
            ChatError::Weather(e) => e.into(),
            ChatError::StorageError(msg) => {
                tracing::error!(error = %msg, "Session storage failure");
                ApiError::Internal("Internal storage error".to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: ApiError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_lookup_error_is_bad_request() {
        assert_eq!(
            status_of(LookupError::EmptyLocation.into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(
                LookupError::Provider {
                    status: 400,
                    message: "No matching location found.".into()
                }
                .into()
            ),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(LookupError::MissingApiKey.into()),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_lookup_upstream_failure_is_bad_gateway() {
        assert_eq!(
            status_of(LookupError::Transport("operation timed out".into()).into()),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_of(
                LookupError::Provider {
                    status: 503,
                    message: "Service unavailable".into()
                }
                .into()
            ),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_of(LookupError::Decode("missing field `current`".into()).into()),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_of(ChatError::Weather(LookupError::Transport("reset".into())).into()),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_chat_error_mapping() {
        assert_eq!(
            status_of(ChatError::SessionNotFound("x".into()).into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(ChatError::EmptyMessage.into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(ChatError::StorageError("poisoned".into()).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_transcription_error_mapping() {
        assert_eq!(
            status_of(
                TranscriptionError::Provider {
                    status: 500,
                    message: "boom".into()
                }
                .into()
            ),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_of(TranscriptionError::InvalidAudio("bad".into()).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(TranscriptionError::MissingApiKey.into()),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_of(TranscriptionError::Transport("reset".into()).into()),
            StatusCode::BAD_GATEWAY
        );
    }
}
