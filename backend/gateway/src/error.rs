//! API error type and its HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use textlift_core::{ErrorKind, ValidationError};
use textlift_extractor::NotStarted;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("{0}")]
    Rejected(#[from] ValidationError),

    #[error("{}", not_started_message(.0))]
    NotStarted(NotStarted),

    #[error("No result available yet")]
    NoResult,

    #[error("No file selected")]
    NoPreview,

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

fn not_started_message(reason: &NotStarted) -> &'static str {
    match reason {
        NotStarted::NoFile => "Select a file before starting extraction",
        NotStarted::AlreadyInFlight => "An extraction is already in progress",
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            ApiError::SessionNotFound(_) => (StatusCode::NOT_FOUND, "session_not_found"),
            ApiError::Rejected(e) => match e.kind {
                ErrorKind::UnsupportedType => {
                    (StatusCode::UNSUPPORTED_MEDIA_TYPE, "unsupported_type")
                }
                ErrorKind::TooLarge => (StatusCode::PAYLOAD_TOO_LARGE, "too_large"),
            },
            ApiError::NotStarted(NotStarted::NoFile) => (StatusCode::CONFLICT, "no_file"),
            ApiError::NotStarted(NotStarted::AlreadyInFlight) => {
                (StatusCode::CONFLICT, "in_flight")
            }
            ApiError::NoResult => (StatusCode::NOT_FOUND, "no_result"),
            ApiError::NoPreview => (StatusCode::NOT_FOUND, "no_preview"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };

        let body = Json(json!({
            "error": {
                "type": error_type,
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
