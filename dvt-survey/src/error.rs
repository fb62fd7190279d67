//! Error types for dvt-survey

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::onboarding::FieldErrors;
use crate::sequencer::SequencerError;
use crate::session::{SessionError, SAVE_FAILED_PROMPT};

/// Message shown when the stimulus catalog could not be loaded
pub const CATALOG_UNAVAILABLE: &str = "Failed to load drops";

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Unknown session (404)
    #[error("Session not found: {0}")]
    NotFound(String),

    /// Onboarding form rejected (422)
    #[error("Validation failed")]
    Validation(FieldErrors),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Operation not allowed in the current state (409)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Catalog failed to load (503)
    #[error("{0}")]
    Unavailable(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Validation(errors) => ApiError::Validation(errors),
            SessionError::AlreadyOnboarded | SessionError::NotOnboarded => {
                ApiError::Conflict(err.to_string())
            }
            SessionError::Sequencer(err) => err.into(),
            SessionError::UnsavedResponses(_) => ApiError::Conflict(SAVE_FAILED_PROMPT.to_string()),
            SessionError::SaveInProgress => ApiError::Conflict(err.to_string()),
        }
    }
}

/// Malformed or mistyped JSON bodies answer in the usual error shape
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<SequencerError> for ApiError {
    fn from(err: SequencerError) -> Self {
        match err {
            SequencerError::RatingRequired | SequencerError::InvalidRating(_) => {
                ApiError::BadRequest(err.to_string())
            }
            SequencerError::AlreadyCompleted | SequencerError::EmptyCatalog => {
                ApiError::Conflict(err.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::Validation(errors) => {
                let body = Json(json!({
                    "error": {
                        "code": "VALIDATION_FAILED",
                        "message": "Please correct the highlighted fields",
                        "fields": errors,
                    }
                }));
                return (StatusCode::UNPROCESSABLE_ENTITY, body).into_response();
            }
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg),
            ApiError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, "UNAVAILABLE", msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg),
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
