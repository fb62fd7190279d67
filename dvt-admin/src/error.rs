//! Error types for dvt-admin

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Table is empty; nothing to download (404)
    #[error("{0}")]
    NoData(String),

    /// Backend read failed (502)
    #[error("{0}")]
    ExportFailed(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::NoData(msg) => (StatusCode::NOT_FOUND, "NO_DATA", msg),
            ApiError::ExportFailed(msg) => (StatusCode::BAD_GATEWAY, "EXPORT_FAILED", msg),
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
