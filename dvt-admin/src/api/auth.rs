//! Shared-key gate for the export endpoints
//!
//! The key travels as a `?key=` URL parameter or an `x-admin-key` header.
//! With no key configured the gate stays closed for everyone.

use axum::{
    extract::{Query, Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use crate::AppState;

pub const ADMIN_KEY_HEADER: &str = "x-admin-key";

#[derive(Debug, Default, Deserialize)]
pub struct KeyQuery {
    key: Option<String>,
}

/// Authentication middleware (protected routes only)
pub async fn auth_middleware(
    State(state): State<AppState>,
    Query(query): Query<KeyQuery>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let Some(expected) = state.admin_key.as_deref() else {
        warn!(path = %request.uri().path(), "Export request refused: admin key not configured");
        return Err(AuthError::Locked);
    };

    let provided = query.key.or_else(|| {
        headers
            .get(ADMIN_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    });

    match provided {
        Some(key) if keys_match(&key, expected) => Ok(next.run(request).await),
        Some(_) => {
            warn!(path = %request.uri().path(), "Export request refused: wrong admin key");
            Err(AuthError::InvalidKey)
        }
        None => Err(AuthError::MissingKey),
    }
}

/// Compare without bailing out at the first differing byte
fn keys_match(provided: &str, expected: &str) -> bool {
    let (a, b) = (provided.as_bytes(), expected.as_bytes());
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// GET /api/auth/check
///
/// Lets the panel confirm a key before offering downloads.
pub async fn check_key() -> Json<serde_json::Value> {
    Json(json!({ "ok": true }))
}

/// Authentication error types for HTTP responses
#[derive(Debug, PartialEq, Eq)]
pub enum AuthError {
    /// No admin key configured on the server
    Locked,
    MissingKey,
    InvalidKey,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AuthError::Locked => (
                StatusCode::FORBIDDEN,
                "LOCKED",
                "Admin access is not configured",
            ),
            AuthError::MissingKey => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", "Admin key required"),
            AuthError::InvalidKey => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", "Invalid key"),
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}
