//! Health check endpoint

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::{AppState, CatalogState};

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// "ok", or "degraded" when the catalog failed to load
    pub status: String,
    pub module: String,
    pub version: String,
    pub uptime_seconds: u64,
    /// Drops available to new sessions
    pub drops: usize,
    pub active_sessions: usize,
    /// Last catalog or write error, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let uptime = Utc::now().signed_duration_since(state.startup_time);
    let uptime_seconds = uptime.num_seconds().max(0) as u64;

    let (status, drops, catalog_error) = match &state.catalog {
        CatalogState::Loaded(drops) => ("ok", drops.len(), None),
        CatalogState::Failed(e) => ("degraded", 0, Some(e.clone())),
    };
    let last_error = catalog_error.or(state.last_error.read().await.clone());

    Json(HealthResponse {
        status: status.to_string(),
        module: "dvt-survey".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds,
        drops,
        active_sessions: state.sessions.len().await,
        last_error,
    })
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
