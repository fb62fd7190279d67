//! dvt-admin library - researcher export panel
//!
//! Reads every stored participant and response record on demand and
//! serves them as CSV downloads behind a shared key.

use axum::Router;
use chrono::{DateTime, Utc};
use dvt_common::store::SharedStore;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod error;

pub use crate::error::{ApiError, ApiResult};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,
    /// Shared key unlocking the export endpoints; `None` keeps them locked
    pub admin_key: Option<Arc<str>>,
    pub startup_time: DateTime<Utc>,
    /// Last export failure, for diagnostics
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(store: SharedStore, admin_key: Option<String>) -> Self {
        Self {
            store,
            admin_key: admin_key.map(Arc::from),
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        }
    }
}

/// Build application router
///
/// `/health` and the UI are public; everything under `/api` needs the key.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::get;

    let protected = Router::new()
        .route("/api/auth/check", get(api::check_key))
        .route("/api/export/onboarding.csv", get(api::export_onboarding))
        .route("/api/export/surveys.csv", get(api::export_surveys))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::auth_middleware,
        ));

    let public = Router::new()
        .route("/", get(api::serve_index))
        .route("/static/app.js", get(api::serve_app_js))
        .merge(api::health_routes());

    Router::new()
        .merge(protected)
        .merge(public)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
