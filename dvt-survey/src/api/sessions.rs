//! Session endpoints
//!
//! Every handler answers 503 while the catalog is unavailable. Record writes
//! are dispatched in the background; handlers return the updated view
//! without waiting for them.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use dvt_common::SessionId;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{ApiError, ApiResult};
use crate::onboarding::{OnboardingForm, GENDER_OPTIONS, MAX_AGE, MIN_AGE, MUSIC_PLATFORMS};
use crate::sequencer::{SequencerError, SequencerEvent};
use crate::session::{SessionError, SessionView};
use crate::AppState;

pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/:id", get(get_session))
        .route("/api/sessions/:id/onboarding", post(submit_onboarding))
        .route("/api/sessions/:id/rating", post(select_rating))
        .route("/api/sessions/:id/comment", post(edit_comment))
        .route("/api/sessions/:id/confirm", post(confirm))
        .route("/api/sessions/:id/keypress", post(keypress))
        .route("/api/sessions/:id/retry", post(retry))
        .route("/api/sessions/:id/reset", post(reset_session))
        .route("/api/onboarding/options", get(onboarding_options))
}

#[derive(Debug, Deserialize)]
pub struct RatingRequest {
    /// Range-checked into a rating, so out-of-range numbers answer like 0 or 6
    pub rating: i64,
}

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    #[serde(default)]
    pub comment: String,
}

#[derive(Debug, Deserialize)]
pub struct KeypressRequest {
    pub key: String,
}

#[derive(Debug, Serialize)]
pub struct KeypressResponse {
    /// False when the key has no binding (view unchanged)
    pub handled: bool,
    pub view: SessionView,
}

fn not_found(id: SessionId) -> ApiError {
    ApiError::NotFound(id.to_string())
}

/// POST /api/sessions
pub async fn create_session(
    State(state): State<AppState>,
) -> ApiResult<(StatusCode, Json<SessionView>)> {
    let session = state.new_session()?;
    tracing::info!(
        session_id = %session.id(),
        drops = session.order().len(),
        "Session started"
    );
    let view = state.sessions.insert(session).await;
    Ok((StatusCode::CREATED, Json(view)))
}

/// GET /api/sessions/:id
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
) -> ApiResult<Json<SessionView>> {
    state.catalog()?;
    state
        .sessions
        .view(id)
        .await
        .map(Json)
        .ok_or_else(|| not_found(id))
}

/// GET /api/onboarding/options
pub async fn onboarding_options() -> Json<Value> {
    Json(json!({
        "genders": GENDER_OPTIONS,
        "musicPlatforms": MUSIC_PLATFORMS,
        "minAge": MIN_AGE,
        "maxAge": MAX_AGE,
    }))
}

/// POST /api/sessions/:id/onboarding
///
/// 422 with per-field messages on invalid input. On success the session
/// moves on immediately; the participant record is written in the background.
pub async fn submit_onboarding(
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
    payload: Result<Json<OnboardingForm>, JsonRejection>,
) -> ApiResult<Json<SessionView>> {
    state.catalog()?;
    let Json(form) = payload?;
    let (participant, view) = state
        .sessions
        .update(id, |s| -> Result<_, SessionError> {
            let participant = s.submit_onboarding(&form)?;
            Ok((participant, s.view()))
        })
        .await
        .ok_or_else(|| not_found(id))??;

    tracing::info!(session_id = %id, "Onboarding accepted");
    state.writes.onboarding(participant);
    Ok(Json(view))
}

/// POST /api/sessions/:id/rating
pub async fn select_rating(
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
    payload: Result<Json<RatingRequest>, JsonRejection>,
) -> ApiResult<Json<SessionView>> {
    let Json(request) = payload?;
    let value = u8::try_from(request.rating)
        .map_err(|_| SequencerError::InvalidRating(request.rating))?;
    apply_event(&state, id, SequencerEvent::SelectRating(value))
        .await
        .map(Json)
}

/// POST /api/sessions/:id/comment
pub async fn edit_comment(
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
    payload: Result<Json<CommentRequest>, JsonRejection>,
) -> ApiResult<Json<SessionView>> {
    let Json(request) = payload?;
    apply_event(&state, id, SequencerEvent::EditComment(request.comment))
        .await
        .map(Json)
}

/// POST /api/sessions/:id/confirm
pub async fn confirm(
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
) -> ApiResult<Json<SessionView>> {
    apply_event(&state, id, SequencerEvent::Confirm).await.map(Json)
}

/// POST /api/sessions/:id/keypress
pub async fn keypress(
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
    payload: Result<Json<KeypressRequest>, JsonRejection>,
) -> ApiResult<Json<KeypressResponse>> {
    let Json(request) = payload?;
    let response = match state.keymap.dispatch(&request.key) {
        Some(event) => KeypressResponse {
            handled: true,
            view: apply_event(&state, id, event).await?,
        },
        None => {
            state.catalog()?;
            let view = state.sessions.view(id).await.ok_or_else(|| not_found(id))?;
            KeypressResponse {
                handled: false,
                view,
            }
        }
    };
    Ok(Json(response))
}

/// POST /api/sessions/:id/retry
///
/// Re-dispatch every response whose write failed. Writes that fail again
/// come back as pending.
pub async fn retry(
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
) -> ApiResult<Json<SessionView>> {
    state.catalog()?;
    let (pending, view) = state
        .sessions
        .update(id, |s| {
            let pending = s.take_pending_retries();
            for _ in &pending {
                s.begin_write();
            }
            (pending, s.view())
        })
        .await
        .ok_or_else(|| not_found(id))?;

    tracing::info!(session_id = %id, count = pending.len(), "Retrying failed writes");
    for response in pending {
        state.writes.response(response);
    }
    Ok(Json(view))
}

/// POST /api/sessions/:id/reset
///
/// Discard the session and start over: new id, new order, onboarding again.
/// 409 while any of its responses is unsaved or still being written, so a
/// failed final write keeps its retry prompt.
pub async fn reset_session(
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
) -> ApiResult<(StatusCode, Json<SessionView>)> {
    let session = state.new_session()?;
    let new_id = session.id();
    let view = state
        .sessions
        .replace(id, session)
        .await
        .ok_or_else(|| not_found(id))??;

    tracing::info!(session_id = %id, new_session_id = %new_id, "Session reset");
    Ok((StatusCode::CREATED, Json(view)))
}

/// Apply one sequencer event; a confirmation dispatches its response
async fn apply_event(
    state: &AppState,
    id: SessionId,
    event: SequencerEvent,
) -> ApiResult<SessionView> {
    state.catalog()?;
    let (confirmed, view) = state
        .sessions
        .update(id, |s| -> Result<_, SessionError> {
            let confirmed = s.apply(event)?;
            if confirmed.is_some() {
                s.begin_write();
            }
            Ok((confirmed, s.view()))
        })
        .await
        .ok_or_else(|| not_found(id))??;

    if let Some(confirmed) = confirmed {
        tracing::debug!(
            session_id = %id,
            drop_id = %confirmed.response.drop_id,
            "Drop confirmed"
        );
        if confirmed.completed {
            tracing::info!(session_id = %id, "Survey completed");
        }
        state.writes.response(confirmed.response);
    }
    Ok(view)
}
