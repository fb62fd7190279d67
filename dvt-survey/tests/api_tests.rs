//! Integration tests for dvt-survey API endpoints
//!
//! Drives the router in-process with an in-memory store. Covers:
//! - Session creation, onboarding validation, and the rating flow
//! - Background writes (onboarding failure swallowed, response retry)
//! - Keyboard shortcuts, reset, empty and failed catalogs
//! - Eviction of finished and abandoned sessions
//! - Health endpoint

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use dvt_common::store::MemoryStore;
use dvt_common::Drop;
use dvt_survey::sequencer::RATING_REQUIRED_PROMPT;
use dvt_survey::session::{COMPLETION_MESSAGE, NO_VIDEOS_MESSAGE, SAVE_FAILED_PROMPT};
use dvt_survey::registry::EvictionPolicy;
use dvt_survey::{build_router, AppState, CatalogState};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::util::ServiceExt; // for `oneshot` method

/// Test helper: catalog of `n` drops
fn drops(n: usize) -> Vec<Drop> {
    (1..=n)
        .map(|i| Drop {
            id: format!("drop-{i:02}"),
            track: format!("Track {i}"),
            artist: format!("Artist {i}"),
            video_url: format!("/videos/drop-{i:02}.mp4"),
            duration_sec: 15.0,
        })
        .collect()
}

/// Test helper: state over a memory store with a seeded shuffle
fn setup_state(store: Arc<MemoryStore>, catalog: impl Into<CatalogState>) -> AppState {
    AppState::new(store, catalog).with_rng(StdRng::seed_from_u64(42))
}

fn setup_app(store: Arc<MemoryStore>, catalog: impl Into<CatalogState>) -> Router {
    build_router(setup_state(store, catalog))
}

fn loaded(n: usize) -> CatalogState {
    CatalogState::Loaded(Arc::new(drops(n)))
}

/// Test helper: send a request, return status and JSON body
async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Should read body");
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

fn valid_onboarding() -> Value {
    json!({
        "name": "Ada",
        "age": "34",
        "gender": "female",
        "location": "Berlin",
        "musicPlatforms": ["spotify", "apple-music"]
    })
}

/// Test helper: create a session and pass onboarding
async fn onboarded_session(app: &Router) -> (String, Value) {
    let (status, view) = send(app, "POST", "/api/sessions", None).await;
    assert_eq!(status, StatusCode::CREATED);
    let id = view["session_id"].as_str().unwrap().to_string();

    let (status, view) = send(
        app,
        "POST",
        &format!("/api/sessions/{id}/onboarding"),
        Some(valid_onboarding()),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{view}");
    (id, view)
}

/// Background writes finish shortly after the handler returns
async fn wait_for_responses(store: &MemoryStore, count: usize) {
    for _ in 0..200 {
        if store.responses().await.len() == count {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("expected {count} stored responses");
}

async fn wait_for_participants(store: &MemoryStore, count: usize) {
    for _ in 0..200 {
        if store.participants().await.len() == count {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("expected {count} stored participants");
}

/// Poll a GET endpoint until `check` accepts the body
async fn wait_for_json(app: &Router, uri: &str, check: impl Fn(&Value) -> bool) -> Value {
    for _ in 0..200 {
        let (_, body) = send(app, "GET", uri, None).await;
        if check(&body) {
            return body;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("{uri} never reached the expected state");
}

// =============================================================================
// Sessions and onboarding
// =============================================================================

#[tokio::test]
async fn test_new_session_starts_at_onboarding() {
    let app = setup_app(Arc::new(MemoryStore::new()), loaded(3));

    let (status, view) = send(&app, "POST", "/api/sessions", None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(view["screen"], "onboarding");
    assert!(view["session_id"].is_string());
    assert!(view.get("save_error").is_none());

    let id = view["session_id"].as_str().unwrap();
    let (status, fetched) = send(&app, "GET", &format!("/api/sessions/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, view);
}

#[tokio::test]
async fn test_sessions_get_distinct_ids() {
    let app = setup_app(Arc::new(MemoryStore::new()), loaded(3));
    let (_, a) = send(&app, "POST", "/api/sessions", None).await;
    let (_, b) = send(&app, "POST", "/api/sessions", None).await;
    assert_ne!(a["session_id"], b["session_id"]);
}

#[tokio::test]
async fn test_onboarding_options() {
    let app = setup_app(Arc::new(MemoryStore::new()), loaded(1));
    let (status, body) = send(&app, "GET", "/api/onboarding/options", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["genders"].as_array().unwrap().len(), 4);
    assert_eq!(body["musicPlatforms"][0]["value"], "spotify");
    assert_eq!(body["minAge"], 1);
    assert_eq!(body["maxAge"], 120);
}

#[tokio::test]
async fn test_invalid_onboarding_returns_field_errors() {
    let store = Arc::new(MemoryStore::new());
    let app = setup_app(store.clone(), loaded(3));
    let (_, view) = send(&app, "POST", "/api/sessions", None).await;
    let id = view["session_id"].as_str().unwrap();

    let mut form = valid_onboarding();
    form["age"] = json!("0");
    form["musicPlatforms"] = json!([]);

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/sessions/{id}/onboarding"),
        Some(form),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let fields = body["error"]["fields"].as_object().unwrap();
    assert_eq!(fields.len(), 2);
    assert_eq!(fields["age"], "Age must be at least 1");
    assert_eq!(fields["musicPlatforms"], "Please select at least one music platform");

    let (_, view) = send(&app, "GET", &format!("/api/sessions/{id}"), None).await;
    assert_eq!(view["screen"], "onboarding");
    assert!(store.participants().await.is_empty());
}

#[tokio::test]
async fn test_onboarding_write_failure_still_advances() {
    let store = Arc::new(MemoryStore::new());
    store.set_fail_writes(true);
    let app = setup_app(store.clone(), loaded(3));

    let (_, view) = onboarded_session(&app).await;
    assert_eq!(view["screen"], "presenting");
    assert_eq!(view["position"], 1);
    assert_eq!(view["total"], 3);

    // The failure only surfaces in diagnostics
    wait_for_json(&app, "/health", |health| health["last_error"].is_string()).await;
    assert!(store.participants().await.is_empty());
}

#[tokio::test]
async fn test_onboarding_twice_conflicts() {
    let app = setup_app(Arc::new(MemoryStore::new()), loaded(2));
    let (id, _) = onboarded_session(&app).await;

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/sessions/{id}/onboarding"),
        Some(valid_onboarding()),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONFLICT");
}

// =============================================================================
// Rating flow
// =============================================================================

#[tokio::test]
async fn test_three_drop_run_writes_three_responses_in_order() {
    let store = Arc::new(MemoryStore::new());
    let app = setup_app(store.clone(), loaded(3));
    let (id, mut view) = onboarded_session(&app).await;

    let answers: [(u8, &str); 3] = [(4, "nice"), (1, ""), (5, "wow")];
    let mut shown = Vec::new();

    for (i, (rating, comment)) in answers.iter().enumerate() {
        assert_eq!(view["screen"], "presenting");
        assert_eq!(view["position"], i + 1);
        let label = if i == 2 { "Finish" } else { "Next" };
        assert_eq!(view["button_label"], label);
        shown.push(view["drop"]["id"].as_str().unwrap().to_string());

        let (status, _) = send(
            &app,
            "POST",
            &format!("/api/sessions/{id}/rating"),
            Some(json!({ "rating": rating })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        if !comment.is_empty() {
            let (status, _) = send(
                &app,
                "POST",
                &format!("/api/sessions/{id}/comment"),
                Some(json!({ "comment": comment })),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
        }

        let (status, next) = send(&app, "POST", &format!("/api/sessions/{id}/confirm"), None).await;
        assert_eq!(status, StatusCode::OK);
        view = next;
    }

    assert_eq!(view["screen"], "completed");
    assert_eq!(view["message"], COMPLETION_MESSAGE);

    // Every drop shown exactly once
    let mut sorted = shown.clone();
    sorted.sort();
    assert_eq!(sorted, vec!["drop-01", "drop-02", "drop-03"]);

    wait_for_responses(&store, 3).await;
    let mut responses = store.responses().await;
    responses.sort_by_key(|r| shown.iter().position(|d| *d == r.drop_id));

    let drop_ids: Vec<&str> = responses.iter().map(|r| r.drop_id.as_str()).collect();
    assert_eq!(drop_ids, shown.iter().map(String::as_str).collect::<Vec<_>>());
    let impacts: Vec<u8> = responses.iter().map(|r| r.visuals_impact).collect();
    assert_eq!(impacts, vec![4, 1, 5]);
    let comments: Vec<Option<&str>> = responses.iter().map(|r| r.comment.as_deref()).collect();
    assert_eq!(comments, vec![Some("nice"), None, Some("wow")]);
    assert!(responses.iter().all(|r| r.onboarding_name == "Ada"));
    assert!(responses.iter().all(|r| r.session_id.to_string() == id));

    wait_for_participants(&store, 1).await;
    assert_eq!(store.participants().await[0].music_platforms, vec!["spotify", "apple-music"]);
}

#[tokio::test]
async fn test_rating_zero_rejected() {
    let app = setup_app(Arc::new(MemoryStore::new()), loaded(2));
    let (id, _) = onboarded_session(&app).await;

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/sessions/{id}/rating"),
        Some(json!({ "rating": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");

    let (_, view) = send(&app, "GET", &format!("/api/sessions/{id}"), None).await;
    assert_eq!(view["position"], 1);
    assert!(view["rating"].is_null());
}

#[tokio::test]
async fn test_malformed_rating_answers_json_error() {
    let app = setup_app(Arc::new(MemoryStore::new()), loaded(2));
    let (id, _) = onboarded_session(&app).await;
    let uri = format!("/api/sessions/{id}/rating");

    let (status, body) = send(&app, "POST", &uri, Some(json!({ "rating": 300 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
    assert_eq!(body["error"]["message"], "Rating must be between 1 and 5, got 300");

    let (status, body) = send(&app, "POST", &uri, Some(json!({ "rating": -1 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "Rating must be between 1 and 5, got -1");

    let (status, body) = send(&app, "POST", &uri, Some(json!({ "rating": "abc" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
    assert!(body["error"]["message"].is_string());

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/sessions/{id}/keypress"),
        Some(json!({ "keys": "1" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");

    let (_, view) = send(&app, "GET", &format!("/api/sessions/{id}"), None).await;
    assert!(view["rating"].is_null());
}

#[tokio::test]
async fn test_confirm_requires_rating() {
    let store = Arc::new(MemoryStore::new());
    let app = setup_app(store.clone(), loaded(2));
    let (id, _) = onboarded_session(&app).await;

    let (status, body) = send(&app, "POST", &format!("/api/sessions/{id}/confirm"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], RATING_REQUIRED_PROMPT);

    let (_, view) = send(&app, "GET", &format!("/api/sessions/{id}"), None).await;
    assert_eq!(view["position"], 1);
    assert!(store.responses().await.is_empty());
}

#[tokio::test]
async fn test_rating_before_onboarding_conflicts() {
    let app = setup_app(Arc::new(MemoryStore::new()), loaded(2));
    let (_, view) = send(&app, "POST", "/api/sessions", None).await;
    let id = view["session_id"].as_str().unwrap();

    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/sessions/{id}/rating"),
        Some(json!({ "rating": 3 })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_confirm_after_completion_conflicts() {
    let store = Arc::new(MemoryStore::new());
    let app = setup_app(store.clone(), loaded(1));
    let (id, _) = onboarded_session(&app).await;

    send(&app, "POST", &format!("/api/sessions/{id}/rating"), Some(json!({ "rating": 2 }))).await;
    let (_, view) = send(&app, "POST", &format!("/api/sessions/{id}/confirm"), None).await;
    assert_eq!(view["screen"], "completed");

    let (status, _) = send(&app, "POST", &format!("/api/sessions/{id}/confirm"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    wait_for_responses(&store, 1).await;
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(store.responses().await.len(), 1);
}

// =============================================================================
// Keyboard shortcuts
// =============================================================================

#[tokio::test]
async fn test_keypress_rates_and_confirms() {
    let store = Arc::new(MemoryStore::new());
    let app = setup_app(store.clone(), loaded(2));
    let (id, _) = onboarded_session(&app).await;
    let uri = format!("/api/sessions/{id}/keypress");

    let (status, body) = send(&app, "POST", &uri, Some(json!({ "key": "3" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["handled"], true);
    assert_eq!(body["view"]["rating"], 3);

    let (_, body) = send(&app, "POST", &uri, Some(json!({ "key": "q" }))).await;
    assert_eq!(body["handled"], false);
    assert_eq!(body["view"]["position"], 1);

    let (_, body) = send(&app, "POST", &uri, Some(json!({ "key": "ArrowDown" }))).await;
    assert_eq!(body["handled"], true);
    assert_eq!(body["view"]["position"], 2);

    wait_for_responses(&store, 1).await;
    assert_eq!(store.responses().await[0].visuals_impact, 3);
}

#[tokio::test]
async fn test_enter_without_rating_rejected() {
    let app = setup_app(Arc::new(MemoryStore::new()), loaded(2));
    let (id, _) = onboarded_session(&app).await;

    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/sessions/{id}/keypress"),
        Some(json!({ "key": "Enter" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// =============================================================================
// Failed response writes and retry
// =============================================================================

#[tokio::test]
async fn test_failed_response_write_can_be_retried() {
    let store = Arc::new(MemoryStore::new());
    let app = setup_app(store.clone(), loaded(2));
    let (id, _) = onboarded_session(&app).await;
    store.set_fail_writes(true);

    send(&app, "POST", &format!("/api/sessions/{id}/rating"), Some(json!({ "rating": 4 }))).await;
    let (_, view) = send(&app, "POST", &format!("/api/sessions/{id}/confirm"), None).await;
    // Sequencing is never blocked by the write
    assert_eq!(view["position"], 2);

    let session_uri = format!("/api/sessions/{id}");
    wait_for_json(&app, &session_uri, |view| view["save_error"] == SAVE_FAILED_PROMPT).await;
    assert!(store.responses().await.is_empty());

    store.set_fail_writes(false);
    let (status, view) = send(&app, "POST", &format!("/api/sessions/{id}/retry"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(view.get("save_error").is_none());
    assert_eq!(view["pending_retries"], 0);

    wait_for_responses(&store, 1).await;
    assert_eq!(store.responses().await[0].visuals_impact, 4);
}

#[tokio::test]
async fn test_failed_final_write_blocks_reset_until_retried() {
    let store = Arc::new(MemoryStore::new());
    let app = setup_app(store.clone(), loaded(1));
    let (id, _) = onboarded_session(&app).await;
    store.set_fail_writes(true);

    send(&app, "POST", &format!("/api/sessions/{id}/rating"), Some(json!({ "rating": 5 }))).await;
    let (_, view) = send(&app, "POST", &format!("/api/sessions/{id}/confirm"), None).await;
    assert_eq!(view["screen"], "completed");

    let session_uri = format!("/api/sessions/{id}");
    let view = wait_for_json(&app, &session_uri, |view| view["saving"] == false).await;
    assert_eq!(view["screen"], "completed");
    assert_eq!(view["save_error"], SAVE_FAILED_PROMPT);
    assert_eq!(view["pending_retries"], 1);

    // Starting over would discard the last rating
    let reset_uri = format!("/api/sessions/{id}/reset");
    let (status, body) = send(&app, "POST", &reset_uri, None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["message"], SAVE_FAILED_PROMPT);
    let (status, _) = send(&app, "GET", &session_uri, None).await;
    assert_eq!(status, StatusCode::OK);

    store.set_fail_writes(false);
    let (status, _) = send(&app, "POST", &format!("/api/sessions/{id}/retry"), None).await;
    assert_eq!(status, StatusCode::OK);
    wait_for_responses(&store, 1).await;
    assert_eq!(store.responses().await[0].visuals_impact, 5);

    wait_for_json(&app, &session_uri, |view| {
        view["saving"] == false && view["pending_retries"] == 0
    })
    .await;
    let (status, view) = send(&app, "POST", &reset_uri, None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(view["screen"], "onboarding");
}

// =============================================================================
// Session eviction
// =============================================================================

/// Sweep until the registry is empty; writes may still be resolving
async fn sweep_until_empty(state: &AppState) {
    for _ in 0..200 {
        state.sweep_sessions().await;
        if state.sessions.is_empty().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("sessions were never evicted");
}

#[tokio::test]
async fn test_completed_runs_are_evicted() {
    let store = Arc::new(MemoryStore::new());
    let state = setup_state(store.clone(), loaded(1)).with_eviction(EvictionPolicy {
        completed_grace: Duration::ZERO,
        ..EvictionPolicy::default()
    });
    let app = build_router(state.clone());

    for _ in 0..10 {
        let (id, _) = onboarded_session(&app).await;
        send(&app, "POST", &format!("/api/sessions/{id}/rating"), Some(json!({ "rating": 3 }))).await;
        let (_, view) = send(&app, "POST", &format!("/api/sessions/{id}/confirm"), None).await;
        assert_eq!(view["screen"], "completed");
    }
    // An unfinished session stays put
    let (open_id, _) = onboarded_session(&app).await;

    wait_for_responses(&store, 10).await;
    for _ in 0..200 {
        state.sweep_sessions().await;
        if state.sessions.len().await == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let (_, health) = send(&app, "GET", "/health", None).await;
    assert_eq!(health["active_sessions"], 1);
    let (status, _) = send(&app, "GET", &format!("/api/sessions/{open_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_fresh_sessions_survive_default_sweep() {
    let state = setup_state(Arc::new(MemoryStore::new()), loaded(2));
    let app = build_router(state.clone());
    onboarded_session(&app).await;

    assert_eq!(state.sweep_sessions().await, 0);
    assert_eq!(state.sessions.len().await, 1);
}

#[tokio::test]
async fn test_idle_sessions_evicted_with_final_write_attempt() {
    let store = Arc::new(MemoryStore::new());
    let state = setup_state(store.clone(), loaded(3)).with_eviction(EvictionPolicy {
        completed_grace: Duration::ZERO,
        idle_ttl: Duration::ZERO,
    });
    let app = build_router(state.clone());

    // Abandoned right after onboarding
    let (idle_id, _) = onboarded_session(&app).await;

    // Abandoned with a failed write outstanding
    let (unsaved_id, _) = onboarded_session(&app).await;
    store.set_fail_writes(true);
    send(&app, "POST", &format!("/api/sessions/{unsaved_id}/rating"), Some(json!({ "rating": 2 }))).await;
    send(&app, "POST", &format!("/api/sessions/{unsaved_id}/confirm"), None).await;
    wait_for_json(&app, &format!("/api/sessions/{unsaved_id}"), |view| {
        view["pending_retries"] == 1 && view["saving"] == false
    })
    .await;
    store.set_fail_writes(false);

    sweep_until_empty(&state).await;

    for id in [&idle_id, &unsaved_id] {
        let (status, _) = send(&app, "GET", &format!("/api/sessions/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
    wait_for_responses(&store, 1).await;
    assert_eq!(store.responses().await[0].visuals_impact, 2);
}

// =============================================================================
// Reset, empty and failed catalogs
// =============================================================================

#[tokio::test]
async fn test_reset_starts_fresh_session() {
    let app = setup_app(Arc::new(MemoryStore::new()), loaded(3));
    let (id, _) = onboarded_session(&app).await;

    let (status, view) = send(&app, "POST", &format!("/api/sessions/{id}/reset"), None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(view["screen"], "onboarding");
    assert_ne!(view["session_id"], id.as_str());

    let (status, _) = send(&app, "GET", &format!("/api/sessions/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_session_not_found() {
    let app = setup_app(Arc::new(MemoryStore::new()), loaded(1));
    let unknown = uuid_like();

    let (status, body) = send(&app, "GET", &format!("/api/sessions/{unknown}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    let (status, _) = send(&app, "POST", &format!("/api/sessions/{unknown}/reset"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

fn uuid_like() -> String {
    dvt_common::SessionId::generate().to_string()
}

#[tokio::test]
async fn test_empty_catalog_shows_empty_state() {
    let app = setup_app(Arc::new(MemoryStore::new()), loaded(0));
    let (_, view) = onboarded_session(&app).await;

    assert_eq!(view["screen"], "empty");
    assert_eq!(view["message"], NO_VIDEOS_MESSAGE);
}

#[tokio::test]
async fn test_failed_catalog_answers_503() {
    let app = setup_app(
        Arc::new(MemoryStore::new()),
        CatalogState::Failed("Malformed catalog".to_string()),
    );

    let (status, body) = send(&app, "POST", "/api/sessions", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["message"], "Failed to load drops");

    let (status, _) = send(&app, "GET", &format!("/api/sessions/{}", uuid_like()), None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let (status, health) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "degraded");
    assert_eq!(health["last_error"], "Malformed catalog");
}

// =============================================================================
// Health and UI
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let app = setup_app(Arc::new(MemoryStore::new()), loaded(6));
    send(&app, "POST", "/api/sessions", None).await;

    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "dvt-survey");
    assert_eq!(body["drops"], 6);
    assert_eq!(body["active_sessions"], 1);
    assert!(body["version"].is_string());
    assert!(body.get("last_error").is_none());
}

#[tokio::test]
async fn test_ui_served() {
    let app = setup_app(Arc::new(MemoryStore::new()), loaded(1));

    for (uri, content_type) in [("/", "text/html"), ("/static/app.js", "application/javascript")] {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let header = response.headers()["content-type"].to_str().unwrap().to_string();
        assert!(header.starts_with(content_type), "{uri}: {header}");
    }
}
