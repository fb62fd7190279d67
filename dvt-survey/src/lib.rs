//! dvt-survey library interface
//!
//! Participant-facing flow of the drop visuals study: catalog loading,
//! per-session shuffle, onboarding, and the one-pass rating sequencer.

pub mod api;
pub mod catalog;
pub mod dispatch;
pub mod error;
pub mod keypress;
pub mod onboarding;
pub mod registry;
pub mod sequencer;
pub mod session;
pub mod shuffle;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use dvt_common::store::SharedStore;
use dvt_common::Drop;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tower_http::trace::TraceLayer;

use crate::catalog::CatalogError;
use crate::dispatch::WriteDispatcher;
use crate::keypress::{survey_keymap, Keymap};
use crate::registry::{EvictionPolicy, SessionRegistry, SWEEP_INTERVAL};
use crate::sequencer::SequencerEvent;
use crate::session::SurveySession;

/// Outcome of the startup catalog load
#[derive(Debug, Clone)]
pub enum CatalogState {
    Loaded(Arc<Vec<Drop>>),
    /// Load failed; sessions answer with an error state
    Failed(String),
}

impl From<Result<Vec<Drop>, CatalogError>> for CatalogState {
    fn from(result: Result<Vec<Drop>, CatalogError>) -> Self {
        match result {
            Ok(drops) => CatalogState::Loaded(Arc::new(drops)),
            Err(e) => CatalogState::Failed(e.to_string()),
        }
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub catalog: CatalogState,
    pub sessions: SessionRegistry,
    pub eviction: EvictionPolicy,
    pub writes: WriteDispatcher,
    pub keymap: Arc<Keymap<SequencerEvent>>,
    /// Source for presentation-order shuffles
    rng: Arc<Mutex<StdRng>>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last write error, for diagnostics
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(store: SharedStore, catalog: impl Into<CatalogState>) -> Self {
        let sessions = SessionRegistry::new();
        let last_error = Arc::new(RwLock::new(None));
        let writes = WriteDispatcher::new(store, sessions.clone(), last_error.clone());

        Self {
            catalog: catalog.into(),
            sessions,
            eviction: EvictionPolicy::default(),
            writes,
            keymap: Arc::new(survey_keymap()),
            rng: Arc::new(Mutex::new(StdRng::from_entropy())),
            startup_time: Utc::now(),
            last_error,
        }
    }

    /// Use a fixed RNG (reproducible presentation orders)
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = Arc::new(Mutex::new(rng));
        self
    }

    pub fn with_eviction(mut self, eviction: EvictionPolicy) -> Self {
        self.eviction = eviction;
        self
    }

    /// Drop stale sessions from memory; returns how many went
    ///
    /// Responses still awaiting retry on an evicted session get one last
    /// write attempt before they are forgotten.
    pub async fn sweep_sessions(&self) -> usize {
        let evicted = self.sessions.evict_stale(Instant::now(), &self.eviction).await;
        let count = evicted.len();
        for mut session in evicted {
            let unsaved = session.take_pending_retries();
            if !unsaved.is_empty() {
                tracing::warn!(
                    session_id = %session.id(),
                    count = unsaved.len(),
                    "Evicting idle session with unsaved responses; final write attempt"
                );
            }
            for response in unsaved {
                self.writes.response(response);
            }
        }
        if count > 0 {
            tracing::debug!(count, "Evicted stale sessions");
        }
        count
    }

    /// Background task sweeping stale sessions every `SWEEP_INTERVAL`
    pub fn spawn_session_sweeper(&self) -> JoinHandle<()> {
        let state = self.clone();
        tracing::info!(
            "Starting session sweeper (interval: {}s, completed grace: {}s, idle ttl: {}s)",
            SWEEP_INTERVAL.as_secs(),
            state.eviction.completed_grace.as_secs(),
            state.eviction.idle_ttl.as_secs()
        );

        tokio::spawn(async move {
            let mut ticker = interval(SWEEP_INTERVAL);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                state.sweep_sessions().await;
            }
        })
    }

    /// The loaded catalog, or the fatal load error
    pub fn catalog(&self) -> ApiResult<&[Drop]> {
        match &self.catalog {
            CatalogState::Loaded(drops) => Ok(drops.as_slice()),
            CatalogState::Failed(_) => Err(ApiError::Unavailable(
                error::CATALOG_UNAVAILABLE.to_string(),
            )),
        }
    }

    /// Fresh session with its own shuffled order
    pub fn new_session(&self) -> ApiResult<SurveySession> {
        let catalog = self.catalog()?;
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| ApiError::Internal("shuffle source poisoned".to_string()))?;
        Ok(SurveySession::initialize(catalog, &mut *rng))
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::ui_routes())
        .merge(api::session_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
