//! Live sessions, keyed by session id
//!
//! Sessions are process-local and vanish on restart; only the records
//! dispatched to the store outlive them.

use dvt_common::SessionId;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::session::{SessionError, SessionView, SurveySession};

/// How often the sweeper looks for stale sessions
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(30);

/// When a session may be dropped from memory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvictionPolicy {
    /// Completed and fully saved, untouched for this long
    pub completed_grace: Duration,
    /// Any session untouched for this long, saved or not
    pub idle_ttl: Duration,
}

impl Default for EvictionPolicy {
    fn default() -> Self {
        Self {
            completed_grace: Duration::from_secs(60),
            idle_ttl: Duration::from_secs(2 * 60 * 60),
        }
    }
}

impl EvictionPolicy {
    fn is_stale(&self, session: &SurveySession, now: Instant) -> bool {
        if session.is_saving() {
            return false;
        }
        let idle = session.idle_for(now);
        let settled = session.ensure_settled().is_ok();
        (session.is_completed() && settled && idle >= self.completed_grace) || idle >= self.idle_ttl
    }
}

#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<SessionId, SurveySession>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a new session and return its first view
    pub async fn insert(&self, session: SurveySession) -> SessionView {
        let view = session.view();
        self.sessions.write().await.insert(session.id(), session);
        view
    }

    pub async fn view(&self, id: SessionId) -> Option<SessionView> {
        self.sessions.read().await.get(&id).map(SurveySession::view)
    }

    /// Run `f` against the session under the write lock
    pub async fn update<T>(
        &self,
        id: SessionId,
        f: impl FnOnce(&mut SurveySession) -> T,
    ) -> Option<T> {
        self.sessions.write().await.get_mut(&id).map(|session| {
            session.touch(Instant::now());
            f(session)
        })
    }

    /// Swap `old` for `new` atomically; `None` if `old` is unknown
    ///
    /// Refused while `old` still has unsaved or in-flight responses.
    pub async fn replace(
        &self,
        old: SessionId,
        new: SurveySession,
    ) -> Option<Result<SessionView, SessionError>> {
        let mut sessions = self.sessions.write().await;
        if let Err(e) = sessions.get(&old)?.ensure_settled() {
            return Some(Err(e));
        }
        sessions.remove(&old);
        let view = new.view();
        sessions.insert(new.id(), new);
        Some(Ok(view))
    }

    /// Remove sessions `policy` considers stale as of `now`
    pub async fn evict_stale(&self, now: Instant, policy: &EvictionPolicy) -> Vec<SurveySession> {
        let mut sessions = self.sessions.write().await;
        let stale: Vec<SessionId> = sessions
            .iter()
            .filter(|(_, s)| policy.is_stale(s, now))
            .map(|(id, _)| *id)
            .collect();
        stale.iter().filter_map(|id| sessions.remove(id)).collect()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
