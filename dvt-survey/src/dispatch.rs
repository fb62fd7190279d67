//! Fire-and-forget record writes
//!
//! Participant-facing operations never wait on the backend. Each write runs
//! on its own task; its outcome only feeds logs, the health endpoint and, for
//! responses, the session's pending-retry list.

use dvt_common::store::SharedStore;
use dvt_common::{Participant, SurveyResponse};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use crate::registry::SessionRegistry;

#[derive(Clone)]
pub struct WriteDispatcher {
    store: SharedStore,
    sessions: SessionRegistry,
    last_error: Arc<RwLock<Option<String>>>,
}

impl WriteDispatcher {
    pub fn new(
        store: SharedStore,
        sessions: SessionRegistry,
        last_error: Arc<RwLock<Option<String>>>,
    ) -> Self {
        Self {
            store,
            sessions,
            last_error,
        }
    }

    /// Persist a participant record; failures are logged and dropped
    pub fn onboarding(&self, participant: Participant) -> JoinHandle<()> {
        let store = self.store.clone();
        let last_error = self.last_error.clone();

        tokio::spawn(async move {
            match store.insert_onboarding(&participant).await {
                Ok(()) => {
                    tracing::info!(session_id = %participant.session_id, "Onboarding record saved");
                }
                Err(e) => {
                    tracing::error!(
                        session_id = %participant.session_id,
                        error = %e,
                        "Failed to save onboarding record"
                    );
                    *last_error.write().await = Some(format!("onboarding write: {e}"));
                }
            }
        })
    }

    /// Persist a response; a failure parks it on the session for manual retry
    ///
    /// The caller marks the write as begun on the session before dispatching;
    /// this task resolves it either way.
    pub fn response(&self, response: SurveyResponse) -> JoinHandle<()> {
        let store = self.store.clone();
        let sessions = self.sessions.clone();
        let last_error = self.last_error.clone();

        tokio::spawn(async move {
            let session_id = response.session_id;
            let failed = match store.insert_survey(&response).await {
                Ok(()) => {
                    tracing::info!(
                        session_id = %response.session_id,
                        drop_id = %response.drop_id,
                        visuals_impact = response.visuals_impact,
                        "Survey response saved"
                    );
                    None
                }
                Err(e) => {
                    tracing::error!(
                        session_id = %response.session_id,
                        drop_id = %response.drop_id,
                        error = %e,
                        "Failed to save survey response"
                    );
                    *last_error.write().await = Some(format!("survey write: {e}"));
                    Some(response)
                }
            };

            let lost = failed.is_some();
            if sessions
                .update(session_id, move |s| s.finish_write(failed))
                .await
                .is_none()
                && lost
            {
                tracing::warn!(session_id = %session_id, "Session gone, response dropped");
            }
        })
    }
}
