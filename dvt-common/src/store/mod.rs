//! Persistence collaborator for participant and response records
//!
//! Every operation returns an explicit acknowledgment so callers decide
//! whether a failure is swallowed (participant flow) or surfaced (export).

mod memory;
mod rest;
mod unconfigured;

pub use memory::MemoryStore;
pub use rest::RestStore;
pub use unconfigured::UnconfiguredStore;

use std::sync::Arc;
use thiserror::Error;

use crate::config::BackendCredentials;
use crate::{Participant, Record, SurveyResponse};

/// Backend errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Backend error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Durable storage for the study's two tables
#[async_trait::async_trait]
pub trait SurveyStore: Send + Sync {
    /// Write one participant record
    async fn insert_onboarding(&self, participant: &Participant) -> StoreResult<()>;

    /// Write one response record
    async fn insert_survey(&self, response: &SurveyResponse) -> StoreResult<()>;

    /// All participant records, newest first
    async fn get_all_onboarding(&self) -> StoreResult<Vec<Record>>;

    /// All response records, newest first
    async fn get_all_surveys(&self) -> StoreResult<Vec<Record>>;
}

/// Shared handle used by the services
pub type SharedStore = Arc<dyn SurveyStore>;

/// Pick the store for the resolved credentials
///
/// No credentials → `UnconfiguredStore` (degraded mode, never an error).
pub fn connect_store(credentials: Option<BackendCredentials>) -> Result<SharedStore, StoreError> {
    match credentials {
        Some(credentials) => Ok(Arc::new(RestStore::new(credentials)?)),
        None => Ok(Arc::new(UnconfiguredStore)),
    }
}
