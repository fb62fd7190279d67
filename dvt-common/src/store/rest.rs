//! HTTP client for the hosted table store (PostgREST-style API)

use serde::Serialize;
use std::time::Duration;
use tracing::{debug, error, info};

use super::{StoreError, StoreResult, SurveyStore};
use crate::config::BackendCredentials;
use crate::models::{ONBOARDING_TABLE, SURVEYS_TABLE};
use crate::{Participant, Record, SurveyResponse};

const USER_AGENT: &str = concat!("dvt/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Table store client
pub struct RestStore {
    http_client: reqwest::Client,
    base_url: String,
    anon_key: String,
}

impl RestStore {
    pub fn new(credentials: BackendCredentials) -> Result<Self, StoreError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| StoreError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: credentials.url,
            anon_key: credentials.anon_key,
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
    }

    async fn insert<T: Serialize + ?Sized>(&self, table: &str, row: &T) -> StoreResult<()> {
        let url = self.table_url(table);
        debug!(table = %table, url = %url, "Inserting row");

        let response = self
            .authorized(self.http_client.post(&url))
            .header("Prefer", "return=minimal")
            .json(row)
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(table = %table, status = status.as_u16(), "Insert rejected: {}", body);
            return Err(StoreError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }

    async fn select_all(&self, table: &str) -> StoreResult<Vec<Record>> {
        let url = format!("{}?select=*&order=created_at.desc", self.table_url(table));
        debug!(table = %table, url = %url, "Fetching all rows");

        let response = self
            .authorized(self.http_client.get(&url))
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(table = %table, status = status.as_u16(), "Fetch rejected: {}", body);
            return Err(StoreError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let rows: Vec<Record> = response
            .json()
            .await
            .map_err(|e| StoreError::Parse(e.to_string()))?;

        info!(table = %table, rows = rows.len(), "Fetched rows from backend");
        Ok(rows)
    }
}

#[async_trait::async_trait]
impl SurveyStore for RestStore {
    async fn insert_onboarding(&self, participant: &Participant) -> StoreResult<()> {
        self.insert(ONBOARDING_TABLE, participant).await
    }

    async fn insert_survey(&self, response: &SurveyResponse) -> StoreResult<()> {
        self.insert(SURVEYS_TABLE, response).await
    }

    async fn get_all_onboarding(&self) -> StoreResult<Vec<Record>> {
        self.select_all(ONBOARDING_TABLE).await
    }

    async fn get_all_surveys(&self) -> StoreResult<Vec<Record>> {
        self.select_all(SURVEYS_TABLE).await
    }
}
