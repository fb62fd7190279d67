//! In-process store
//!
//! Keeps rows in memory with a `created_at` stamp and an increasing `id`,
//! so reads come back newest first like the hosted backend. Writes can be
//! switched to fail for exercising the degraded paths.

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

use super::{StoreError, StoreResult, SurveyStore};
use crate::{Participant, Record, SurveyResponse};

#[derive(Default)]
struct Tables {
    next_id: i64,
    onboarding: Vec<Record>,
    surveys: Vec<Record>,
    participants: Vec<Participant>,
    responses: Vec<SurveyResponse>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    fail_writes: AtomicBool,
    fail_reads: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent insert fail (or succeed again)
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent read fail (or succeed again)
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Participants written so far, in write order
    pub async fn participants(&self) -> Vec<Participant> {
        self.tables.read().await.participants.clone()
    }

    /// Responses written so far, in write order
    pub async fn responses(&self) -> Vec<SurveyResponse> {
        self.tables.read().await.responses.clone()
    }

    fn check_writes(&self) -> StoreResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Api {
                status: 503,
                body: "writes disabled".to_string(),
            });
        }
        Ok(())
    }

    fn check_reads(&self) -> StoreResult<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Network("reads disabled".to_string()));
        }
        Ok(())
    }
}

fn stamp<T: Serialize>(id: i64, row: &T) -> StoreResult<Record> {
    let mut record = Record::new();
    record.insert("id".to_string(), Value::from(id));
    record.insert(
        "created_at".to_string(),
        Value::from(Utc::now().to_rfc3339()),
    );
    match serde_json::to_value(row).map_err(|e| StoreError::Parse(e.to_string()))? {
        Value::Object(fields) => record.extend(fields),
        other => return Err(StoreError::Parse(format!("row is not an object: {other}"))),
    }
    Ok(record)
}

#[async_trait::async_trait]
impl SurveyStore for MemoryStore {
    async fn insert_onboarding(&self, participant: &Participant) -> StoreResult<()> {
        self.check_writes()?;
        let mut tables = self.tables.write().await;
        tables.next_id += 1;
        let record = stamp(tables.next_id, participant)?;
        tables.onboarding.push(record);
        tables.participants.push(participant.clone());
        Ok(())
    }

    async fn insert_survey(&self, response: &SurveyResponse) -> StoreResult<()> {
        self.check_writes()?;
        let mut tables = self.tables.write().await;
        tables.next_id += 1;
        let record = stamp(tables.next_id, response)?;
        tables.surveys.push(record);
        tables.responses.push(response.clone());
        Ok(())
    }

    async fn get_all_onboarding(&self) -> StoreResult<Vec<Record>> {
        self.check_reads()?;
        Ok(self.tables.read().await.onboarding.iter().rev().cloned().collect())
    }

    async fn get_all_surveys(&self) -> StoreResult<Vec<Record>> {
        self.check_reads()?;
        Ok(self.tables.read().await.surveys.iter().rev().cloned().collect())
    }
}
