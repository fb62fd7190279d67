//! Record types shared by the survey and admin services
//!
//! `Participant` and `SurveyResponse` serialize to the backend's column
//! names (`onboarding` and `surveys` tables). `Drop` uses the catalog's
//! camelCase JSON names.

use serde::{Deserialize, Serialize};

use crate::SessionId;

/// Backend table holding participant records
pub const ONBOARDING_TABLE: &str = "onboarding";

/// Backend table holding per-drop responses
pub const SURVEYS_TABLE: &str = "surveys";

/// One flat row as read back from the backend, keys in column order
pub type Record = serde_json::Map<String, serde_json::Value>;

/// A stimulus: one short video shown for rating
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Drop {
    pub id: String,
    pub track: String,
    pub artist: String,
    pub video_url: String,
    /// Expected playback length, informational only
    pub duration_sec: f64,
}

/// Participant metadata captured once per session before any drop is shown
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub session_id: SessionId,
    #[serde(rename = "onboarding_name")]
    pub name: String,
    pub age: u8,
    pub gender: String,
    pub location: String,
    pub music_platforms: Vec<String>,
}

/// One rating (and optional comment) for one drop within one session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurveyResponse {
    pub session_id: SessionId,
    pub onboarding_name: String,
    pub drop_id: String,
    /// 1..=5
    pub visuals_impact: u8,
    /// Trimmed; serialized as null when absent
    pub comment: Option<String>,
}

impl SurveyResponse {
    /// Build a response, normalizing the comment (trimmed, empty → absent)
    pub fn new(
        session_id: SessionId,
        onboarding_name: impl Into<String>,
        drop_id: impl Into<String>,
        visuals_impact: u8,
        comment: &str,
    ) -> Self {
        let trimmed = comment.trim();
        Self {
            session_id,
            onboarding_name: onboarding_name.into(),
            drop_id: drop_id.into(),
            visuals_impact,
            comment: (!trimmed.is_empty()).then(|| trimmed.to_string()),
        }
    }
}
