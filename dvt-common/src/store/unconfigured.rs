use tracing::warn;

use super::{StoreResult, SurveyStore};
use crate::{Participant, Record, SurveyResponse};

/// Stand-in used when backend credentials are missing
///
/// Writes succeed without doing anything and reads return empty sets.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredStore;

#[async_trait::async_trait]
impl SurveyStore for UnconfiguredStore {
    async fn insert_onboarding(&self, participant: &Participant) -> StoreResult<()> {
        warn!(
            session_id = %participant.session_id,
            "Backend not configured - skipping onboarding data save"
        );
        Ok(())
    }

    async fn insert_survey(&self, response: &SurveyResponse) -> StoreResult<()> {
        warn!(
            session_id = %response.session_id,
            drop_id = %response.drop_id,
            "Backend not configured - skipping survey data save"
        );
        Ok(())
    }

    async fn get_all_onboarding(&self) -> StoreResult<Vec<Record>> {
        warn!("Backend not configured - returning empty onboarding set");
        Ok(Vec::new())
    }

    async fn get_all_surveys(&self) -> StoreResult<Vec<Record>> {
        warn!("Backend not configured - returning empty survey set");
        Ok(Vec::new())
    }
}
