use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::workflows::assessment::campaign::{CampaignToken, TenantId};
use crate::workflows::assessment::identity::RespondentHash;

use super::domain::{AnswerPayload, Demographics, GroupSelection, InProgressSubmission};

/// Completed questionnaire ready to be stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewResponse {
    pub tenant_id: TenantId,
    pub campaign: CampaignToken,
    pub respondent: RespondentHash,
    pub demographics: Demographics,
    pub groups: GroupSelection,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub answers: AnswerPayload,
}

impl NewResponse {
    pub fn from_submission(tenant_id: TenantId, state: &InProgressSubmission) -> Self {
        Self {
            tenant_id,
            campaign: state.campaign,
            respondent: state.respondent.clone(),
            demographics: state.demographics.clone(),
            groups: state.groups,
            comment: state.comment.clone(),
            answers: state.answers.clone(),
        }
    }
}

/// Stored response with the identifiers assigned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredResponse {
    pub id: Uuid,
    pub completed_at: DateTime<Utc>,
    #[serde(flatten)]
    pub response: NewResponse,
}

/// Lazily produced responses for one campaign; a fresh stream per aggregation run.
pub type ResponseStream<'a> =
    Box<dyn Iterator<Item = Result<StoredResponse, StoreError>> + Send + 'a>;

/// Append-only response storage. `create` must check uniqueness of
/// (campaign, respondent) and insert in one atomic step.
pub trait ResponseStore: Send + Sync {
    fn create(&self, response: NewResponse) -> Result<StoredResponse, StoreError>;
    fn exists(
        &self,
        campaign: &CampaignToken,
        respondent: &RespondentHash,
    ) -> Result<bool, StoreError>;
    fn stream(&self, campaign: &CampaignToken) -> Result<ResponseStream<'_>, StoreError>;
    fn count(&self, campaign: &CampaignToken) -> Result<usize, StoreError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("a response for this identity already exists")]
    Duplicate,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}
