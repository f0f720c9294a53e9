use serde::{Deserialize, Serialize};

use crate::workflows::assessment::campaign::CampaignToken;

use super::domain::InProgressSubmission;
use super::repository::StoreError;

/// Session-scoped slot for one campaign's in-progress submission.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionKey {
    pub session_id: String,
    pub campaign: CampaignToken,
}

impl SessionKey {
    pub fn new(session_id: impl Into<String>, campaign: CampaignToken) -> Self {
        Self {
            session_id: session_id.into(),
            campaign,
        }
    }
}

/// Transient storage for wizard state. Entries have no expiry here.
pub trait SessionStore: Send + Sync {
    fn load(&self, key: &SessionKey) -> Result<Option<InProgressSubmission>, StoreError>;
    fn save(&self, key: &SessionKey, state: InProgressSubmission) -> Result<(), StoreError>;
    fn clear(&self, key: &SessionKey) -> Result<(), StoreError>;
}
