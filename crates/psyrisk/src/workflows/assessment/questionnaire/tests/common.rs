use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{NaiveDate, Utc};
use serde_json::Value;
use uuid::Uuid;

use crate::workflows::assessment::campaign::{
    Campaign, CampaignDirectory, CampaignStatus, CampaignToken, DirectoryError, GroupId,
    GroupingMode, TenantContext, TenantId, TenantResolver,
};
use crate::workflows::assessment::catalog::{BlockKey, QuestionCatalog};
use crate::workflows::assessment::identity::RespondentHash;
use crate::workflows::assessment::questionnaire::domain::{
    AgeInput, IdentityForm, InProgressSubmission, WizardStep,
};
use crate::workflows::assessment::questionnaire::repository::{
    NewResponse, ResponseStore, ResponseStream, StoreError, StoredResponse,
};
use crate::workflows::assessment::questionnaire::router::{questionnaire_router, WizardState};
use crate::workflows::assessment::questionnaire::service::SubmissionService;
use crate::workflows::assessment::questionnaire::session::{SessionKey, SessionStore};

pub(super) const EXTERNAL_ID: &str = "123.456.789-09";

pub(super) fn campaign(status: CampaignStatus) -> Campaign {
    Campaign {
        token: CampaignToken(Uuid::from_u128(0x5eed)),
        tenant_id: TenantId(10),
        title: "Spring assessment".to_string(),
        start_date: NaiveDate::from_ymd_opt(2025, 4, 1).expect("valid date"),
        end_date: NaiveDate::from_ymd_opt(2025, 4, 30).expect("valid date"),
        status,
        created_by: Some("hr@example.com".to_string()),
    }
}

pub(super) fn context(mode: GroupingMode) -> TenantContext {
    TenantContext {
        tenant_id: TenantId(10),
        grouping_mode: mode,
        employee_count: Some(40),
    }
}

pub(super) fn identity_form() -> IdentityForm {
    IdentityForm {
        external_id: EXTERNAL_ID.to_string(),
        age: Some(AgeInput::Text("34".to_string())),
        display_name: Some("Ana".to_string()),
        sex: None,
        ghe_id: Some(GroupId(3)),
        department_id: Some(GroupId(11)),
        job_function_id: Some(GroupId(21)),
    }
}

pub(super) fn full_answers(catalog: &QuestionCatalog, block: BlockKey) -> Vec<String> {
    let count = catalog.domain(block).map(|d| d.question_count()).unwrap_or(0);
    vec!["Often".to_string(); count]
}

pub(super) fn build_service() -> (
    SubmissionService<MemoryResponseStore>,
    Arc<MemoryResponseStore>,
) {
    let store = Arc::new(MemoryResponseStore::default());
    let service = SubmissionService::new(store.clone(), Arc::new(QuestionCatalog::standard()));
    (service, store)
}

/// Walk a fresh state through every block.
pub(super) fn answer_all_blocks<R: ResponseStore + 'static>(
    service: &SubmissionService<R>,
    state: &mut InProgressSubmission,
) {
    for block in BlockKey::ordered() {
        let answers = full_answers(service.catalog(), block);
        service
            .answer_block(state, block, &answers)
            .expect("block accepted");
    }
    assert_eq!(state.step, WizardStep::Comment);
}

#[derive(Default)]
pub(super) struct MemoryResponseStore {
    pub(super) records: Mutex<Vec<StoredResponse>>,
}

impl MemoryResponseStore {
    pub(super) fn len(&self) -> usize {
        self.records.lock().expect("store mutex poisoned").len()
    }
}

impl ResponseStore for MemoryResponseStore {
    fn create(&self, response: NewResponse) -> Result<StoredResponse, StoreError> {
        let mut guard = self.records.lock().expect("store mutex poisoned");
        if guard.iter().any(|stored| {
            stored.response.campaign == response.campaign
                && stored.response.respondent == response.respondent
        }) {
            return Err(StoreError::Duplicate);
        }
        let stored = StoredResponse {
            id: Uuid::new_v4(),
            completed_at: Utc::now(),
            response,
        };
        guard.push(stored.clone());
        Ok(stored)
    }

    fn exists(
        &self,
        campaign: &CampaignToken,
        respondent: &RespondentHash,
    ) -> Result<bool, StoreError> {
        let guard = self.records.lock().expect("store mutex poisoned");
        Ok(guard.iter().any(|stored| {
            &stored.response.campaign == campaign && &stored.response.respondent == respondent
        }))
    }

    fn stream(&self, campaign: &CampaignToken) -> Result<ResponseStream<'_>, StoreError> {
        let guard = self.records.lock().expect("store mutex poisoned");
        let matching: Vec<_> = guard
            .iter()
            .filter(|stored| &stored.response.campaign == campaign)
            .cloned()
            .map(Ok)
            .collect();
        Ok(Box::new(matching.into_iter()))
    }

    fn count(&self, campaign: &CampaignToken) -> Result<usize, StoreError> {
        let guard = self.records.lock().expect("store mutex poisoned");
        Ok(guard
            .iter()
            .filter(|stored| &stored.response.campaign == campaign)
            .count())
    }
}

/// Passes the early check but loses the race at insert time.
pub(super) struct ConflictStore;

impl ResponseStore for ConflictStore {
    fn create(&self, _response: NewResponse) -> Result<StoredResponse, StoreError> {
        Err(StoreError::Duplicate)
    }

    fn exists(&self, _: &CampaignToken, _: &RespondentHash) -> Result<bool, StoreError> {
        Ok(false)
    }

    fn stream(&self, _: &CampaignToken) -> Result<ResponseStream<'_>, StoreError> {
        Ok(Box::new(std::iter::empty()))
    }

    fn count(&self, _: &CampaignToken) -> Result<usize, StoreError> {
        Ok(0)
    }
}

/// Reads succeed, writes fail.
pub(super) struct UnavailableStore;

impl ResponseStore for UnavailableStore {
    fn create(&self, _response: NewResponse) -> Result<StoredResponse, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn exists(&self, _: &CampaignToken, _: &RespondentHash) -> Result<bool, StoreError> {
        Ok(false)
    }

    fn stream(&self, _: &CampaignToken) -> Result<ResponseStream<'_>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn count(&self, _: &CampaignToken) -> Result<usize, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }
}

#[derive(Default)]
pub(super) struct MemorySessions {
    entries: Mutex<HashMap<SessionKey, InProgressSubmission>>,
}

impl MemorySessions {
    pub(super) fn get(&self, key: &SessionKey) -> Option<InProgressSubmission> {
        self.entries
            .lock()
            .expect("session mutex poisoned")
            .get(key)
            .cloned()
    }
}

impl SessionStore for MemorySessions {
    fn load(&self, key: &SessionKey) -> Result<Option<InProgressSubmission>, StoreError> {
        Ok(self.get(key))
    }

    fn save(&self, key: &SessionKey, state: InProgressSubmission) -> Result<(), StoreError> {
        self.entries
            .lock()
            .expect("session mutex poisoned")
            .insert(key.clone(), state);
        Ok(())
    }

    fn clear(&self, key: &SessionKey) -> Result<(), StoreError> {
        self.entries
            .lock()
            .expect("session mutex poisoned")
            .remove(key);
        Ok(())
    }
}

pub(super) struct StaticDirectory {
    pub(super) campaign: Campaign,
    pub(super) mode: GroupingMode,
}

impl CampaignDirectory for StaticDirectory {
    fn campaign(&self, token: &CampaignToken) -> Result<Option<Campaign>, DirectoryError> {
        Ok((token == &self.campaign.token).then(|| self.campaign.clone()))
    }
}

impl TenantResolver for StaticDirectory {
    fn context(&self, tenant: TenantId) -> Result<TenantContext, DirectoryError> {
        if tenant == self.campaign.tenant_id {
            Ok(context(self.mode))
        } else {
            Err(DirectoryError::UnknownTenant(tenant))
        }
    }
}

pub(super) fn wizard(
    status: CampaignStatus,
) -> (axum::Router, Arc<MemoryResponseStore>, Arc<MemorySessions>) {
    let (service, store) = build_service();
    let sessions = Arc::new(MemorySessions::default());
    let directory = Arc::new(StaticDirectory {
        campaign: campaign(status),
        mode: GroupingMode::BroadUnit,
    });
    let state = Arc::new(WizardState {
        service: Arc::new(service),
        sessions: sessions.clone(),
        campaigns: directory.clone(),
        tenants: directory,
    });
    (questionnaire_router(state), store, sessions)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
