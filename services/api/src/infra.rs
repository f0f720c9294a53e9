use chrono::{Local, NaiveDate, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use psyrisk::workflows::assessment::questionnaire::{
    InProgressSubmission, NewResponse, ResponseStore, ResponseStream, SessionKey, SessionStore,
    StoreError, StoredResponse,
};
use psyrisk::workflows::assessment::report::{CampaignActionPlan, CampaignPlanStore};
use psyrisk::workflows::assessment::{
    Campaign, CampaignDirectory, CampaignToken, DirectoryError, GroupDirectory, GroupId,
    GroupingMode, RespondentHash, TenantContext, TenantId, TenantResolver,
};
use psyrisk::workflows::dashboard::{EventLog, EventLogError, RecordedEvents};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, StoreError> {
    mutex
        .lock()
        .map_err(|_| StoreError::Unavailable("in-memory store poisoned".to_string()))
}

/// Response store whose uniqueness check and insert share one lock.
#[derive(Default, Clone)]
pub(crate) struct InMemoryResponseStore {
    records: Arc<Mutex<HashMap<CampaignToken, Vec<StoredResponse>>>>,
}

impl ResponseStore for InMemoryResponseStore {
    fn create(&self, response: NewResponse) -> Result<StoredResponse, StoreError> {
        let mut guard = lock(&self.records)?;
        let entries = guard.entry(response.campaign).or_default();
        if entries
            .iter()
            .any(|stored| stored.response.respondent == response.respondent)
        {
            return Err(StoreError::Duplicate);
        }

        let stored = StoredResponse {
            id: Uuid::new_v4(),
            completed_at: Utc::now(),
            response,
        };
        entries.push(stored.clone());
        Ok(stored)
    }

    fn exists(
        &self,
        campaign: &CampaignToken,
        respondent: &RespondentHash,
    ) -> Result<bool, StoreError> {
        let guard = lock(&self.records)?;
        Ok(guard.get(campaign).map_or(false, |entries| {
            entries
                .iter()
                .any(|stored| &stored.response.respondent == respondent)
        }))
    }

    /// Each step holds the lock for one record only, so a stream never copies
    /// the campaign and sees responses appended while it runs.
    fn stream(&self, campaign: &CampaignToken) -> Result<ResponseStream<'_>, StoreError> {
        let records = Arc::clone(&self.records);
        let campaign = *campaign;
        let mut index = 0;
        let mut finished = false;

        Ok(Box::new(std::iter::from_fn(move || {
            if finished {
                return None;
            }
            let next = match lock(&records) {
                Ok(guard) => guard
                    .get(&campaign)
                    .and_then(|entries| entries.get(index))
                    .cloned()
                    .map(Ok),
                Err(err) => Some(Err(err)),
            };
            index += 1;
            finished = !matches!(next, Some(Ok(_)));
            next
        })))
    }

    fn count(&self, campaign: &CampaignToken) -> Result<usize, StoreError> {
        let guard = lock(&self.records)?;
        Ok(guard.get(campaign).map_or(0, Vec::len))
    }
}

/// Read-only view over a JSON-lines export, one `StoredResponse` per line.
/// Every stream reopens the file and reads it line by line.
#[derive(Debug, Clone)]
pub(crate) struct JsonLinesResponseStore {
    path: PathBuf,
}

impl JsonLinesResponseStore {
    pub(crate) fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn lines(
        &self,
    ) -> Result<impl Iterator<Item = Result<StoredResponse, StoreError>> + Send, StoreError> {
        let file = File::open(&self.path).map_err(|err| {
            StoreError::Unavailable(format!("{}: {err}", self.path.display()))
        })?;

        Ok(BufReader::new(file)
            .lines()
            .enumerate()
            .filter_map(|(index, line)| match line {
                Ok(line) if line.trim().is_empty() => None,
                Ok(line) => Some(serde_json::from_str::<StoredResponse>(&line).map_err(|err| {
                    StoreError::Unavailable(format!("line {}: {err}", index + 1))
                })),
                Err(err) => Some(Err(StoreError::Unavailable(err.to_string()))),
            }))
    }
}

impl ResponseStore for JsonLinesResponseStore {
    fn create(&self, _response: NewResponse) -> Result<StoredResponse, StoreError> {
        Err(StoreError::Unavailable(
            "JSON-lines exports are read-only".to_string(),
        ))
    }

    fn exists(
        &self,
        campaign: &CampaignToken,
        respondent: &RespondentHash,
    ) -> Result<bool, StoreError> {
        for stored in self.lines()? {
            let stored = stored?;
            if &stored.response.campaign == campaign && &stored.response.respondent == respondent
            {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn stream(&self, campaign: &CampaignToken) -> Result<ResponseStream<'_>, StoreError> {
        let campaign = *campaign;
        Ok(Box::new(self.lines()?.filter(move |stored| match stored {
            Ok(stored) => stored.response.campaign == campaign,
            Err(_) => true,
        })))
    }

    fn count(&self, campaign: &CampaignToken) -> Result<usize, StoreError> {
        let mut total = 0;
        for stored in self.stream(campaign)? {
            stored?;
            total += 1;
        }
        Ok(total)
    }
}

/// Report action plans keyed by campaign.
#[derive(Default, Clone)]
pub(crate) struct InMemoryPlanStore {
    plans: Arc<Mutex<HashMap<CampaignToken, CampaignActionPlan>>>,
}

impl CampaignPlanStore for InMemoryPlanStore {
    fn load(&self, campaign: &CampaignToken) -> Result<Option<CampaignActionPlan>, StoreError> {
        Ok(lock(&self.plans)?.get(campaign).cloned())
    }

    fn save(&self, plan: CampaignActionPlan) -> Result<(), StoreError> {
        lock(&self.plans)?.insert(plan.campaign, plan);
        Ok(())
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemorySessionStore {
    entries: Arc<Mutex<HashMap<SessionKey, InProgressSubmission>>>,
}

impl SessionStore for InMemorySessionStore {
    fn load(&self, key: &SessionKey) -> Result<Option<InProgressSubmission>, StoreError> {
        Ok(lock(&self.entries)?.get(key).cloned())
    }

    fn save(&self, key: &SessionKey, state: InProgressSubmission) -> Result<(), StoreError> {
        lock(&self.entries)?.insert(key.clone(), state);
        Ok(())
    }

    fn clear(&self, key: &SessionKey) -> Result<(), StoreError> {
        lock(&self.entries)?.remove(key);
        Ok(())
    }
}

/// Campaigns, tenant settings and group names held in memory.
#[derive(Default)]
pub(crate) struct InMemoryDirectory {
    campaigns: HashMap<CampaignToken, Campaign>,
    tenants: HashMap<TenantId, TenantContext>,
    groups: HashMap<(TenantId, GroupingMode, GroupId), String>,
}

impl InMemoryDirectory {
    pub(crate) fn with_tenant(mut self, context: TenantContext) -> Self {
        self.tenants.insert(context.tenant_id, context);
        self
    }

    pub(crate) fn with_campaign(mut self, campaign: Campaign) -> Self {
        self.campaigns.insert(campaign.token, campaign);
        self
    }

    pub(crate) fn with_group(
        mut self,
        tenant: TenantId,
        mode: GroupingMode,
        id: GroupId,
        name: impl Into<String>,
    ) -> Self {
        self.groups.insert((tenant, mode, id), name.into());
        self
    }
}

impl CampaignDirectory for InMemoryDirectory {
    fn campaign(&self, token: &CampaignToken) -> Result<Option<Campaign>, DirectoryError> {
        Ok(self.campaigns.get(token).cloned())
    }
}

impl TenantResolver for InMemoryDirectory {
    fn context(&self, tenant: TenantId) -> Result<TenantContext, DirectoryError> {
        self.tenants
            .get(&tenant)
            .copied()
            .ok_or(DirectoryError::UnknownTenant(tenant))
    }
}

impl GroupDirectory for InMemoryDirectory {
    fn group_name(&self, tenant: TenantId, mode: GroupingMode, id: GroupId) -> Option<String> {
        self.groups.get(&(tenant, mode, id)).cloned()
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryEventLog {
    events: Arc<Mutex<HashMap<TenantId, RecordedEvents>>>,
}

impl InMemoryEventLog {
    pub(crate) fn record(&self, tenant: TenantId, events: RecordedEvents) {
        if let Ok(mut guard) = self.events.lock() {
            let entry = guard.entry(tenant).or_default();
            entry.moods.extend(events.moods);
            entry.complaints.extend(events.complaints);
            entry.help_requests.extend(events.help_requests);
        }
    }
}

impl EventLog for InMemoryEventLog {
    fn events(
        &self,
        tenant: TenantId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<RecordedEvents, EventLogError> {
        let guard = self
            .events
            .lock()
            .map_err(|_| EventLogError::Unavailable("event log poisoned".to_string()))?;
        let Some(all) = guard.get(&tenant) else {
            return Ok(RecordedEvents::default());
        };
        let within = |date: NaiveDate| start <= date && date <= end;

        Ok(RecordedEvents {
            moods: all
                .moods
                .iter()
                .filter(|mood| within(mood.date))
                .cloned()
                .collect(),
            complaints: all
                .complaints
                .iter()
                .filter(|complaint| within(complaint.date))
                .cloned()
                .collect(),
            help_requests: all
                .help_requests
                .iter()
                .filter(|help| within(help.date))
                .cloned()
                .collect(),
        })
    }
}

/// Source of "today" for date-windowed routes.
pub(crate) trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
