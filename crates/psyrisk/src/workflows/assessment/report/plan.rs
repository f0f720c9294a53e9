use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::workflows::assessment::campaign::{Campaign, CampaignToken, TenantId};
use crate::workflows::assessment::questionnaire::repository::StoreError;

/// Months until the campaign is run again, when the report does not say.
pub const DEFAULT_REEVALUATE_MONTHS: u16 = 3;

/// Follow-up the staff committed to for one report question.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedAction {
    pub question_text: String,
    #[serde(default)]
    pub measures: Vec<String>,
    #[serde(default)]
    pub implantation_months: Vec<String>,
    /// Progress per measure or month, as the report editor keys it.
    #[serde(default)]
    pub status: BTreeMap<String, String>,
    #[serde(default)]
    pub concluded_on: String,
}

/// Action plan saved next to a campaign's report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignActionPlan {
    pub campaign: CampaignToken,
    pub tenant_id: TenantId,
    pub actions: Vec<PlannedAction>,
    pub reevaluate_months: u16,
}

impl CampaignActionPlan {
    pub fn empty(campaign: &Campaign) -> Self {
        Self {
            campaign: campaign.token,
            tenant_id: campaign.tenant_id,
            actions: Vec::new(),
            reevaluate_months: DEFAULT_REEVALUATE_MONTHS,
        }
    }

    /// Replace the action with the same question text or append a new one.
    pub fn upsert(&mut self, action: PlannedAction) {
        match self
            .actions
            .iter_mut()
            .find(|existing| existing.question_text == action.question_text)
        {
            Some(existing) => *existing = action,
            None => self.actions.push(action),
        }
    }
}

/// Body of a plan save. Items without question text are dropped.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActionPlanSubmission {
    #[serde(default)]
    pub items: Vec<PlannedAction>,
    #[serde(default)]
    pub reevaluate_months: Option<u16>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlanSaved {
    pub saved: usize,
}

/// Per-campaign plan storage; one plan per campaign token.
pub trait CampaignPlanStore: Send + Sync {
    fn load(&self, campaign: &CampaignToken) -> Result<Option<CampaignActionPlan>, StoreError>;
    fn save(&self, plan: CampaignActionPlan) -> Result<(), StoreError>;
}

pub struct CampaignPlanService<P> {
    store: Arc<P>,
}

impl<P> CampaignPlanService<P>
where
    P: CampaignPlanStore,
{
    pub fn new(store: Arc<P>) -> Self {
        Self { store }
    }

    /// Saved plan, or an empty one with the default re-evaluation interval.
    pub fn plan(&self, campaign: &Campaign) -> Result<CampaignActionPlan, StoreError> {
        Ok(self
            .store
            .load(&campaign.token)?
            .unwrap_or_else(|| CampaignActionPlan::empty(campaign)))
    }

    /// Merge the submitted items into the stored plan by question text.
    /// Actions not mentioned are kept; the re-evaluation interval is always
    /// rewritten and falls back to the default when absent.
    pub fn save(
        &self,
        campaign: &Campaign,
        submission: ActionPlanSubmission,
    ) -> Result<PlanSaved, StoreError> {
        let mut plan = self.plan(campaign)?;
        let mut saved = 0;

        for item in submission.items {
            let question_text = item.question_text.trim().to_string();
            if question_text.is_empty() {
                continue;
            }
            let concluded_on = item.concluded_on.trim().to_string();
            plan.upsert(PlannedAction {
                question_text,
                concluded_on,
                ..item
            });
            saved += 1;
        }
        plan.reevaluate_months = submission
            .reevaluate_months
            .unwrap_or(DEFAULT_REEVALUATE_MONTHS);

        self.store.save(plan)?;
        info!(campaign = %campaign.token, saved, "report action plan saved");
        Ok(PlanSaved { saved })
    }
}
