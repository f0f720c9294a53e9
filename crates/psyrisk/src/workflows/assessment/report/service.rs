use std::sync::Arc;

use tracing::info;

use crate::workflows::assessment::campaign::{
    Campaign, CampaignStatus, CampaignToken, GroupDirectory, TenantContext, TenantId,
};
use crate::workflows::assessment::catalog::QuestionCatalog;
use crate::workflows::assessment::questionnaire::repository::{ResponseStore, StoreError};

use super::actions::ActionLookup;
use super::classify::ResponseRate;
use super::comparison::{compare_results, CampaignComparison};
use super::engine::aggregate;
use super::views::{CampaignComments, CampaignHeader, CampaignReport, CampaignResults};

/// Builds report data for finished campaigns.
pub struct ReportService<R> {
    store: Arc<R>,
    catalog: Arc<QuestionCatalog>,
    actions: Arc<dyn ActionLookup>,
    directory: Arc<dyn GroupDirectory>,
}

impl<R> ReportService<R>
where
    R: ResponseStore,
{
    pub fn new(
        store: Arc<R>,
        catalog: Arc<QuestionCatalog>,
        actions: Arc<dyn ActionLookup>,
        directory: Arc<dyn GroupDirectory>,
    ) -> Self {
        Self {
            store,
            catalog,
            actions,
            directory,
        }
    }

    pub fn campaign_report(
        &self,
        campaign: &Campaign,
        context: &TenantContext,
    ) -> Result<CampaignReport, ReportError> {
        let results = self.results(campaign, context)?;
        let stored = self.store.count(&campaign.token)? as u64;
        let response_rate = ResponseRate::new(stored, context.employee_count);

        info!(
            campaign = %campaign.token,
            tenant = %campaign.tenant_id,
            responses = results.responses,
            "campaign report built"
        );

        Ok(CampaignReport {
            campaign: CampaignHeader {
                token: campaign.token,
                title: campaign.title.clone(),
                start_date: campaign.start_date,
                end_date: campaign.end_date,
                status: campaign.status,
            },
            response_rate,
            results,
        })
    }

    /// Compare `a` (baseline) with `b`. Both must belong to the context's
    /// tenant and be two different campaigns.
    pub fn compare_campaigns(
        &self,
        a: &Campaign,
        b: &Campaign,
        context: &TenantContext,
    ) -> Result<CampaignComparison, ReportError> {
        if a.token == b.token {
            return Err(ReportError::SameCampaign(a.token));
        }
        for campaign in [a, b] {
            if campaign.tenant_id != context.tenant_id {
                return Err(ReportError::TenantMismatch {
                    expected: context.tenant_id,
                    found: campaign.tenant_id,
                });
            }
        }

        let baseline = self.results(a, context)?;
        let current = self.results(b, context)?;
        Ok(compare_results(&baseline, &current))
    }

    /// Non-blank respondent comments in store order. Streams separately from
    /// the aggregator so score reports never hold free text.
    pub fn comments(
        &self,
        campaign: &Campaign,
        context: &TenantContext,
    ) -> Result<CampaignComments, ReportError> {
        self.ensure_reportable(campaign, context)?;

        let mut comments = Vec::new();
        let mut responses = 0u64;
        for stored in self.store.stream(&campaign.token)? {
            let stored = stored?;
            responses += 1;
            let text = stored.response.comment.trim();
            if !text.is_empty() {
                comments.push(text.to_string());
            }
        }

        info!(
            campaign = %campaign.token,
            responses,
            comments = comments.len(),
            "campaign comments collected"
        );
        Ok(CampaignComments {
            token: campaign.token,
            responses,
            comments,
        })
    }

    pub fn results(
        &self,
        campaign: &Campaign,
        context: &TenantContext,
    ) -> Result<CampaignResults, ReportError> {
        self.ensure_reportable(campaign, context)?;

        let responses = self.store.stream(&campaign.token)?;
        let results = aggregate(
            &self.catalog,
            context,
            responses,
            self.actions.as_ref(),
            self.directory.as_ref(),
        )?;
        Ok(results)
    }

    fn ensure_reportable(
        &self,
        campaign: &Campaign,
        context: &TenantContext,
    ) -> Result<(), ReportError> {
        if !campaign.report_available() {
            return Err(ReportError::NotFinished(campaign.status));
        }
        if campaign.tenant_id != context.tenant_id {
            return Err(ReportError::TenantMismatch {
                expected: context.tenant_id,
                found: campaign.tenant_id,
            });
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("reports are available once the campaign is finished (currently {0})")]
    NotFinished(CampaignStatus),
    #[error("campaign belongs to tenant {found}, not {expected}")]
    TenantMismatch { expected: TenantId, found: TenantId },
    #[error("campaign {0} cannot be compared with itself")]
    SameCampaign(CampaignToken),
    #[error(transparent)]
    Store(#[from] StoreError),
}
