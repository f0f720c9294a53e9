use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;

use crate::workflows::assessment::campaign::{
    Campaign, CampaignDirectory, CampaignToken, TenantContext, TenantResolver,
};
use crate::workflows::assessment::questionnaire::repository::ResponseStore;

use super::plan::{ActionPlanSubmission, CampaignPlanService, CampaignPlanStore};
use super::service::{ReportError, ReportService};

pub struct ReportState<R> {
    pub service: Arc<ReportService<R>>,
    pub campaigns: Arc<dyn CampaignDirectory>,
    pub tenants: Arc<dyn TenantResolver>,
}

pub struct ActionPlanState<P> {
    pub service: Arc<CampaignPlanService<P>>,
    pub campaigns: Arc<dyn CampaignDirectory>,
}

/// Router builder for staff-facing report data.
pub fn report_router<R>(state: Arc<ReportState<R>>) -> Router
where
    R: ResponseStore + 'static,
{
    Router::new()
        .route("/api/v1/campaigns/:token/report", get(report_handler::<R>))
        .route(
            "/api/v1/campaigns/:token/comments",
            get(comments_handler::<R>),
        )
        .route(
            "/api/v1/campaigns/:token/compare/:other",
            get(compare_handler::<R>),
        )
        .with_state(state)
}

/// Router builder for the per-campaign action plan kept with the report.
pub fn action_plan_router<P>(state: Arc<ActionPlanState<P>>) -> Router
where
    P: CampaignPlanStore + 'static,
{
    Router::new()
        .route(
            "/api/v1/campaigns/:token/action-plan",
            get(plan_handler::<P>).put(save_plan_handler::<P>),
        )
        .with_state(state)
}

pub(crate) async fn report_handler<R>(
    State(state): State<Arc<ReportState<R>>>,
    Path(token): Path<String>,
) -> Response
where
    R: ResponseStore + 'static,
{
    let (campaign, context) = match resolve(&state, &token) {
        Ok(resolved) => resolved,
        Err(response) => return response,
    };

    match state.service.campaign_report(&campaign, &context) {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(error) => report_error_response(&error),
    }
}

pub(crate) async fn comments_handler<R>(
    State(state): State<Arc<ReportState<R>>>,
    Path(token): Path<String>,
) -> Response
where
    R: ResponseStore + 'static,
{
    let (campaign, context) = match resolve(&state, &token) {
        Ok(resolved) => resolved,
        Err(response) => return response,
    };

    match state.service.comments(&campaign, &context) {
        Ok(comments) => (StatusCode::OK, Json(comments)).into_response(),
        Err(error) => report_error_response(&error),
    }
}

pub(crate) async fn compare_handler<R>(
    State(state): State<Arc<ReportState<R>>>,
    Path((token, other)): Path<(String, String)>,
) -> Response
where
    R: ResponseStore + 'static,
{
    let (baseline, context) = match resolve(&state, &token) {
        Ok(resolved) => resolved,
        Err(response) => return response,
    };
    let (current, _) = match resolve(&state, &other) {
        Ok(resolved) => resolved,
        Err(response) => return response,
    };

    match state.service.compare_campaigns(&baseline, &current, &context) {
        Ok(comparison) => (StatusCode::OK, Json(comparison)).into_response(),
        Err(error) => report_error_response(&error),
    }
}

pub(crate) async fn plan_handler<P>(
    State(state): State<Arc<ActionPlanState<P>>>,
    Path(token): Path<String>,
) -> Response
where
    P: CampaignPlanStore + 'static,
{
    let campaign = match find_campaign(state.campaigns.as_ref(), &token) {
        Ok(campaign) => campaign,
        Err(response) => return response,
    };

    match state.service.plan(&campaign) {
        Ok(plan) => (StatusCode::OK, Json(plan)).into_response(),
        Err(error) => error_body(StatusCode::INTERNAL_SERVER_ERROR, &error.to_string()),
    }
}

pub(crate) async fn save_plan_handler<P>(
    State(state): State<Arc<ActionPlanState<P>>>,
    Path(token): Path<String>,
    Json(submission): Json<ActionPlanSubmission>,
) -> Response
where
    P: CampaignPlanStore + 'static,
{
    let campaign = match find_campaign(state.campaigns.as_ref(), &token) {
        Ok(campaign) => campaign,
        Err(response) => return response,
    };

    match state.service.save(&campaign, submission) {
        Ok(saved) => (StatusCode::OK, Json(saved)).into_response(),
        Err(error) => error_body(StatusCode::INTERNAL_SERVER_ERROR, &error.to_string()),
    }
}

fn find_campaign(
    campaigns: &dyn CampaignDirectory,
    raw_token: &str,
) -> Result<Campaign, Response> {
    let token = CampaignToken::parse(raw_token)
        .ok_or_else(|| error_body(StatusCode::NOT_FOUND, "campaign not found"))?;
    campaigns
        .campaign(&token)
        .map_err(|error| error_body(StatusCode::INTERNAL_SERVER_ERROR, &error.to_string()))?
        .ok_or_else(|| error_body(StatusCode::NOT_FOUND, "campaign not found"))
}

fn resolve<R>(
    state: &ReportState<R>,
    raw_token: &str,
) -> Result<(Campaign, TenantContext), Response> {
    let campaign = find_campaign(state.campaigns.as_ref(), raw_token)?;
    let context = state
        .tenants
        .context(campaign.tenant_id)
        .map_err(|error| error_body(StatusCode::INTERNAL_SERVER_ERROR, &error.to_string()))?;
    Ok((campaign, context))
}

fn error_body(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

pub(crate) fn report_error_response(error: &ReportError) -> Response {
    let (status, payload) = match error {
        ReportError::NotFinished(status) => (
            StatusCode::CONFLICT,
            json!({ "error": error.to_string(), "status": status }),
        ),
        ReportError::TenantMismatch { .. } => {
            (StatusCode::FORBIDDEN, json!({ "error": error.to_string() }))
        }
        ReportError::SameCampaign(_) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            json!({ "error": error.to_string() }),
        ),
        ReportError::Store(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "error": error.to_string() }),
        ),
    };
    (status, Json(payload)).into_response()
}
