use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::workflows::assessment::campaign::{
    Campaign, CampaignDirectory, CampaignToken, TenantContext, TenantResolver,
};
use crate::workflows::assessment::catalog::BlockKey;

use super::domain::{BlockAnswers, CommitRequest, IdentityForm, WizardStep};
use super::repository::ResponseStore;
use super::service::{SubmissionError, SubmissionService};
use super::session::{SessionKey, SessionStore};

pub const SESSION_HEADER: &str = "x-session-id";

/// Shared handles for the respondent wizard routes.
pub struct WizardState<R, S> {
    pub service: Arc<SubmissionService<R>>,
    pub sessions: Arc<S>,
    pub campaigns: Arc<dyn CampaignDirectory>,
    pub tenants: Arc<dyn TenantResolver>,
}

/// Router builder for the public questionnaire wizard.
pub fn questionnaire_router<R, S>(state: Arc<WizardState<R, S>>) -> Router
where
    R: ResponseStore + 'static,
    S: SessionStore + 'static,
{
    Router::new()
        .route(
            "/api/v1/campaigns/:token/wizard/steps/:step",
            get(step_handler::<R, S>),
        )
        .route(
            "/api/v1/campaigns/:token/wizard/identity",
            post(identity_handler::<R, S>),
        )
        .route(
            "/api/v1/campaigns/:token/wizard/blocks/:step",
            post(block_handler::<R, S>),
        )
        .route(
            "/api/v1/campaigns/:token/wizard/commit",
            post(commit_handler::<R, S>),
        )
        .route(
            "/api/v1/campaigns/:token/wizard/identity-check",
            get(identity_check_handler::<R, S>),
        )
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub(crate) struct IdentityCheckQuery {
    #[serde(default)]
    external_id: String,
}

pub(crate) async fn step_handler<R, S>(
    State(state): State<Arc<WizardState<R, S>>>,
    Path((token, step)): Path<(String, u8)>,
    headers: HeaderMap,
) -> Response
where
    R: ResponseStore + 'static,
    S: SessionStore + 'static,
{
    let (campaign, _) = match resolve_campaign(&state, &token) {
        Ok(resolved) => resolved,
        Err(response) => return response,
    };
    if let Err(error) = state.service.guard(&campaign) {
        return submission_error_response(&error);
    }
    let Some(step) = WizardStep::from_number(step) else {
        return error_body(StatusCode::NOT_FOUND, "unknown wizard step");
    };

    let saved = match session_id(&headers) {
        Some(id) => match state.sessions.load(&SessionKey::new(id, campaign.token)) {
            Ok(saved) => saved,
            Err(error) => return submission_error_response(&error.into()),
        },
        None => None,
    };

    match state.service.step_view(step, saved.as_ref()) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(error) => submission_error_response(&error),
    }
}

pub(crate) async fn identity_handler<R, S>(
    State(state): State<Arc<WizardState<R, S>>>,
    Path(token): Path<String>,
    headers: HeaderMap,
    Json(form): Json<IdentityForm>,
) -> Response
where
    R: ResponseStore + 'static,
    S: SessionStore + 'static,
{
    let (campaign, context) = match resolve_campaign(&state, &token) {
        Ok(resolved) => resolved,
        Err(response) => return response,
    };

    let submission = match state.service.begin(&campaign, &context, &form) {
        Ok(submission) => submission,
        Err(error) => return submission_error_response(&error),
    };

    let session = session_id(&headers).unwrap_or_else(|| Uuid::new_v4().to_string());
    let step = submission.step;
    if let Err(error) = state
        .sessions
        .save(&SessionKey::new(session.clone(), campaign.token), submission)
    {
        return submission_error_response(&error.into());
    }

    let mut response = (
        StatusCode::CREATED,
        Json(json!({
            "session_id": session,
            "step": step,
        })),
    )
        .into_response();
    if let Ok(value) = HeaderValue::from_str(&session) {
        response.headers_mut().insert(SESSION_HEADER, value);
    }
    response
}

pub(crate) async fn block_handler<R, S>(
    State(state): State<Arc<WizardState<R, S>>>,
    Path((token, step)): Path<(String, u8)>,
    headers: HeaderMap,
    Json(body): Json<BlockAnswers>,
) -> Response
where
    R: ResponseStore + 'static,
    S: SessionStore + 'static,
{
    let (campaign, _) = match resolve_campaign(&state, &token) {
        Ok(resolved) => resolved,
        Err(response) => return response,
    };
    if let Err(error) = state.service.guard(&campaign) {
        return submission_error_response(&error);
    }
    let Some(block) = BlockKey::from_step(step) else {
        return error_body(StatusCode::NOT_FOUND, "unknown question block");
    };

    let key = match session_id(&headers) {
        Some(id) => SessionKey::new(id, campaign.token),
        None => return restart_response(),
    };
    let mut submission = match state.sessions.load(&key) {
        Ok(Some(submission)) => submission,
        Ok(None) => return restart_response(),
        Err(error) => return submission_error_response(&error.into()),
    };

    let next = match state.service.answer_block(&mut submission, block, &body.answers) {
        Ok(next) => next,
        Err(error) => return submission_error_response(&error),
    };

    if let Err(error) = state.sessions.save(&key, submission) {
        return submission_error_response(&error.into());
    }

    (StatusCode::OK, Json(json!({ "step": next }))).into_response()
}

pub(crate) async fn commit_handler<R, S>(
    State(state): State<Arc<WizardState<R, S>>>,
    Path(token): Path<String>,
    headers: HeaderMap,
    Json(request): Json<CommitRequest>,
) -> Response
where
    R: ResponseStore + 'static,
    S: SessionStore + 'static,
{
    let (campaign, context) = match resolve_campaign(&state, &token) {
        Ok(resolved) => resolved,
        Err(response) => return response,
    };

    let key = session_id(&headers).map(|id| SessionKey::new(id, campaign.token));
    let saved = match key.as_ref().map(|key| state.sessions.load(key)) {
        Some(Ok(saved)) => saved,
        Some(Err(error)) => return submission_error_response(&error.into()),
        None => None,
    };

    match state.service.commit(&campaign, &context, saved, request) {
        Ok(receipt) => {
            if let Some(key) = key.as_ref() {
                if let Err(error) = state.sessions.clear(key) {
                    tracing::warn!(error = %error, "session not cleared after commit");
                }
            }
            (StatusCode::CREATED, Json(receipt)).into_response()
        }
        Err(failure) => {
            if let (Some(key), Some(preserved)) = (key.as_ref(), failure.state) {
                if let Err(error) = state.sessions.save(key, preserved) {
                    tracing::warn!(error = %error, "session not preserved after failed commit");
                }
            }
            submission_error_response(&failure.error)
        }
    }
}

pub(crate) async fn identity_check_handler<R, S>(
    State(state): State<Arc<WizardState<R, S>>>,
    Path(token): Path<String>,
    Query(query): Query<IdentityCheckQuery>,
) -> Response
where
    R: ResponseStore + 'static,
    S: SessionStore + 'static,
{
    let (campaign, _) = match resolve_campaign(&state, &token) {
        Ok(resolved) => resolved,
        Err(response) => return response,
    };

    match state.service.check_identity(&campaign, &query.external_id) {
        Ok(availability) => (StatusCode::OK, Json(availability)).into_response(),
        Err(error) => submission_error_response(&error),
    }
}

fn resolve_campaign<R, S>(
    state: &WizardState<R, S>,
    raw_token: &str,
) -> Result<(Campaign, TenantContext), Response> {
    let token = CampaignToken::parse(raw_token)
        .ok_or_else(|| error_body(StatusCode::NOT_FOUND, "campaign not found"))?;
    let campaign = match state.campaigns.campaign(&token) {
        Ok(Some(campaign)) => campaign,
        Ok(None) => return Err(error_body(StatusCode::NOT_FOUND, "campaign not found")),
        Err(error) => {
            return Err(error_body(
                StatusCode::INTERNAL_SERVER_ERROR,
                &error.to_string(),
            ))
        }
    };
    let context = state
        .tenants
        .context(campaign.tenant_id)
        .map_err(|error| error_body(StatusCode::INTERNAL_SERVER_ERROR, &error.to_string()))?;
    Ok((campaign, context))
}

fn session_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(SESSION_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn restart_response() -> Response {
    submission_error_response(&SubmissionError::RestartRequired(
        super::service::RestartReason::MissingState,
    ))
}

fn error_body(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

pub(crate) fn submission_error_response(error: &SubmissionError) -> Response {
    let (status, payload) = match error {
        SubmissionError::CampaignClosed(status) => (
            StatusCode::FORBIDDEN,
            json!({
                "error": error.to_string(),
                "status": status,
                "message": status.respondent_notice(),
            }),
        ),
        SubmissionError::Validation(issues) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            json!({
                "error": error.to_string(),
                "issues": issues.iter().map(ToString::to_string).collect::<Vec<_>>(),
            }),
        ),
        SubmissionError::IncompleteBlock { block, missing } => (
            StatusCode::UNPROCESSABLE_ENTITY,
            json!({
                "error": error.to_string(),
                "block": block,
                "missing": missing,
            }),
        ),
        SubmissionError::DuplicateIdentity | SubmissionError::OutOfOrder { .. } => {
            (StatusCode::CONFLICT, json!({ "error": error.to_string() }))
        }
        SubmissionError::RestartRequired(_) => (
            StatusCode::CONFLICT,
            json!({
                "error": error.to_string(),
                "restart": true,
            }),
        ),
        SubmissionError::UnknownBlock(_) => {
            (StatusCode::NOT_FOUND, json!({ "error": error.to_string() }))
        }
        SubmissionError::Store(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "error": error.to_string() }),
        ),
    };
    (status, Json(payload)).into_response()
}
