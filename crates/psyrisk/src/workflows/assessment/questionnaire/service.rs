use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::workflows::assessment::campaign::{Campaign, CampaignStatus, TenantContext};
use crate::workflows::assessment::catalog::{BlockKey, QuestionCatalog};
use crate::workflows::assessment::identity::{hash_identity, ExternalId};
use crate::workflows::assessment::scale::scale_options;

use super::domain::{
    AnswerItem, AnswerPayload, CommitRequest, IdentityAvailability, IdentityForm,
    InProgressSubmission, RecoveryPayload, StepQuestion, StepView, WizardStep,
};
use super::repository::{NewResponse, ResponseStore, StoreError};
use super::validation::{IdentityValidator, ValidationIssue};

/// Drives a respondent from identity capture to a stored response.
///
/// The service holds no per-respondent state: callers pass the
/// in-progress submission in and persist whatever comes back.
pub struct SubmissionService<R> {
    store: Arc<R>,
    catalog: Arc<QuestionCatalog>,
    validator: IdentityValidator,
}

impl<R> SubmissionService<R>
where
    R: ResponseStore + 'static,
{
    pub fn new(store: Arc<R>, catalog: Arc<QuestionCatalog>) -> Self {
        Self {
            store,
            catalog,
            validator: IdentityValidator,
        }
    }

    pub fn catalog(&self) -> &QuestionCatalog {
        &self.catalog
    }

    /// Only active campaigns open the wizard.
    pub fn guard(&self, campaign: &Campaign) -> Result<(), SubmissionError> {
        if campaign.accepts_responses() {
            Ok(())
        } else {
            Err(SubmissionError::CampaignClosed(campaign.status))
        }
    }

    /// Identity step: validate, run the early duplicate check, open state on the first block.
    pub fn begin(
        &self,
        campaign: &Campaign,
        context: &TenantContext,
        form: &IdentityForm,
    ) -> Result<InProgressSubmission, SubmissionError> {
        self.guard(campaign)?;

        let identity = self.validator.validate(form, context).map_err(|issues| {
            info!(campaign = %campaign.token, issues = issues.len(), "identity step rejected");
            SubmissionError::Validation(issues)
        })?;

        let respondent = hash_identity(&campaign.token, &identity.external_id);
        if self.store.exists(&campaign.token, &respondent)? {
            info!(campaign = %campaign.token, "identity already used for campaign");
            return Err(SubmissionError::DuplicateIdentity);
        }

        let step = self
            .catalog
            .first_block()
            .map(WizardStep::Block)
            .unwrap_or(WizardStep::Comment);

        info!(campaign = %campaign.token, step = step.number(), "identity step accepted");
        Ok(InProgressSubmission {
            campaign: campaign.token,
            respondent,
            demographics: identity.demographics,
            groups: identity.groups,
            answers: AnswerPayload::new(),
            comment: String::new(),
            step,
        })
    }

    /// Check-only duplicate lookup; opens no state.
    pub fn check_identity(
        &self,
        campaign: &Campaign,
        raw_external_id: &str,
    ) -> Result<IdentityAvailability, SubmissionError> {
        let external_id = ExternalId::parse(raw_external_id)
            .ok_or_else(|| SubmissionError::Validation(vec![ValidationIssue::InvalidExternalId]))?;
        let respondent = hash_identity(&campaign.token, &external_id);
        let used = self.store.exists(&campaign.token, &respondent)?;
        Ok(IdentityAvailability { available: !used })
    }

    /// Store one block's answers and advance. Re-submitting an earlier block overwrites it.
    pub fn answer_block(
        &self,
        state: &mut InProgressSubmission,
        block: BlockKey,
        answers: &[String],
    ) -> Result<WizardStep, SubmissionError> {
        let domain = self
            .catalog
            .domain(block)
            .ok_or(SubmissionError::UnknownBlock(block))?;

        let reached = state.step.number();
        if block.step() > reached || state.step == WizardStep::Done {
            return Err(SubmissionError::OutOfOrder {
                current: reached,
                requested: block.step(),
            });
        }

        let missing: Vec<usize> = (0..domain.question_count())
            .filter(|index| {
                answers
                    .get(*index)
                    .map(|answer| answer.trim().is_empty())
                    .unwrap_or(true)
            })
            .map(|index| index + 1)
            .collect();
        if !missing.is_empty() {
            return Err(SubmissionError::IncompleteBlock { block, missing });
        }

        let items = domain
            .questions
            .iter()
            .zip(answers)
            .map(|(question, answer)| AnswerItem {
                question: (*question).to_string(),
                answer: answer.clone(),
            })
            .collect();
        state.answers.insert(block, items);

        if state.step == WizardStep::Block(block) {
            state.step = self
                .catalog
                .next_block(block)
                .map(WizardStep::Block)
                .unwrap_or(WizardStep::Comment);
        }

        info!(
            campaign = %state.campaign,
            block = %block,
            next = state.step.number(),
            "block stored"
        );
        Ok(state.step)
    }

    /// View model for a step. Block views need open state and cannot skip ahead.
    pub fn step_view(
        &self,
        step: WizardStep,
        state: Option<&InProgressSubmission>,
    ) -> Result<StepView, SubmissionError> {
        let view = match step {
            WizardStep::Identity => StepView {
                step: step.number(),
                title: "Identification",
                description: "Confirm your identity and organizational unit.",
                options: Vec::new(),
                questions: Vec::new(),
                block_state: None,
                saved_comment: None,
            },
            WizardStep::Block(block) => {
                let state = state.ok_or(SubmissionError::RestartRequired(
                    RestartReason::MissingState,
                ))?;
                if block.step() > state.step.number() {
                    return Err(SubmissionError::OutOfOrder {
                        current: state.step.number(),
                        requested: block.step(),
                    });
                }
                let domain = self
                    .catalog
                    .domain(block)
                    .ok_or(SubmissionError::UnknownBlock(block))?;
                let saved = state.answers.block(block).unwrap_or_default();
                let block_state = state
                    .answers
                    .block_state(block, domain.question_count());
                let questions = domain
                    .questions
                    .iter()
                    .enumerate()
                    .map(|(index, text)| StepQuestion {
                        number: domain.question_number(index),
                        text: *text,
                        saved_answer: saved
                            .get(index)
                            .filter(|item| item.is_answered())
                            .map(|item| item.answer.clone()),
                    })
                    .collect();
                StepView {
                    step: step.number(),
                    title: domain.label,
                    description: domain.description,
                    options: scale_options(),
                    questions,
                    block_state: Some(block_state),
                    saved_comment: None,
                }
            }
            WizardStep::Comment => StepView {
                step: step.number(),
                title: "Comments",
                description: "Anything else you would like to share? This step is optional.",
                options: Vec::new(),
                questions: Vec::new(),
                block_state: None,
                saved_comment: state
                    .map(|state| state.comment.clone())
                    .filter(|comment| !comment.is_empty()),
            },
            WizardStep::Done => StepView {
                step: step.number(),
                title: "Thank you",
                description: "Your answers have been recorded.",
                options: Vec::new(),
                questions: Vec::new(),
                block_state: None,
                saved_comment: None,
            },
        };
        Ok(view)
    }

    /// Final step. Uses the server-held state when present, otherwise rebuilds
    /// it from the recovery payload. On failure the state travels back so the
    /// caller can keep it for a retry.
    pub fn commit(
        &self,
        campaign: &Campaign,
        context: &TenantContext,
        state: Option<InProgressSubmission>,
        request: CommitRequest,
    ) -> Result<CommitReceipt, CommitFailure> {
        let state = state.filter(|state| state.campaign == campaign.token);
        if let Err(error) = self.guard(campaign) {
            return Err(CommitFailure { error, state });
        }

        let CommitRequest { comment, recovery } = request;

        let mut state = match state {
            Some(state) if state.step == WizardStep::Comment => state,
            Some(state) => {
                let current = state.step.number();
                return Err(CommitFailure {
                    error: SubmissionError::OutOfOrder {
                        current,
                        requested: WizardStep::Comment.number(),
                    },
                    state: Some(state),
                });
            }
            None => match recovery.as_ref() {
                Some(payload) => self
                    .reconstruct(campaign, context, payload)
                    .map_err(|error| CommitFailure { error, state: None })?,
                None => {
                    return Err(CommitFailure {
                        error: SubmissionError::RestartRequired(RestartReason::MissingState),
                        state: None,
                    })
                }
            },
        };

        let recovered_comment = recovery.and_then(|payload| payload.comments);
        if let Some(resolved) = [comment, recovered_comment]
            .into_iter()
            .flatten()
            .map(|text| text.trim().to_string())
            .find(|text| !text.is_empty())
        {
            state.comment = resolved;
        }

        let response = NewResponse::from_submission(campaign.tenant_id, &state);
        match self.store.create(response) {
            Ok(stored) => {
                info!(campaign = %campaign.token, response_id = %stored.id, "response committed");
                Ok(CommitReceipt {
                    response_id: stored.id,
                    completed_at: stored.completed_at,
                    step: WizardStep::Done,
                })
            }
            Err(StoreError::Duplicate) => {
                warn!(campaign = %campaign.token, "commit rejected as duplicate identity");
                Err(CommitFailure {
                    error: SubmissionError::DuplicateIdentity,
                    state: Some(state),
                })
            }
            Err(err) => {
                warn!(campaign = %campaign.token, error = %err, "commit failed in store");
                Err(CommitFailure {
                    error: SubmissionError::Store(err),
                    state: Some(state),
                })
            }
        }
    }

    fn reconstruct(
        &self,
        campaign: &Campaign,
        context: &TenantContext,
        payload: &RecoveryPayload,
    ) -> Result<InProgressSubmission, SubmissionError> {
        let identity = self
            .validator
            .validate(&payload.meta, context)
            .map_err(|issues| {
                SubmissionError::RestartRequired(RestartReason::InvalidRecovery(issues))
            })?;

        let respondent = hash_identity(&campaign.token, &identity.external_id);
        if self.store.exists(&campaign.token, &respondent)? {
            return Err(SubmissionError::RestartRequired(
                RestartReason::AlreadySubmitted,
            ));
        }

        info!(campaign = %campaign.token, "in-progress state rebuilt from recovery payload");
        Ok(InProgressSubmission {
            campaign: campaign.token,
            respondent,
            demographics: identity.demographics,
            groups: identity.groups,
            answers: payload.responses.clone(),
            comment: String::new(),
            step: WizardStep::Comment,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CommitReceipt {
    pub response_id: Uuid,
    pub completed_at: DateTime<Utc>,
    pub step: WizardStep,
}

/// Commit error plus the state to re-save, positioned on the comment step.
#[derive(Debug, thiserror::Error)]
#[error("{error}")]
pub struct CommitFailure {
    pub error: SubmissionError,
    pub state: Option<InProgressSubmission>,
}

/// Why the respondent has to start over from the identity step.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RestartReason {
    #[error("no questionnaire in progress")]
    MissingState,
    #[error("recovered identity is invalid")]
    InvalidRecovery(Vec<ValidationIssue>),
    #[error("recovered identity has already submitted")]
    AlreadySubmitted,
}

#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("campaign is not accepting responses ({0})")]
    CampaignClosed(CampaignStatus),
    #[error("identity form is invalid")]
    Validation(Vec<ValidationIssue>),
    #[error("this identity has already answered the campaign")]
    DuplicateIdentity,
    #[error("block {block} has unanswered questions {missing:?}")]
    IncompleteBlock { block: BlockKey, missing: Vec<usize> },
    #[error("step {requested} is not available from step {current}")]
    OutOfOrder { current: u8, requested: u8 },
    #[error("block {0} is not part of the catalog")]
    UnknownBlock(BlockKey),
    #[error("please restart the questionnaire: {0}")]
    RestartRequired(RestartReason),
    #[error(transparent)]
    Store(#[from] StoreError),
}
