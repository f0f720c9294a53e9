//! Respondent wizard: identity capture, seven answer blocks, an optional
//! comment, and a commit that writes exactly one response per identity.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;
pub mod session;
pub(crate) mod validation;

#[cfg(test)]
mod tests;

pub use domain::{
    AgeInput, AnswerItem, AnswerPayload, BlockAnswers, BlockState, CommitRequest, Demographics,
    GroupSelection, IdentityAvailability, IdentityForm, InProgressSubmission, RecoveryPayload,
    StepQuestion, StepView, WizardStep,
};
pub use repository::{NewResponse, ResponseStore, ResponseStream, StoreError, StoredResponse};
pub use router::{questionnaire_router, WizardState, SESSION_HEADER};
pub use service::{CommitFailure, CommitReceipt, RestartReason, SubmissionError, SubmissionService};
pub use session::{SessionKey, SessionStore};
pub use validation::{IdentityValidator, ValidatedIdentity, ValidationIssue};
