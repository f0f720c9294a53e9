//! Psychosocial-risk assessment campaigns: the answer scale, the question
//! catalog, the respondent wizard, and the campaign report engine.

pub mod campaign;
pub mod catalog;
pub mod identity;
pub mod questionnaire;
pub mod report;
pub mod scale;

pub use campaign::{
    Campaign, CampaignDirectory, CampaignStatus, CampaignToken, DirectoryError, GroupDirectory,
    GroupId, GroupingMode, TenantContext, TenantId, TenantResolver,
};
pub use catalog::{BlockKey, DomainDefinition, DomainTemplate, QuestionCatalog};
pub use identity::{hash_identity, ExternalId, RespondentHash};
pub use scale::{score_for, AnswerLabel};
