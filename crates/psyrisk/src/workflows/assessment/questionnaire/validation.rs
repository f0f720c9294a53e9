use crate::workflows::assessment::campaign::{GroupingMode, TenantContext};
use crate::workflows::assessment::identity::ExternalId;

use super::domain::{Demographics, GroupSelection, IdentityForm};

/// Structural problems with an identity form.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationIssue {
    #[error("external id must contain exactly 11 digits")]
    InvalidExternalId,
    #[error("age must be a positive whole number")]
    InvalidAge,
    #[error("missing {field} selection")]
    MissingGroup { field: &'static str },
}

/// Identity form that passed structural validation.
#[derive(Debug, Clone)]
pub struct ValidatedIdentity {
    pub external_id: ExternalId,
    pub demographics: Demographics,
    pub groups: GroupSelection,
}

/// Applies the identity rules for a tenant's grouping mode.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityValidator;

impl IdentityValidator {
    /// Collect every issue rather than stopping at the first.
    pub fn validate(
        &self,
        form: &IdentityForm,
        context: &TenantContext,
    ) -> Result<ValidatedIdentity, Vec<ValidationIssue>> {
        let mut issues = Vec::new();

        let external_id = ExternalId::parse(&form.external_id);
        if external_id.is_none() {
            issues.push(ValidationIssue::InvalidExternalId);
        }

        let age = form.age.as_ref().and_then(|age| age.years());
        if age.is_none() {
            issues.push(ValidationIssue::InvalidAge);
        }

        let groups = match context.grouping_mode {
            GroupingMode::BroadUnit => {
                if form.ghe_id.is_none() {
                    issues.push(ValidationIssue::MissingGroup { field: "GHE" });
                }
                if form.department_id.is_none() {
                    issues.push(ValidationIssue::MissingGroup { field: "role" });
                }
                GroupSelection {
                    ghe_id: form.ghe_id,
                    department_id: form.department_id,
                    job_function_id: None,
                }
            }
            GroupingMode::SubUnit => {
                if form.department_id.is_none() {
                    issues.push(ValidationIssue::MissingGroup {
                        field: "department",
                    });
                }
                if form.job_function_id.is_none() {
                    issues.push(ValidationIssue::MissingGroup { field: "role" });
                }
                GroupSelection {
                    ghe_id: None,
                    department_id: form.department_id,
                    job_function_id: form.job_function_id,
                }
            }
        };

        match (external_id, age) {
            (Some(external_id), Some(age)) if issues.is_empty() => Ok(ValidatedIdentity {
                external_id,
                demographics: Demographics {
                    display_name: non_blank(form.display_name.as_deref()),
                    age,
                    sex: non_blank(form.sex.as_deref()),
                },
                groups,
            }),
            _ => Err(issues),
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
