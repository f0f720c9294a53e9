use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque public token used in respondent links.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CampaignToken(pub Uuid);

impl CampaignToken {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Uuid::parse_str(raw.trim()).ok().map(Self)
    }
}

impl fmt::Display for CampaignToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.hyphenated().fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(pub u64);

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Identifier of a GHE, department, or job function, depending on where it is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(pub u64);

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    Planned,
    Active,
    Paused,
    Finished,
}

impl CampaignStatus {
    pub const fn ordered() -> [Self; 4] {
        [Self::Planned, Self::Active, Self::Paused, Self::Finished]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Planned => "Planned",
            Self::Active => "Active",
            Self::Paused => "Paused",
            Self::Finished => "Finished",
        }
    }

    /// Message shown instead of the wizard when the campaign is not collecting.
    pub const fn respondent_notice(self) -> &'static str {
        match self {
            Self::Planned => "This assessment has not started yet.",
            Self::Active => "This assessment is open.",
            Self::Paused => "This assessment is temporarily paused.",
            Self::Finished => "This assessment has closed. Thank you for your interest.",
        }
    }
}

impl fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Which organizational dimension a tenant aggregates by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupingMode {
    /// Homogeneous exposure groups (GHE); the department slot holds the role.
    BroadUnit,
    /// Departments; the job function slot holds the role.
    SubUnit,
}

impl GroupingMode {
    /// Resolve the tenant's assessment-type flag. Only `setor`/`sector` selects departments.
    pub fn from_assessment_type(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "setor" | "sector" => Self::SubUnit,
            _ => Self::BroadUnit,
        }
    }

    pub const fn group_label(self) -> &'static str {
        match self {
            Self::BroadUnit => "GHE",
            Self::SubUnit => "Sector",
        }
    }

    pub const fn group_label_plural(self) -> &'static str {
        match self {
            Self::BroadUnit => "GHEs",
            Self::SubUnit => "Sectors",
        }
    }

    /// Display name for a group, falling back to `"<label> <id>"`.
    pub fn display_name(self, id: GroupId, name: Option<String>) -> String {
        name.filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| format!("{} {}", self.group_label(), id))
    }
}

/// Per-call tenant context resolved by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantContext {
    pub tenant_id: TenantId,
    pub grouping_mode: GroupingMode,
    pub employee_count: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Campaign {
    pub token: CampaignToken,
    pub tenant_id: TenantId,
    pub title: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: CampaignStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
}

impl Campaign {
    pub fn accepts_responses(&self) -> bool {
        self.status == CampaignStatus::Active
    }

    pub fn report_available(&self) -> bool {
        self.status == CampaignStatus::Finished
    }
}

/// Campaign lookup by public token.
pub trait CampaignDirectory: Send + Sync {
    fn campaign(&self, token: &CampaignToken) -> Result<Option<Campaign>, DirectoryError>;
}

/// Supplies tenant id, grouping mode, and headcount for one operation.
pub trait TenantResolver: Send + Sync {
    fn context(&self, tenant: TenantId) -> Result<TenantContext, DirectoryError>;
}

/// Display names for organizational groups.
pub trait GroupDirectory: Send + Sync {
    fn group_name(&self, tenant: TenantId, mode: GroupingMode, id: GroupId) -> Option<String>;
}

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("tenant {0} is not known")]
    UnknownTenant(TenantId),
    #[error("directory unavailable: {0}")]
    Unavailable(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sector_flag_selects_sub_unit_grouping() {
        assert_eq!(
            GroupingMode::from_assessment_type(" SETOR "),
            GroupingMode::SubUnit
        );
        assert_eq!(
            GroupingMode::from_assessment_type("sector"),
            GroupingMode::SubUnit
        );
        assert_eq!(
            GroupingMode::from_assessment_type("GHE"),
            GroupingMode::BroadUnit
        );
        assert_eq!(GroupingMode::from_assessment_type(""), GroupingMode::BroadUnit);
    }

    #[test]
    fn unnamed_groups_fall_back_to_mode_label() {
        assert_eq!(
            GroupingMode::BroadUnit.display_name(GroupId(7), None),
            "GHE 7"
        );
        assert_eq!(
            GroupingMode::SubUnit.display_name(GroupId(3), Some("  ".to_string())),
            "Sector 3"
        );
        assert_eq!(
            GroupingMode::SubUnit.display_name(GroupId(3), Some("Warehouse".to_string())),
            "Warehouse"
        );
    }

    #[test]
    fn only_active_campaigns_accept_responses() {
        let mut campaign = Campaign {
            token: CampaignToken::generate(),
            tenant_id: TenantId(1),
            title: "Annual survey".to_string(),
            start_date: NaiveDate::from_ymd_opt(2025, 3, 1).expect("valid date"),
            end_date: NaiveDate::from_ymd_opt(2025, 3, 31).expect("valid date"),
            status: CampaignStatus::Planned,
            created_by: None,
        };

        for status in CampaignStatus::ordered() {
            campaign.status = status;
            assert_eq!(campaign.accepts_responses(), status == CampaignStatus::Active);
            assert_eq!(campaign.report_available(), status == CampaignStatus::Finished);
        }
    }

    #[test]
    fn tokens_parse_from_hyphenated_text() {
        let token = CampaignToken::generate();
        assert_eq!(CampaignToken::parse(&token.to_string()), Some(token));
        assert_eq!(CampaignToken::parse("not-a-token"), None);
    }
}
