use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::workflows::assessment::campaign::{CampaignStatus, CampaignToken, GroupId};
use crate::workflows::assessment::catalog::BlockKey;

use super::classify::{Rating, ResponseRate, Zone};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OverallScore {
    pub avg: f64,
    /// Unrounded mean; `avg` and `percent` are both derived from it.
    pub avg_raw: f64,
    pub percent: f64,
    pub rating: Rating,
    pub rating_label: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomainScore {
    pub block: BlockKey,
    pub label: &'static str,
    pub avg: f64,
    pub avg_raw: f64,
    pub percent: f64,
    pub rating: Rating,
    pub rating_label: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionScore {
    pub number: u16,
    pub text: &'static str,
    pub domain: &'static str,
    pub avg_raw: f64,
    pub avg: f64,
    pub percent: f64,
    pub answers: u64,
    pub zone: Zone,
    pub zone_label: &'static str,
    pub actions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trigger_below: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupScore {
    pub group_id: GroupId,
    pub name: String,
    pub avg: f64,
    pub percent: f64,
    pub zone: Zone,
    pub zone_label: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupQuestionBreakdown {
    pub group_id: GroupId,
    pub name: String,
    pub questions: Vec<QuestionScore>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomainDetail {
    pub block: BlockKey,
    pub label: &'static str,
    pub avg: f64,
    pub percent: f64,
    pub rating: Rating,
    pub rating_label: &'static str,
    pub questions: Vec<QuestionScore>,
    pub groups: Vec<GroupScore>,
    pub group_questions: Vec<GroupQuestionBreakdown>,
}

/// Answers the engine passed over without scoring.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SkippedAnswers {
    pub unknown_blocks: u64,
    pub beyond_catalog: u64,
    pub unscored: u64,
}

/// Aggregated statistics for one response set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CampaignResults {
    pub responses: u64,
    pub group_label: &'static str,
    pub group_label_plural: &'static str,
    pub overall: OverallScore,
    pub domains: Vec<DomainScore>,
    pub domain_details: Vec<DomainDetail>,
    pub groups: Vec<GroupScore>,
    pub questions: Vec<QuestionScore>,
    pub skipped: SkippedAnswers,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CampaignHeader {
    pub token: CampaignToken,
    pub title: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: CampaignStatus,
}

/// Report data handed to document assembly; nothing here is formatted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CampaignReport {
    pub campaign: CampaignHeader,
    pub response_rate: ResponseRate,
    pub results: CampaignResults,
}

/// Free-text feedback left on the comment step, kept apart from the scores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CampaignComments {
    pub token: CampaignToken,
    pub responses: u64,
    pub comments: Vec<String>,
}
