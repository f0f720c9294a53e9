//! Campaign reporting: single-pass aggregation over stored responses,
//! zone and rating classification, action plan lookup, campaign
//! comparison, respondent comments and the per-campaign follow-up plan.

pub mod actions;
pub mod classify;
pub mod comparison;
pub mod engine;
pub mod plan;
pub mod router;
pub mod service;
pub mod tally;
pub mod views;

pub use actions::{
    default_trigger_below, import_action_plan, ActionLookup, ActionPlanEntry,
    ActionPlanImportError, ActionPlanTable, NoActions, RecommendedActions,
};
pub use classify::{Rating, ResponseRate, ResponseRateLabel, Zone};
pub use comparison::{
    compare_named, compare_results, CampaignComparison, CountComparison, LabelPair,
    NamedComparison, QuestionComparison, ScoreComparison, ScorePoint,
};
pub use engine::{aggregate, CampaignAggregator};
pub use plan::{
    ActionPlanSubmission, CampaignActionPlan, CampaignPlanService, CampaignPlanStore, PlanSaved,
    PlannedAction, DEFAULT_REEVALUATE_MONTHS,
};
pub use router::{action_plan_router, report_router, ActionPlanState, ReportState};
pub use service::{ReportError, ReportService};
pub use tally::{percent_of_scale, round1, round2, Tally};
pub use views::{
    CampaignComments, CampaignHeader, CampaignReport, CampaignResults, DomainDetail, DomainScore,
    GroupQuestionBreakdown, GroupScore, OverallScore, QuestionScore, SkippedAnswers,
};
