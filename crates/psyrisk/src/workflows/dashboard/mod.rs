//! Operational dashboard over kiosk check-ins, complaints and help requests.

pub mod alerts;
pub mod domain;
pub mod metrics;
pub mod period;
pub mod service;

pub use alerts::{evaluate_alerts, AlertEvaluation, AlertKind, AlertLevel, TriggeredAlert};
pub use domain::{
    CaseStatus, ComplaintRecord, DashboardFilter, EventLog, EventLogError, HelpRequestRecord,
    MoodRecord, RecordedEvents, Sentiment,
};
pub use metrics::{
    compare_periods, period_metrics, DistributionEntry, MoodScore, NamedCount, PeriodComparison,
    PeriodMetrics, RiskLevel, StatusCount, TimelinePoint,
};
pub use period::ReportingPeriod;
pub use service::{DashboardReport, DashboardService};
