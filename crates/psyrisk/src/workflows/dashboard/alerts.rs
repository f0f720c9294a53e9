use rust_decimal::Decimal;
use serde::Serialize;

use crate::config::AlertSettings;

use super::domain::{CaseStatus, RecordedEvents, Sentiment};
use super::period::ReportingPeriod;

/// Points above the mood limit at which a mood alert turns critical.
const CRITICAL_MOOD_MARGIN: i64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    /// Complaint volume in the window.
    Complaint,
    /// Share of negative check-ins in the window.
    Risk,
    /// Help requests still waiting for an answer.
    Operational,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertLevel {
    High,
    Critical,
}

impl AlertLevel {
    /// Count limits go critical at one and a half times the limit.
    fn for_count(observed: u64, limit: u64) -> Self {
        if u128::from(observed) * 2 >= u128::from(limit) * 3 {
            Self::Critical
        } else {
            Self::High
        }
    }

    fn for_mood(percent: Decimal, limit: Decimal) -> Self {
        if percent >= limit + Decimal::from(CRITICAL_MOOD_MARGIN) {
            Self::Critical
        } else {
            Self::High
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TriggeredAlert {
    pub kind: AlertKind,
    pub level: AlertLevel,
    pub observed: Decimal,
    pub limit: Decimal,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlertEvaluation {
    pub period: ReportingPeriod,
    pub alerts: Vec<TriggeredAlert>,
}

/// Check one window of tenant-wide events against the alert limits.
/// Each limit is reached at `>=`; nothing is dispatched from here.
pub fn evaluate_alerts(
    settings: &AlertSettings,
    period: ReportingPeriod,
    events: &RecordedEvents,
) -> AlertEvaluation {
    if !settings.enabled {
        return AlertEvaluation {
            period,
            alerts: Vec::new(),
        };
    }

    let days = period.days();
    let mut alerts = Vec::new();

    let complaints = events
        .complaints
        .iter()
        .filter(|complaint| period.contains(complaint.date))
        .count() as u64;
    if complaints >= settings.max_complaints {
        alerts.push(TriggeredAlert {
            kind: AlertKind::Complaint,
            level: AlertLevel::for_count(complaints, settings.max_complaints),
            observed: Decimal::from(complaints),
            limit: Decimal::from(settings.max_complaints),
            message: format!(
                "{complaints} complaints recorded in the last {days} days (limit {}).",
                settings.max_complaints
            ),
        });
    }

    let moods: Vec<_> = events
        .moods
        .iter()
        .filter(|mood| period.contains(mood.date))
        .collect();
    if !moods.is_empty() {
        let negative = moods
            .iter()
            .filter(|mood| matches!(mood.sentiment, Sentiment::Bad | Sentiment::VeryBad))
            .count();
        let percent = Decimal::from(negative * 100) / Decimal::from(moods.len());
        if percent >= settings.max_negative_mood_percent {
            alerts.push(TriggeredAlert {
                kind: AlertKind::Risk,
                level: AlertLevel::for_mood(percent, settings.max_negative_mood_percent),
                observed: percent.round_dp(1),
                limit: settings.max_negative_mood_percent,
                message: format!(
                    "Negative mood at {}% over the last {days} days (limit {}%).",
                    percent.round_dp(1),
                    settings.max_negative_mood_percent
                ),
            });
        }
    }

    let waiting = events
        .help_requests
        .iter()
        .filter(|help| period.contains(help.date))
        .filter(|help| matches!(help.status, CaseStatus::Open | CaseStatus::InProgress))
        .count() as u64;
    if waiting >= settings.max_open_help_requests {
        alerts.push(TriggeredAlert {
            kind: AlertKind::Operational,
            level: AlertLevel::for_count(waiting, settings.max_open_help_requests),
            observed: Decimal::from(waiting),
            limit: Decimal::from(settings.max_open_help_requests),
            message: format!(
                "{waiting} help requests open or in progress (limit {}).",
                settings.max_open_help_requests
            ),
        });
    }

    AlertEvaluation { period, alerts }
}
