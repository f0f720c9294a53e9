//! Integration scenarios for the operational dashboard: period
//! resolution, filtered metrics and period-over-period comparison.

mod common {
    use chrono::NaiveDate;

    use psyrisk::workflows::assessment::{GroupId, TenantId};
    use psyrisk::workflows::dashboard::{
        CaseStatus, ComplaintRecord, EventLog, EventLogError, HelpRequestRecord, MoodRecord,
        RecordedEvents, Sentiment,
    };

    pub(super) const TENANT: TenantId = TenantId(3);

    pub(super) fn day(month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, month, day).expect("valid date")
    }

    fn mood(
        date: NaiveDate,
        sentiment: Sentiment,
        department: u64,
        name: &str,
        kiosk: &str,
    ) -> MoodRecord {
        MoodRecord {
            date,
            sentiment,
            mood_score: sentiment.score(),
            department: Some(GroupId(department)),
            department_name: Some(name.to_string()),
            ghe: Some(GroupId(department * 10)),
            kiosk: Some(kiosk.to_string()),
        }
    }

    fn complaint(
        date: NaiveDate,
        category: &str,
        status: CaseStatus,
        kiosk: &str,
    ) -> ComplaintRecord {
        ComplaintRecord {
            date,
            category: category.to_string(),
            status,
            kiosk: Some(kiosk.to_string()),
        }
    }

    /// September carries the activity under test; August is the prior window.
    pub(super) fn plant_events() -> RecordedEvents {
        RecordedEvents {
            moods: vec![
                mood(day(8, 20), Sentiment::Neutral, 1, "Assembly", "gate"),
                mood(day(9, 2), Sentiment::VeryGood, 1, "Assembly", "gate"),
                mood(day(9, 3), Sentiment::Good, 1, "Assembly", "gate"),
                mood(day(9, 3), Sentiment::VeryGood, 2, "Logistics", "dock"),
                mood(day(9, 10), Sentiment::Good, 2, "  ", "dock"),
                mood(day(9, 15), Sentiment::Bad, 1, "Assembly", "gate"),
            ],
            complaints: vec![
                complaint(day(8, 21), "Noise", CaseStatus::Resolved, "gate"),
                complaint(day(9, 5), "Workload ", CaseStatus::Open, "gate"),
                complaint(day(9, 6), "workload", CaseStatus::InProgress, "dock"),
                complaint(day(9, 7), "", CaseStatus::Resolved, "dock"),
            ],
            help_requests: vec![HelpRequestRecord {
                date: day(9, 8),
                status: CaseStatus::Open,
                kiosk: Some("gate".to_string()),
            }],
        }
    }

    pub(super) struct PlantLog(pub(super) RecordedEvents);

    impl EventLog for PlantLog {
        fn events(
            &self,
            tenant: TenantId,
            start: NaiveDate,
            end: NaiveDate,
        ) -> Result<RecordedEvents, EventLogError> {
            if tenant != TENANT {
                return Ok(RecordedEvents::default());
            }
            let within = |date: NaiveDate| start <= date && date <= end;
            Ok(RecordedEvents {
                moods: self.0.moods.iter().filter(|m| within(m.date)).cloned().collect(),
                complaints: self
                    .0
                    .complaints
                    .iter()
                    .filter(|c| within(c.date))
                    .cloned()
                    .collect(),
                help_requests: self
                    .0
                    .help_requests
                    .iter()
                    .filter(|h| within(h.date))
                    .cloned()
                    .collect(),
            })
        }
    }

    pub(super) struct OfflineLog;

    impl EventLog for OfflineLog {
        fn events(
            &self,
            _tenant: TenantId,
            _start: NaiveDate,
            _end: NaiveDate,
        ) -> Result<RecordedEvents, EventLogError> {
            Err(EventLogError::Unavailable("kiosk sync paused".to_string()))
        }
    }
}

use std::sync::Arc;

use common::*;
use psyrisk::config::DashboardConfig;
use psyrisk::workflows::assessment::{GroupId, TenantId};
use psyrisk::workflows::dashboard::{
    CaseStatus, DashboardFilter, DashboardService, EventLogError, ReportingPeriod, RiskLevel,
    Sentiment,
};

fn service() -> DashboardService<PlantLog> {
    DashboardService::new(Arc::new(PlantLog(plant_events())), DashboardConfig::default())
}

#[test]
fn default_window_report_summarises_the_last_thirty_days() {
    let service = service();
    let period = service.resolve_period(None, None, day(9, 30));
    assert_eq!(period.start, day(9, 1));
    assert_eq!(period.end, day(9, 30));

    let report = service
        .report(TENANT, period, &DashboardFilter::default())
        .expect("dashboard builds");
    let current = &report.current;

    assert_eq!(current.mood_count, 5);
    assert_eq!(current.complaint_count, 3);
    assert_eq!(current.help_count, 1);
    assert_eq!(current.mood_score.avg, 4.0);
    assert_eq!(current.mood_score.percent, 80.0);
    assert_eq!(current.top_sentiment, Some(Sentiment::VeryGood));
    assert_eq!(current.risk_level, RiskLevel::Medium);
    assert_eq!(current.previous_total, 2);
    assert_eq!(current.timeline.len(), 30);
    assert_eq!(current.timeline[2].moods, 2);

    let moods: Vec<(&str, f64)> = current
        .mood_distribution
        .iter()
        .map(|entry| (entry.label.as_str(), entry.percent))
        .collect();
    assert_eq!(
        moods,
        vec![("Good", 40.0), ("Very good", 40.0), ("Sad or tired", 20.0)]
    );

    let categories: Vec<(&str, u64, f64)> = current
        .complaint_distribution
        .iter()
        .map(|entry| (entry.label.as_str(), entry.total, entry.percent))
        .collect();
    assert_eq!(
        categories,
        vec![("Workload", 2, 66.67), ("Not informed", 1, 33.33)]
    );

    let statuses: Vec<CaseStatus> = current
        .complaint_status
        .iter()
        .map(|count| count.status)
        .collect();
    assert_eq!(
        statuses,
        vec![CaseStatus::Open, CaseStatus::InProgress, CaseStatus::Resolved]
    );

    let departments: Vec<(&str, u64)> = current
        .mood_by_department
        .iter()
        .map(|entry| (entry.name.as_str(), entry.total))
        .collect();
    assert_eq!(
        departments,
        vec![("Assembly", 3), ("Logistics", 1), ("No department", 1)]
    );
}

#[test]
fn report_compares_against_the_preceding_window() {
    let service = service();
    let period = service.resolve_period(Some("2025-09-01"), Some("2025-09-30"), day(9, 30));

    let report = service
        .report(TENANT, period, &DashboardFilter::default())
        .expect("dashboard builds");

    assert_eq!(report.previous.period.start, day(8, 2));
    assert_eq!(report.previous.period.end, day(8, 31));
    assert_eq!(report.previous.mood_count, 1);
    assert_eq!(report.previous.top_sentiment_label, "Neutral");

    let comparison = &report.comparison;
    assert_eq!(comparison.moods.delta, 4);
    assert_eq!(comparison.moods.relative_percent, Some(400.0));
    assert_eq!(comparison.complaints.delta, 2);
    assert_eq!(comparison.mood_score.a.percent, 60.0);
    assert_eq!(comparison.mood_score.delta, 20.0);
    assert_eq!(comparison.mood_score.relative_percent, Some(33.3));
    assert_eq!(comparison.top_sentiment.a, "Neutral");
    assert_eq!(comparison.top_sentiment.b, "Very good");
}

#[test]
fn department_filter_narrows_check_ins_only() {
    let service = service();
    let period = service.resolve_period(None, None, day(9, 30));
    let filter = DashboardFilter {
        department: Some(GroupId(1)),
        ..DashboardFilter::default()
    };

    let metrics = service
        .metrics(TENANT, period, &filter)
        .expect("metrics build");

    assert_eq!(metrics.mood_count, 3);
    assert_eq!(metrics.complaint_count, 3);
    assert_eq!(metrics.top_sentiment_label, "Very good");
}

#[test]
fn kiosk_filter_applies_to_every_record_kind() {
    let service = service();
    let period = service.resolve_period(None, None, day(9, 30));
    let filter = DashboardFilter {
        kiosk: Some("dock".to_string()),
        ..DashboardFilter::default()
    };

    let metrics = service
        .metrics(TENANT, period, &filter)
        .expect("metrics build");

    assert_eq!(metrics.mood_count, 2);
    assert_eq!(metrics.complaint_count, 2);
    assert_eq!(metrics.help_count, 0);
    assert_eq!(metrics.risk_level, RiskLevel::Medium);
    assert_eq!(metrics.previous_total, 0);
}

#[test]
fn empty_tenant_reports_no_records() {
    let service = service();
    let period = service.resolve_period(None, None, day(9, 30));

    let metrics = service
        .metrics(TenantId(99), period, &DashboardFilter::default())
        .expect("metrics build");

    assert_eq!(metrics.mood_count, 0);
    assert_eq!(metrics.top_sentiment, None);
    assert_eq!(metrics.top_sentiment_label, "No records");
    assert_eq!(metrics.mood_score.percent, 0.0);
    assert!(metrics.mood_distribution.is_empty());
    assert_eq!(metrics.risk_level, RiskLevel::Low);
}

#[test]
fn period_resolution_falls_back_and_clamps() {
    let config = DashboardConfig {
        window_days: 7,
        max_span_days: 31,
    };
    let today = day(9, 30);

    let inverted = ReportingPeriod::resolve(Some("2025-09-20"), Some("2025-09-01"), today, &config);
    assert_eq!(inverted, ReportingPeriod::default_window(today, &config));
    assert_eq!(inverted.start, day(9, 24));

    let garbled = ReportingPeriod::resolve(Some("20/09/2025"), None, today, &config);
    assert_eq!(garbled.days(), 7);

    let long = ReportingPeriod::resolve(Some("2025-01-01"), Some("2025-09-30"), today, &config);
    assert_eq!(long.end, day(9, 30));
    assert_eq!(long.start, day(8, 30));
}

#[test]
fn unavailable_event_log_is_reported() {
    let service = DashboardService::new(Arc::new(OfflineLog), DashboardConfig::default());
    let period = service.resolve_period(None, None, day(9, 30));

    let err = service
        .report(TENANT, period, &DashboardFilter::default())
        .expect_err("log offline");
    assert_eq!(
        err,
        EventLogError::Unavailable("kiosk sync paused".to_string())
    );
}
