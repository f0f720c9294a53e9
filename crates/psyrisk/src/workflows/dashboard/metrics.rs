use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::workflows::assessment::report::comparison::{
    CountComparison, LabelPair, ScoreComparison, ScorePoint,
};
use crate::workflows::assessment::report::tally::{round1, round2, Tally};

use super::domain::{CaseStatus, DashboardFilter, RecordedEvents, Sentiment};
use super::period::ReportingPeriod;

const NO_RECORDS: &str = "No records";
const UNNAMED_CATEGORY: &str = "Not informed";
const UNNAMED_DEPARTMENT: &str = "No department";

/// Complaint-volume risk for a period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub const fn from_complaints(count: u64) -> Self {
        if count >= 5 {
            Self::High
        } else if count >= 2 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistributionEntry {
    pub label: String,
    pub total: u64,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusCount {
    pub status: CaseStatus,
    pub label: &'static str,
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamedCount {
    pub name: String,
    pub total: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimelinePoint {
    pub date: NaiveDate,
    pub moods: u64,
    pub complaints: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MoodScore {
    pub avg: f64,
    pub percent: f64,
    pub scored: u64,
}

impl MoodScore {
    fn from_tally(tally: &Tally) -> Self {
        Self {
            avg: tally.average().map(round1).unwrap_or(0.0),
            percent: tally.percent().map(round1).unwrap_or(0.0),
            scored: tally.count,
        }
    }

    pub fn point(&self) -> ScorePoint {
        ScorePoint {
            avg: self.avg,
            percent: self.percent,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodMetrics {
    pub period: ReportingPeriod,
    pub mood_count: u64,
    pub complaint_count: u64,
    pub help_count: u64,
    pub mood_score: MoodScore,
    pub top_sentiment: Option<Sentiment>,
    pub top_sentiment_label: &'static str,
    pub mood_distribution: Vec<DistributionEntry>,
    pub complaint_distribution: Vec<DistributionEntry>,
    pub complaint_status: Vec<StatusCount>,
    pub mood_by_department: Vec<NamedCount>,
    pub timeline: Vec<TimelinePoint>,
    pub risk_level: RiskLevel,
    pub risk_label: &'static str,
    pub previous_total: u64,
}

/// Fold one period's events into dashboard figures. `previous` holds the
/// events of the window before `period` and only feeds `previous_total`.
pub fn period_metrics(
    period: ReportingPeriod,
    events: &RecordedEvents,
    previous: &RecordedEvents,
    filter: &DashboardFilter,
) -> PeriodMetrics {
    let prior = period.previous();
    let previous_total = previous
        .moods
        .iter()
        .filter(|mood| prior.contains(mood.date) && filter.keeps_mood(mood))
        .count()
        + previous
            .complaints
            .iter()
            .filter(|complaint| {
                prior.contains(complaint.date) && filter.keeps_kiosk(complaint.kiosk.as_deref())
            })
            .count();

    let moods: Vec<_> = events
        .moods
        .iter()
        .filter(|mood| period.contains(mood.date) && filter.keeps_mood(mood))
        .collect();
    let complaints: Vec<_> = events
        .complaints
        .iter()
        .filter(|complaint| {
            period.contains(complaint.date) && filter.keeps_kiosk(complaint.kiosk.as_deref())
        })
        .collect();
    let help_count = events
        .help_requests
        .iter()
        .filter(|help| period.contains(help.date) && filter.keeps_kiosk(help.kiosk.as_deref()))
        .count() as u64;

    let mut tally = Tally::default();
    let mut sentiments: BTreeMap<Sentiment, u64> = BTreeMap::new();
    let mut departments: BTreeMap<String, u64> = BTreeMap::new();
    let mut moods_by_day: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    for mood in &moods {
        if (1..=5).contains(&mood.mood_score) {
            tally.add(mood.mood_score);
        }
        *sentiments.entry(mood.sentiment).or_default() += 1;
        let department = mood
            .department_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(UNNAMED_DEPARTMENT);
        *departments.entry(department.to_string()).or_default() += 1;
        *moods_by_day.entry(mood.date).or_default() += 1;
    }

    let mut categories = CategoryCounter::default();
    let mut statuses: BTreeMap<CaseStatus, u64> = BTreeMap::new();
    let mut complaints_by_day: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    for complaint in &complaints {
        categories.add(&complaint.category);
        *statuses.entry(complaint.status).or_default() += 1;
        *complaints_by_day.entry(complaint.date).or_default() += 1;
    }

    let mood_count = moods.len() as u64;
    let complaint_count = complaints.len() as u64;
    let top_sentiment = top_sentiment(&sentiments);
    let risk_level = RiskLevel::from_complaints(complaint_count);

    let mut mood_by_department: Vec<NamedCount> = departments
        .into_iter()
        .map(|(name, total)| NamedCount { name, total })
        .collect();
    mood_by_department.sort_by(|a, b| b.total.cmp(&a.total).then(a.name.cmp(&b.name)));

    PeriodMetrics {
        period,
        mood_count,
        complaint_count,
        help_count,
        mood_score: MoodScore::from_tally(&tally),
        top_sentiment,
        top_sentiment_label: top_sentiment.map_or(NO_RECORDS, Sentiment::label),
        mood_distribution: distribution(
            sentiments
                .iter()
                .map(|(sentiment, total)| (sentiment.label().to_string(), *total)),
        ),
        complaint_distribution: distribution(categories.into_totals()),
        complaint_status: CaseStatus::ordered()
            .into_iter()
            .filter_map(|status| {
                statuses.get(&status).map(|total| StatusCount {
                    status,
                    label: status.label(),
                    total: *total,
                })
            })
            .collect(),
        mood_by_department,
        timeline: period
            .each_day()
            .map(|date| TimelinePoint {
                date,
                moods: moods_by_day.get(&date).copied().unwrap_or(0),
                complaints: complaints_by_day.get(&date).copied().unwrap_or(0),
            })
            .collect(),
        risk_level,
        risk_label: risk_level.label(),
        previous_total: previous_total as u64,
    }
}

/// Most frequent sentiment; ties go to the happier one.
fn top_sentiment(counts: &BTreeMap<Sentiment, u64>) -> Option<Sentiment> {
    let mut best: Option<(Sentiment, u64)> = None;
    for sentiment in Sentiment::ordered() {
        let total = counts.get(&sentiment).copied().unwrap_or(0);
        if total > 0 && best.map_or(true, |(_, current)| total > current) {
            best = Some((sentiment, total));
        }
    }
    best.map(|(sentiment, _)| sentiment)
}

/// Entries with a zero total are dropped; order is total desc, then label.
fn distribution(totals: impl IntoIterator<Item = (String, u64)>) -> Vec<DistributionEntry> {
    let totals: Vec<(String, u64)> = totals.into_iter().filter(|(_, total)| *total > 0).collect();
    let sum: u64 = totals.iter().map(|(_, total)| total).sum();

    let mut entries: Vec<DistributionEntry> = totals
        .into_iter()
        .map(|(label, total)| DistributionEntry {
            percent: if sum > 0 {
                round2(total as f64 * 100.0 / sum as f64)
            } else {
                0.0
            },
            label,
            total,
        })
        .collect();
    entries.sort_by(|a, b| b.total.cmp(&a.total).then(a.label.cmp(&b.label)));
    entries
}

/// Counts complaint categories under a normalised key, displaying the first
/// spelling seen for each key.
#[derive(Debug, Default)]
struct CategoryCounter {
    counts: BTreeMap<String, (String, u64)>,
}

impl CategoryCounter {
    fn add(&mut self, raw: &str) {
        let display = raw.split_whitespace().collect::<Vec<_>>().join(" ");
        let display = if display.is_empty() {
            UNNAMED_CATEGORY.to_string()
        } else {
            display
        };
        let key = display.to_lowercase();
        self.counts.entry(key).or_insert((display, 0)).1 += 1;
    }

    fn into_totals(self) -> impl Iterator<Item = (String, u64)> {
        self.counts.into_values()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodComparison {
    pub moods: CountComparison,
    pub complaints: CountComparison,
    pub help_requests: CountComparison,
    pub mood_score: ScoreComparison,
    pub top_sentiment: LabelPair<&'static str>,
    pub mood_distribution: LabelPair<Vec<DistributionEntry>>,
    pub complaint_distribution: LabelPair<Vec<DistributionEntry>>,
}

/// Compare baseline period `a` with period `b`.
pub fn compare_periods(a: &PeriodMetrics, b: &PeriodMetrics) -> PeriodComparison {
    PeriodComparison {
        moods: CountComparison::between(a.mood_count, b.mood_count),
        complaints: CountComparison::between(a.complaint_count, b.complaint_count),
        help_requests: CountComparison::between(a.help_count, b.help_count),
        mood_score: ScoreComparison::between(a.mood_score.point(), b.mood_score.point()),
        top_sentiment: LabelPair {
            a: a.top_sentiment_label,
            b: b.top_sentiment_label,
        },
        mood_distribution: LabelPair {
            a: a.mood_distribution.clone(),
            b: b.mood_distribution.clone(),
        },
        complaint_distribution: LabelPair {
            a: a.complaint_distribution.clone(),
            b: b.complaint_distribution.clone(),
        },
    }
}
