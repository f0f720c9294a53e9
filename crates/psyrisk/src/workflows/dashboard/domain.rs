use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::workflows::assessment::campaign::{GroupId, TenantId};

/// Sentiment picked at a check-in kiosk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    VeryGood,
    Good,
    Neutral,
    Bad,
    VeryBad,
}

impl Sentiment {
    pub const fn ordered() -> [Self; 5] {
        [
            Self::VeryGood,
            Self::Good,
            Self::Neutral,
            Self::Bad,
            Self::VeryBad,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::VeryGood => "Very good",
            Self::Good => "Good",
            Self::Neutral => "Neutral",
            Self::Bad => "Sad or tired",
            Self::VeryBad => "Irritated or stressed",
        }
    }

    pub const fn score(self) -> u8 {
        match self {
            Self::VeryGood => 5,
            Self::Good => 4,
            Self::Neutral => 3,
            Self::Bad => 2,
            Self::VeryBad => 1,
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Lifecycle shared by complaints and help requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseStatus {
    Open,
    InProgress,
    Resolved,
}

impl CaseStatus {
    pub const fn ordered() -> [Self; 3] {
        [Self::Open, Self::InProgress, Self::Resolved]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Open => "Open",
            Self::InProgress => "In progress",
            Self::Resolved => "Resolved",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoodRecord {
    pub date: NaiveDate,
    pub sentiment: Sentiment,
    pub mood_score: u8,
    #[serde(default)]
    pub department: Option<GroupId>,
    #[serde(default)]
    pub department_name: Option<String>,
    #[serde(default)]
    pub ghe: Option<GroupId>,
    #[serde(default)]
    pub kiosk: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplaintRecord {
    pub date: NaiveDate,
    #[serde(default)]
    pub category: String,
    pub status: CaseStatus,
    #[serde(default)]
    pub kiosk: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HelpRequestRecord {
    pub date: NaiveDate,
    pub status: CaseStatus,
    #[serde(default)]
    pub kiosk: Option<String>,
}

/// Records for one tenant whose date falls in `[start, end]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordedEvents {
    pub moods: Vec<MoodRecord>,
    pub complaints: Vec<ComplaintRecord>,
    pub help_requests: Vec<HelpRequestRecord>,
}

/// Source of kiosk check-ins, complaints and help requests.
pub trait EventLog: Send + Sync {
    fn events(
        &self,
        tenant: TenantId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<RecordedEvents, EventLogError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EventLogError {
    #[error("event log unavailable: {0}")]
    Unavailable(String),
}

/// Optional narrowing applied to every dashboard figure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DashboardFilter {
    #[serde(default)]
    pub kiosk: Option<String>,
    #[serde(default)]
    pub department: Option<GroupId>,
    #[serde(default)]
    pub ghe: Option<GroupId>,
}

impl DashboardFilter {
    /// Kiosk, department and GHE all narrow check-ins.
    pub fn keeps_mood(&self, record: &MoodRecord) -> bool {
        kiosk_matches(self.kiosk.as_deref(), record.kiosk.as_deref())
            && self
                .department
                .map_or(true, |department| record.department == Some(department))
            && self.ghe.map_or(true, |ghe| record.ghe == Some(ghe))
    }

    /// Complaints and help requests carry no department, so only the kiosk applies.
    pub fn keeps_kiosk(&self, kiosk: Option<&str>) -> bool {
        kiosk_matches(self.kiosk.as_deref(), kiosk)
    }
}

fn kiosk_matches(wanted: Option<&str>, actual: Option<&str>) -> bool {
    match wanted.map(str::trim).filter(|value| !value.is_empty()) {
        Some(wanted) => actual == Some(wanted),
        None => true,
    }
}
