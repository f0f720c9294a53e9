use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::config::DashboardConfig;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Inclusive date window the dashboard reports on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReportingPeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl ReportingPeriod {
    /// The last `window_days` days ending on `today`.
    pub fn default_window(today: NaiveDate, config: &DashboardConfig) -> Self {
        let window = i64::from(config.window_days.max(1));
        Self {
            start: today - Duration::days(window - 1),
            end: today,
        }
    }

    /// Resolve user-supplied `YYYY-MM-DD` bounds. Blank bounds take the
    /// default window's value; unparsable or inverted bounds fall back to the
    /// default window; over-long spans keep `end` and move `start` forward.
    pub fn resolve(
        raw_start: Option<&str>,
        raw_end: Option<&str>,
        today: NaiveDate,
        config: &DashboardConfig,
    ) -> Self {
        let fallback = Self::default_window(today, config);
        let start = match parse_bound(raw_start) {
            Ok(start) => start.unwrap_or(fallback.start),
            Err(_) => return fallback,
        };
        let end = match parse_bound(raw_end) {
            Ok(end) => end.unwrap_or(fallback.end),
            Err(_) => return fallback,
        };

        if start > end {
            return fallback;
        }

        let max_span = Duration::days(i64::from(config.max_span_days));
        if end - start > max_span {
            return Self {
                start: end - max_span,
                end,
            };
        }
        Self { start, end }
    }

    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// Equal-length window ending the day before `start`.
    pub fn previous(&self) -> Self {
        Self {
            start: self.start - Duration::days(self.days()),
            end: self.start - Duration::days(1),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn each_day(&self) -> impl Iterator<Item = NaiveDate> {
        let start = self.start;
        (0..self.days()).map(move |offset| start + Duration::days(offset))
    }
}

fn parse_bound(raw: Option<&str>) -> Result<Option<NaiveDate>, chrono::ParseError> {
    match raw.map(str::trim).filter(|value| !value.is_empty()) {
        Some(value) => NaiveDate::parse_from_str(value, DATE_FORMAT).map(Some),
        None => Ok(None),
    }
}
