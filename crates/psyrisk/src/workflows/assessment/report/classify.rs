use serde::Serialize;

use super::tally::round1;

/// Percentage-based zone used for questions and groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Zone {
    Good,
    Attention,
    Poor,
    NoData,
}

impl Zone {
    pub fn from_percent(percent: Option<f64>) -> Self {
        match percent {
            None => Self::NoData,
            Some(value) if value >= 75.0 => Self::Good,
            Some(value) if value >= 40.0 => Self::Attention,
            Some(_) => Self::Poor,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Good => "Good",
            Self::Attention => "Attention",
            Self::Poor => "Poor",
            Self::NoData => "No data",
        }
    }
}

/// Raw-average rating used for the overall and domain summaries.
/// Deliberately separate from [`Zone`]: different scale, different cut points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rating {
    Adequate,
    Moderate,
    Critical,
    NoData,
}

impl Rating {
    pub fn from_average(average: Option<f64>) -> Self {
        match average {
            None => Self::NoData,
            Some(value) if value >= 4.0 => Self::Adequate,
            Some(value) if value >= 3.0 => Self::Moderate,
            Some(_) => Self::Critical,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Adequate => "Adequate",
            Self::Moderate => "Moderate",
            Self::Critical => "Critical",
            Self::NoData => "No data",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseRateLabel {
    Good,
    Attention,
    Critical,
    NoData,
}

impl ResponseRateLabel {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Good => "Good",
            Self::Attention => "Attention",
            Self::Critical => "Critical",
            Self::NoData => "No data",
        }
    }
}

/// Share of the tenant's headcount that answered.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResponseRate {
    pub responses: u64,
    pub headcount: Option<u32>,
    pub rate: f64,
    pub label: ResponseRateLabel,
}

impl ResponseRate {
    pub fn new(responses: u64, headcount: Option<u32>) -> Self {
        let Some(workers) = headcount.filter(|count| *count > 0) else {
            return Self {
                responses,
                headcount,
                rate: 0.0,
                label: ResponseRateLabel::NoData,
            };
        };

        let rate = responses as f64 / f64::from(workers) * 100.0;
        let label = if rate >= 75.0 {
            ResponseRateLabel::Good
        } else if rate >= 40.0 {
            ResponseRateLabel::Attention
        } else {
            ResponseRateLabel::Critical
        };

        Self {
            responses,
            headcount,
            rate: round1(rate),
            label,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zone_boundaries() {
        let zones: Vec<Zone> = [39.9, 40.0, 74.9, 75.0]
            .into_iter()
            .map(|value| Zone::from_percent(Some(value)))
            .collect();
        assert_eq!(
            zones,
            vec![Zone::Poor, Zone::Attention, Zone::Attention, Zone::Good]
        );
        assert_eq!(Zone::from_percent(None), Zone::NoData);
    }

    #[test]
    fn rating_boundaries() {
        let ratings: Vec<Rating> = [2.99, 3.0, 3.99, 4.0]
            .into_iter()
            .map(|value| Rating::from_average(Some(value)))
            .collect();
        assert_eq!(
            ratings,
            vec![
                Rating::Critical,
                Rating::Moderate,
                Rating::Moderate,
                Rating::Adequate
            ]
        );
        assert_eq!(Rating::from_average(None).label(), "No data");
    }

    #[test]
    fn response_rate_needs_headcount() {
        assert_eq!(ResponseRate::new(12, None).label, ResponseRateLabel::NoData);
        assert_eq!(ResponseRate::new(12, Some(0)).label, ResponseRateLabel::NoData);

        let rate = ResponseRate::new(2, Some(3));
        assert_eq!(rate.rate, 66.7);
        assert_eq!(rate.label, ResponseRateLabel::Attention);
        assert_eq!(ResponseRate::new(3, Some(4)).label, ResponseRateLabel::Good);
        assert_eq!(ResponseRate::new(1, Some(4)).label, ResponseRateLabel::Critical);
    }
}
