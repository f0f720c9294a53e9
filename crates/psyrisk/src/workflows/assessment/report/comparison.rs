use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::tally::{round1, round2};
use super::views::{CampaignResults, GroupScore, QuestionScore};

/// One side of a comparison; a key missing on a side reads as zeros.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ScorePoint {
    pub avg: f64,
    pub percent: f64,
}

/// Percentage-point delta between two already-rounded percents.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreComparison {
    pub a: ScorePoint,
    pub b: ScorePoint,
    pub delta: f64,
    pub relative_percent: Option<f64>,
}

impl ScoreComparison {
    pub fn between(a: ScorePoint, b: ScorePoint) -> Self {
        let delta = round1(b.percent - a.percent);
        let relative_percent = if a.percent == 0.0 {
            None
        } else {
            Some(round1(delta * 100.0 / a.percent))
        };
        Self {
            a,
            b,
            delta,
            relative_percent,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CountComparison {
    pub a: u64,
    pub b: u64,
    pub delta: i64,
    pub relative_percent: Option<f64>,
}

impl CountComparison {
    pub fn between(a: u64, b: u64) -> Self {
        let delta = b as i64 - a as i64;
        let relative_percent = (a > 0).then(|| round2(delta as f64 * 100.0 / a as f64));
        Self {
            a,
            b,
            delta,
            relative_percent,
        }
    }
}

/// Labels carried side by side, never diffed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelPair<T> {
    pub a: T,
    pub b: T,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedComparison {
    pub label: String,
    #[serde(flatten)]
    pub scores: ScoreComparison,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionComparison {
    pub number: u16,
    pub text: &'static str,
    pub domain: &'static str,
    #[serde(flatten)]
    pub scores: ScoreComparison,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CampaignComparison {
    pub responses: CountComparison,
    pub overall: ScoreComparison,
    pub overall_rating: LabelPair<&'static str>,
    pub group_label: &'static str,
    pub domains: Vec<NamedComparison>,
    pub groups: Vec<NamedComparison>,
    pub questions: Vec<QuestionComparison>,
}

/// Align two result sets by key over the union of keys on both sides.
pub fn compare_results(a: &CampaignResults, b: &CampaignResults) -> CampaignComparison {
    let domain_points = |results: &CampaignResults| -> BTreeMap<String, ScorePoint> {
        results
            .domains
            .iter()
            .map(|domain| {
                (
                    domain.label.to_string(),
                    ScorePoint {
                        avg: domain.avg,
                        percent: domain.percent,
                    },
                )
            })
            .collect()
    };

    CampaignComparison {
        responses: CountComparison::between(a.responses, b.responses),
        overall: ScoreComparison::between(
            ScorePoint {
                avg: a.overall.avg,
                percent: a.overall.percent,
            },
            ScorePoint {
                avg: b.overall.avg,
                percent: b.overall.percent,
            },
        ),
        overall_rating: LabelPair {
            a: a.overall.rating_label,
            b: b.overall.rating_label,
        },
        group_label: a.group_label,
        domains: compare_named(domain_points(a), domain_points(b)),
        groups: compare_named(group_points(&a.groups), group_points(&b.groups)),
        questions: compare_questions(&a.questions, &b.questions),
    }
}

/// Union of labels, sorted; a missing side counts as zero.
pub fn compare_named(
    a: BTreeMap<String, ScorePoint>,
    b: BTreeMap<String, ScorePoint>,
) -> Vec<NamedComparison> {
    let labels: BTreeSet<&String> = a.keys().chain(b.keys()).collect();
    labels
        .into_iter()
        .map(|label| NamedComparison {
            label: label.clone(),
            scores: ScoreComparison::between(
                a.get(label).copied().unwrap_or_default(),
                b.get(label).copied().unwrap_or_default(),
            ),
        })
        .collect()
}

fn group_points(groups: &[GroupScore]) -> BTreeMap<String, ScorePoint> {
    groups
        .iter()
        .map(|group| {
            (
                group.name.clone(),
                ScorePoint {
                    avg: group.avg,
                    percent: group.percent,
                },
            )
        })
        .collect()
}

fn compare_questions(a: &[QuestionScore], b: &[QuestionScore]) -> Vec<QuestionComparison> {
    let by_number = |questions: &[QuestionScore]| -> BTreeMap<u16, QuestionScore> {
        questions
            .iter()
            .map(|question| (question.number, question.clone()))
            .collect()
    };
    let a = by_number(a);
    let b = by_number(b);
    let numbers: BTreeSet<u16> = a.keys().chain(b.keys()).copied().collect();

    numbers
        .into_iter()
        .map(|number| {
            let left = a.get(&number);
            let right = b.get(&number);
            let point = |question: Option<&QuestionScore>| {
                question
                    .map(|question| ScorePoint {
                        avg: question.avg,
                        percent: question.percent,
                    })
                    .unwrap_or_default()
            };
            let pick = |field: fn(&QuestionScore) -> &'static str| {
                left.map(field)
                    .filter(|value| !value.is_empty())
                    .or_else(|| right.map(field).filter(|value| !value.is_empty()))
                    .unwrap_or("-")
            };

            QuestionComparison {
                number,
                text: pick(|question| question.text),
                domain: pick(|question| question.domain),
                scores: ScoreComparison::between(point(left), point(right)),
            }
        })
        .collect()
}
