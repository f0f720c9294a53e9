use crate::workflows::assessment::scale::AnswerLabel;

const SCALE_MAX: f64 = AnswerLabel::Always.score() as f64;

/// Running `{sum, count}` of scored answers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub sum: u64,
    pub count: u64,
}

impl Tally {
    pub fn add(&mut self, score: u8) {
        self.sum += u64::from(score);
        self.count += 1;
    }

    pub fn merge(&mut self, other: &Tally) {
        self.sum += other.sum;
        self.count += other.count;
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Unrounded mean on the 1..5 scale, `None` without scored answers.
    pub fn average(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum as f64 / self.count as f64)
    }

    /// Unrounded share of the scale maximum, 0..100.
    pub fn percent(&self) -> Option<f64> {
        self.average().map(percent_of_scale)
    }
}

pub fn percent_of_scale(average: f64) -> f64 {
    average / SCALE_MAX * 100.0
}

/// One decimal, half away from zero.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Two decimals, half away from zero.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
