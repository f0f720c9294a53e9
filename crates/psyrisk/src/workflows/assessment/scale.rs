use serde::{Deserialize, Serialize};

/// Ordinal answer options shared by every question in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerLabel {
    Never,
    Rarely,
    Sometimes,
    Often,
    Always,
}

impl AnswerLabel {
    pub const fn ordered() -> [Self; 5] {
        [
            Self::Never,
            Self::Rarely,
            Self::Sometimes,
            Self::Often,
            Self::Always,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Never => "Never",
            Self::Rarely => "Rarely",
            Self::Sometimes => "Sometimes",
            Self::Often => "Often",
            Self::Always => "Always",
        }
    }

    /// Label used by payloads recorded before the catalog was translated.
    const fn legacy_label(self) -> &'static str {
        match self {
            Self::Never => "Nunca",
            Self::Rarely => "Raramente",
            Self::Sometimes => "As vezes",
            Self::Often => "Frequentemente",
            Self::Always => "Sempre",
        }
    }

    pub const fn score(self) -> u8 {
        match self {
            Self::Never => 1,
            Self::Rarely => 2,
            Self::Sometimes => 3,
            Self::Often => 4,
            Self::Always => 5,
        }
    }

    /// Exact match against the canonical or legacy label; anything else is unscored.
    pub fn parse(raw: &str) -> Option<Self> {
        Self::ordered()
            .into_iter()
            .find(|option| option.label() == raw || option.legacy_label() == raw)
    }
}

/// Score for a stored answer text, `None` when the text is not on the scale.
pub fn score_for(raw: &str) -> Option<u8> {
    AnswerLabel::parse(raw).map(AnswerLabel::score)
}

/// Option labels in display order, for wizard step views.
pub fn scale_options() -> Vec<&'static str> {
    AnswerLabel::ordered()
        .into_iter()
        .map(AnswerLabel::label)
        .collect()
}
