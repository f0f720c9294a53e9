use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::campaign::CampaignToken;

const EXTERNAL_ID_DIGITS: usize = 11;

/// Respondent's 11-digit external identifier. Never persisted.
#[derive(Clone, PartialEq, Eq)]
pub struct ExternalId(String);

impl ExternalId {
    /// Strip formatting characters and require exactly eleven digits.
    pub fn parse(raw: &str) -> Option<Self> {
        let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
        if digits.len() == EXTERNAL_ID_DIGITS {
            Some(Self(digits))
        } else {
            None
        }
    }

    pub fn digits(&self) -> &str {
        &self.0
    }
}

// Keep the raw identifier out of logs.
impl fmt::Debug for ExternalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ExternalId(***)")
    }
}

/// Irreversible, campaign-scoped respondent identity.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RespondentHash(pub String);

impl RespondentHash {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RespondentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lowercase hex SHA-256 of `"<campaign uuid>:<digits>"`.
pub fn hash_identity(campaign: &CampaignToken, external_id: &ExternalId) -> RespondentHash {
    let mut hasher = Sha256::new();
    hasher.update(format!("{}:{}", campaign, external_id.digits()).as_bytes());
    RespondentHash(hex::encode(hasher.finalize()))
}
