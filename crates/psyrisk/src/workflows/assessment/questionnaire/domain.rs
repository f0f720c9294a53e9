use std::collections::BTreeMap;

use serde::de::Deserializer;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::workflows::assessment::campaign::{CampaignToken, GroupId, GroupingMode};
use crate::workflows::assessment::catalog::BlockKey;
use crate::workflows::assessment::identity::RespondentHash;

/// Age as typed into the identity form; either a JSON number or digits in a string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AgeInput {
    Whole(i64),
    Text(String),
}

impl AgeInput {
    /// Positive whole years, `None` for anything else.
    pub fn years(&self) -> Option<u32> {
        let value = match self {
            AgeInput::Whole(value) => *value,
            AgeInput::Text(raw) => {
                let trimmed = raw.trim();
                if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_digit()) {
                    return None;
                }
                trimmed.parse::<i64>().ok()?
            }
        };
        u32::try_from(value).ok().filter(|years| *years > 0)
    }
}

/// Raw identity step input. Every field is optional so validation can report all gaps at once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityForm {
    #[serde(default)]
    pub external_id: String,
    #[serde(default)]
    pub age: Option<AgeInput>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub sex: Option<String>,
    #[serde(default)]
    pub ghe_id: Option<GroupId>,
    #[serde(default)]
    pub department_id: Option<GroupId>,
    #[serde(default)]
    pub job_function_id: Option<GroupId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Demographics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub age: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sex: Option<String>,
}

/// Organizational references captured at the identity step.
///
/// Broad-unit tenants fill `ghe_id` and use `department_id` for the role;
/// sub-unit tenants fill `department_id` and `job_function_id`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSelection {
    #[serde(default)]
    pub ghe_id: Option<GroupId>,
    #[serde(default)]
    pub department_id: Option<GroupId>,
    #[serde(default)]
    pub job_function_id: Option<GroupId>,
}

impl GroupSelection {
    /// Aggregation key for the given grouping mode.
    pub fn group_for(&self, mode: GroupingMode) -> Option<GroupId> {
        match mode {
            GroupingMode::BroadUnit => self.ghe_id,
            GroupingMode::SubUnit => self.department_id,
        }
    }
}

/// One answered question, stored verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerItem {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub answer: String,
}

impl AnswerItem {
    fn from_value(value: &Value) -> Self {
        let text = |key: &str| {
            value
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        Self {
            question: text("question"),
            answer: text("answer"),
        }
    }

    pub fn is_answered(&self) -> bool {
        !self.answer.trim().is_empty()
    }
}

/// How much of a block a payload carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum BlockState {
    Absent,
    Partial { answered: usize, expected: usize },
    Complete,
}

/// Answers keyed by block. Keys outside `step2`..`step8` are kept aside untouched
/// so legacy payloads serialize back unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnswerPayload {
    blocks: BTreeMap<BlockKey, Vec<AnswerItem>>,
    unrecognized: BTreeMap<String, Value>,
}

impl AnswerPayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, block: BlockKey, items: Vec<AnswerItem>) {
        self.blocks.insert(block, items);
    }

    pub fn block(&self, block: BlockKey) -> Option<&[AnswerItem]> {
        self.blocks.get(&block).map(Vec::as_slice)
    }

    pub fn blocks(&self) -> impl Iterator<Item = (BlockKey, &[AnswerItem])> {
        self.blocks
            .iter()
            .map(|(block, items)| (*block, items.as_slice()))
    }

    pub fn unrecognized_keys(&self) -> impl Iterator<Item = &str> {
        self.unrecognized.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn block_state(&self, block: BlockKey, expected: usize) -> BlockState {
        let Some(items) = self.blocks.get(&block) else {
            return BlockState::Absent;
        };
        let answered = items
            .iter()
            .take(expected)
            .filter(|item| item.is_answered())
            .count();
        if answered == expected {
            BlockState::Complete
        } else {
            BlockState::Partial { answered, expected }
        }
    }
}

impl Serialize for AnswerPayload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.blocks.len() + self.unrecognized.len()))?;
        for (block, items) in &self.blocks {
            map.serialize_entry(block.key(), items)?;
        }
        for (key, value) in &self.unrecognized {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for AnswerPayload {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<BTreeMap<String, Value>>::deserialize(deserializer)?.unwrap_or_default();
        let mut payload = AnswerPayload::default();

        for (key, value) in raw {
            match (BlockKey::from_key(&key), value.as_array()) {
                (Some(block), Some(entries)) => {
                    let items = entries.iter().map(AnswerItem::from_value).collect();
                    payload.blocks.insert(block, items);
                }
                _ => {
                    payload.unrecognized.insert(key, value);
                }
            }
        }

        Ok(payload)
    }
}

/// Wizard position: 1 identity, 2..8 blocks, 9 comment, 10 done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum WizardStep {
    Identity,
    Block(BlockKey),
    Comment,
    Done,
}

impl WizardStep {
    pub const fn number(self) -> u8 {
        match self {
            WizardStep::Identity => 1,
            WizardStep::Block(block) => block.step(),
            WizardStep::Comment => 9,
            WizardStep::Done => 10,
        }
    }

    pub fn from_number(step: u8) -> Option<Self> {
        match step {
            1 => Some(WizardStep::Identity),
            9 => Some(WizardStep::Comment),
            10 => Some(WizardStep::Done),
            other => BlockKey::from_step(other).map(WizardStep::Block),
        }
    }
}

impl From<WizardStep> for u8 {
    fn from(step: WizardStep) -> Self {
        step.number()
    }
}

impl TryFrom<u8> for WizardStep {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        WizardStep::from_number(value).ok_or_else(|| format!("unknown wizard step {value}"))
    }
}

/// Answers accumulated for one respondent before the final commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InProgressSubmission {
    pub campaign: CampaignToken,
    pub respondent: RespondentHash,
    pub demographics: Demographics,
    pub groups: GroupSelection,
    pub answers: AnswerPayload,
    pub comment: String,
    pub step: WizardStep,
}

/// Client-held copy of the wizard, replayed when the server-held state is gone.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecoveryPayload {
    #[serde(default)]
    pub meta: IdentityForm,
    #[serde(default)]
    pub responses: AnswerPayload,
    #[serde(default)]
    pub comments: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommitRequest {
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub recovery: Option<RecoveryPayload>,
}

/// Block submission body: answers in question order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BlockAnswers {
    #[serde(default)]
    pub answers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepQuestion {
    pub number: u16,
    pub text: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved_answer: Option<String>,
}

/// Everything a client needs to render one wizard step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepView {
    pub step: u8,
    pub title: &'static str,
    pub description: &'static str,
    pub options: Vec<&'static str>,
    pub questions: Vec<StepQuestion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_state: Option<BlockState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved_comment: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IdentityAvailability {
    pub available: bool,
}
