use std::collections::BTreeMap;
use std::io::Read;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use crate::workflows::assessment::campaign::TenantId;

/// Threshold applied when an entry does not set one: 4.30.
pub fn default_trigger_below() -> Decimal {
    Decimal::new(430, 2)
}

/// Standard action plan row for one tenant-wide question number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionPlanEntry {
    pub tenant_id: TenantId,
    pub question_number: u16,
    pub question_text: String,
    pub actions: Vec<String>,
    /// Carried through to reports; never used to filter them.
    pub trigger_below: Decimal,
    pub active: bool,
}

/// What a question's report row ships with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecommendedActions {
    pub actions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trigger_below: Option<Decimal>,
}

pub trait ActionLookup: Send + Sync {
    fn get(&self, tenant: TenantId, question_number: u16) -> RecommendedActions;
}

/// Lookup for tenants without a configured plan.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoActions;

impl ActionLookup for NoActions {
    fn get(&self, _tenant: TenantId, _question_number: u16) -> RecommendedActions {
        RecommendedActions::default()
    }
}

/// In-memory plan keyed by (tenant, question number).
#[derive(Debug, Clone, Default)]
pub struct ActionPlanTable {
    entries: BTreeMap<(TenantId, u16), ActionPlanEntry>,
}

impl ActionPlanTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: impl IntoIterator<Item = ActionPlanEntry>) -> Self {
        let mut table = Self::new();
        for entry in entries {
            table.upsert(entry);
        }
        table
    }

    /// Insert or replace, returning the entry that was replaced.
    pub fn upsert(&mut self, entry: ActionPlanEntry) -> Option<ActionPlanEntry> {
        self.entries
            .insert((entry.tenant_id, entry.question_number), entry)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ActionLookup for ActionPlanTable {
    fn get(&self, tenant: TenantId, question_number: u16) -> RecommendedActions {
        match self.entries.get(&(tenant, question_number)) {
            Some(entry) if entry.active => RecommendedActions {
                actions: entry.actions.clone(),
                trigger_below: Some(entry.trigger_below),
            },
            _ => RecommendedActions::default(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ActionPlanImportError {
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error("line {line}: question number must be at least 1")]
    InvalidQuestionNumber { line: usize },
    #[error("line {line}: trigger '{value}' is not a decimal")]
    InvalidTrigger { line: usize, value: String },
    #[error("line {line}: active flag '{value}' is not a boolean")]
    InvalidActive { line: usize, value: String },
}

/// Read `question_number,question_text,actions,trigger_below,active` rows.
/// Actions are separated by `|`.
pub fn import_action_plan<R: Read>(
    tenant: TenantId,
    reader: R,
) -> Result<Vec<ActionPlanEntry>, ActionPlanImportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut entries = Vec::new();

    for (index, record) in csv_reader.deserialize::<ActionPlanRow>().enumerate() {
        let row = record?;
        let line = index + 2;

        if row.question_number == 0 {
            return Err(ActionPlanImportError::InvalidQuestionNumber { line });
        }

        let trigger_below = match row.trigger_below.as_deref() {
            None => default_trigger_below(),
            Some(raw) => Decimal::from_str(&raw.replace(',', ".")).map_err(|_| {
                ActionPlanImportError::InvalidTrigger {
                    line,
                    value: raw.to_string(),
                }
            })?,
        };

        let active = match row.active.as_deref() {
            None => true,
            Some(raw) => parse_flag(raw).ok_or_else(|| ActionPlanImportError::InvalidActive {
                line,
                value: raw.to_string(),
            })?,
        };

        let actions = row
            .actions
            .as_deref()
            .unwrap_or_default()
            .split('|')
            .map(str::trim)
            .filter(|action| !action.is_empty())
            .map(str::to_string)
            .collect();

        entries.push(ActionPlanEntry {
            tenant_id: tenant,
            question_number: row.question_number,
            question_text: row.question_text.unwrap_or_default(),
            actions,
            trigger_below,
            active,
        });
    }

    Ok(entries)
}

#[derive(Debug, Deserialize)]
struct ActionPlanRow {
    question_number: u16,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    question_text: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    actions: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    trigger_below: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    active: Option<String>,
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "y" | "1" => Some(true),
        "false" | "no" | "n" | "0" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAN: &str = "\
question_number,question_text,actions,trigger_below,active
1,Hard to combine demands,Review task allocation | Agree priorities with manager,3.8,true
2,Unachievable deadlines,Renegotiate deadlines,,
3,Intensive work,Rotate tasks,,false
";

    #[test]
    fn import_applies_defaults_and_splits_actions() {
        let entries = import_action_plan(TenantId(4), PLAN.as_bytes()).expect("plan parses");
        assert_eq!(entries.len(), 3);

        assert_eq!(
            entries[0].actions,
            vec!["Review task allocation", "Agree priorities with manager"]
        );
        assert_eq!(entries[0].trigger_below, Decimal::new(38, 1));
        assert_eq!(entries[1].trigger_below, default_trigger_below());
        assert!(entries[1].active);
        assert!(!entries[2].active);
    }

    #[test]
    fn lookup_only_returns_active_entries_for_the_tenant() {
        let entries = import_action_plan(TenantId(4), PLAN.as_bytes()).expect("plan parses");
        let table = ActionPlanTable::from_entries(entries);

        let found = table.get(TenantId(4), 2);
        assert_eq!(found.actions, vec!["Renegotiate deadlines"]);
        assert_eq!(found.trigger_below, Some(default_trigger_below()));

        assert!(table.get(TenantId(4), 3).actions.is_empty());
        assert!(table.get(TenantId(5), 1).actions.is_empty());
        assert!(table.get(TenantId(4), 30).actions.is_empty());
    }

    #[test]
    fn upsert_replaces_entry_for_same_question() {
        let mut table = ActionPlanTable::new();
        let entry = ActionPlanEntry {
            tenant_id: TenantId(1),
            question_number: 7,
            question_text: "Work very fast".to_string(),
            actions: vec!["Old".to_string()],
            trigger_below: default_trigger_below(),
            active: true,
        };
        assert!(table.upsert(entry.clone()).is_none());

        let replacement = ActionPlanEntry {
            actions: vec!["New".to_string()],
            ..entry
        };
        assert!(table.upsert(replacement).is_some());
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(TenantId(1), 7).actions, vec!["New"]);
    }

    #[test]
    fn import_reports_line_of_bad_trigger() {
        let csv = "question_number,question_text,actions,trigger_below,active\n5,Q,A,high,true\n";
        match import_action_plan(TenantId(1), csv.as_bytes()) {
            Err(ActionPlanImportError::InvalidTrigger { line, value }) => {
                assert_eq!(line, 2);
                assert_eq!(value, "high");
            }
            other => panic!("expected invalid trigger, got {other:?}"),
        }
    }
}
