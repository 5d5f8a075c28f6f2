use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use super::chore::{AssignMode, Category, CreateChoreInput};

/// An in-progress add-chore wizard for one user in one chat.
///
/// Sessions are **ephemeral**: one per (chat, user), overwritten as the wizard
/// advances and deleted when it finishes or is cancelled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub chat_id: i64,
    pub user_id: i64,
    pub step: WizardStep,
    pub draft: ChoreDraft,
}

impl Session {
    /// A fresh wizard waiting for the chore name.
    pub fn start(chat_id: i64, user_id: i64) -> Self {
        Self {
            chat_id,
            user_id,
            step: WizardStep::AskName,
            draft: ChoreDraft::default(),
        }
    }
}

/// The question the wizard is waiting on. Steps run strictly in this order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum WizardStep {
    AskName,
    AskAssignee,
    AskCategory,
    AskInterval,
    AskStartDate,
    AskTime,
}

impl WizardStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AskName => "ASK_NAME",
            Self::AskAssignee => "ASK_ASSIGNEE",
            Self::AskCategory => "ASK_CATEGORY",
            Self::AskInterval => "ASK_INTERVAL",
            Self::AskStartDate => "ASK_START_DATE",
            Self::AskTime => "ASK_TIME",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "ASK_NAME" => Some(Self::AskName),
            "ASK_ASSIGNEE" => Some(Self::AskAssignee),
            "ASK_CATEGORY" => Some(Self::AskCategory),
            "ASK_INTERVAL" => Some(Self::AskInterval),
            "ASK_START_DATE" => Some(Self::AskStartDate),
            "ASK_TIME" => Some(Self::AskTime),
            _ => None,
        }
    }

    /// 1-based position shown to the user ("step 3/6").
    pub fn number(&self) -> u8 {
        match self {
            Self::AskName => 1,
            Self::AskAssignee => 2,
            Self::AskCategory => 3,
            Self::AskInterval => 4,
            Self::AskStartDate => 5,
            Self::AskTime => 6,
        }
    }

    pub const COUNT: u8 = 6;
}

/// Fields collected so far. Stored as JSON next to the step name.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChoreDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<AssignMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_days: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
}

impl ChoreDraft {
    /// Complete the draft with the reminder time.
    ///
    /// Returns `None` if an earlier step's field is missing.
    pub fn finish(self, time: NaiveTime) -> Option<CreateChoreInput> {
        Some(CreateChoreInput {
            name: self.name?,
            category: self.category,
            mode: self.mode?,
            assignee: self.assignee?,
            interval_days: self.interval_days?,
            start_date: self.start_date,
            time,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_names_round_trip() {
        for step in [
            WizardStep::AskName,
            WizardStep::AskAssignee,
            WizardStep::AskCategory,
            WizardStep::AskInterval,
            WizardStep::AskStartDate,
            WizardStep::AskTime,
        ] {
            assert_eq!(WizardStep::from_str(step.as_str()), Some(step));
        }
        assert_eq!(WizardStep::from_str("ASK_COLOUR"), None);
    }

    #[test]
    fn draft_json_uses_plain_keys() {
        let draft = ChoreDraft {
            name: Some("mopping".to_string()),
            mode: Some(AssignMode::Rotate),
            assignee: Some("Alice".to_string()),
            category: Some(Category::DailyCleaning),
            interval_days: Some(7),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1),
        };
        let json: serde_json::Value = serde_json::to_value(&draft).unwrap();
        assert_eq!(json["mode"], "rotate");
        assert_eq!(json["category"], "dailycleaning");
        assert_eq!(json["start_date"], "2024-01-01");
    }

    #[test]
    fn incomplete_draft_cannot_finish() {
        let draft = ChoreDraft {
            name: Some("mopping".to_string()),
            ..Default::default()
        };
        assert!(draft.finish(NaiveTime::MIN).is_none());
    }
}
