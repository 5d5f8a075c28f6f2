use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// A recurring household task.
///
/// `assignee` is the person responsible for the chore. It is picked once at
/// creation (directly, or from the household rotation) and never changes when
/// someone else completes the chore.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chore {
    pub id: i64,
    pub name: String,
    pub category: Option<Category>,
    pub mode: AssignMode,
    pub assignee: String,
    /// Rolling repeat interval, counted from the last completion.
    pub interval_days: u32,
    /// First due date for a chore that has never been completed.
    pub start_date: Option<NaiveDate>,
    /// Local time of day at which the reminder fires.
    pub time: NaiveTime,
    pub last_done: Option<NaiveDate>,
    pub last_reminded: Option<NaiveDate>,
    /// The chore is ignored by due and reminder checks on this date.
    pub skip_until: Option<NaiveDate>,
}

impl Chore {
    /// Chores without a category are filed under `admin`.
    pub fn category_or_default(&self) -> Category {
        self.category.unwrap_or(Category::Admin)
    }
}

/// How the assignee of a chore was chosen.
///
/// - `Fixed`: named explicitly when the chore was added
/// - `Rotate`: taken from the household rotation at creation time
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AssignMode {
    Fixed,
    Rotate,
}

impl AssignMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fixed => "fixed",
            Self::Rotate => "rotate",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "fixed" => Some(Self::Fixed),
            "rotate" => Some(Self::Rotate),
            _ => None,
        }
    }
}

/// The fixed set of chore categories.
///
/// Variants are declared in key order, so sorting by `Category` sorts by key.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Admin,
    Cat,
    DailyCleaning,
    DeepCleaning,
    Kitchen,
    Laundry,
    Maintenance,
}

impl Category {
    /// Categories in the order they are offered to users.
    pub const ALL: [Category; 7] = [
        Self::Cat,
        Self::DailyCleaning,
        Self::DeepCleaning,
        Self::Kitchen,
        Self::Laundry,
        Self::Maintenance,
        Self::Admin,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Cat => "cat",
            Self::DailyCleaning => "dailycleaning",
            Self::DeepCleaning => "deepcleaning",
            Self::Kitchen => "kitchen",
            Self::Laundry => "laundry",
            Self::Maintenance => "maintenance",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(Self::Admin),
            "cat" => Some(Self::Cat),
            "dailycleaning" => Some(Self::DailyCleaning),
            "deepcleaning" => Some(Self::DeepCleaning),
            "kitchen" => Some(Self::Kitchen),
            "laundry" => Some(Self::Laundry),
            "maintenance" => Some(Self::Maintenance),
            _ => None,
        }
    }

    /// Parse user input, ignoring surrounding whitespace and case.
    pub fn parse_input(s: &str) -> Option<Self> {
        Self::from_str(&s.trim().to_lowercase())
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Admin => "📋 Admin",
            Self::Cat => "🐱 Cat",
            Self::DailyCleaning => "🧹 Daily Cleaning",
            Self::DeepCleaning => "🧽 Deep Cleaning",
            Self::Kitchen => "🍳 Kitchen",
            Self::Laundry => "🧺 Laundry",
            Self::Maintenance => "🛠️ Maintenance",
        }
    }

    /// Comma-separated list of every category key, for prompts and errors.
    pub fn choices() -> String {
        Self::ALL
            .iter()
            .map(|c| c.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Input for creating a chore. Produced by the add-chore wizard.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateChoreInput {
    pub name: String,
    pub category: Option<Category>,
    pub mode: AssignMode,
    pub assignee: String,
    pub interval_days: u32,
    pub start_date: Option<NaiveDate>,
    pub time: NaiveTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_keys_round_trip() {
        for category in Category::ALL {
            assert_eq!(Category::from_str(category.as_str()), Some(category));
        }
    }

    #[test]
    fn category_input_is_case_insensitive() {
        assert_eq!(Category::parse_input("  Kitchen "), Some(Category::Kitchen));
        assert_eq!(Category::parse_input("DailyCleaning"), Some(Category::DailyCleaning));
        assert_eq!(Category::parse_input("garden"), None);
    }

    #[test]
    fn category_serializes_as_lowercase_key() {
        let json = serde_json::to_string(&Category::DeepCleaning).unwrap();
        assert_eq!(json, "\"deepcleaning\"");
    }

    #[test]
    fn choices_lists_every_category() {
        assert_eq!(
            Category::choices(),
            "cat, dailycleaning, deepcleaning, kitchen, laundry, maintenance, admin"
        );
    }
}
