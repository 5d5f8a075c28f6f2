use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// An append-only record of a chore being done.
///
/// The chore name and assignee are snapshots taken at completion time, so the
/// log stays readable after a chore is renamed or removed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Completion {
    pub id: i64,
    pub chore_id: i64,
    pub chore_name: String,
    pub assigned_to: String,
    pub completed_by: String,
    pub completed_on: NaiveDate,
    pub completed_at: DateTime<Utc>,
}

impl Completion {
    /// A cover is a completion by someone other than the assignee.
    pub fn is_cover(&self) -> bool {
        !same_person(&self.assigned_to, &self.completed_by)
    }
}

/// Names are compared ignoring ASCII case, matching SQLite's `LOWER()` in the reports.
pub fn same_person(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

/// Result of recording a completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionReceipt {
    pub completion: Completion,
    /// Interval of the chore, i.e. days until it is due again.
    pub interval_days: u32,
}

/// Which completions `/history` should show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryFilter {
    All,
    /// Completed within the last N days.
    SinceDays(u32),
    /// Case-insensitive substring of the chore name, assignee or completer.
    Matching(String),
}

/// Completion count for one person.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PersonCount {
    pub person: String,
    pub count: i64,
}

/// How often one person covered for another.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CoverCount {
    pub assigned_to: String,
    pub completed_by: String,
    pub count: i64,
}

/// Completions over a recent window, for `/summary`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodSummary {
    pub days: u32,
    pub by_completer: Vec<PersonCount>,
    pub covers: Vec<CoverCount>,
}

/// All-time totals, for `/stats`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifetimeStats {
    pub by_completer: Vec<PersonCount>,
    pub by_assignee: Vec<PersonCount>,
    pub total_covers: i64,
}
