//! Rolling due dates.
//!
//! Nothing here is persisted: every answer is derived from the chore's
//! `last_done`, `start_date` and `skip_until` and the date passed in.

use chrono::{Days, NaiveDate, NaiveDateTime, Timelike};

use crate::models::Chore;

/// When the chore is next due.
///
/// `last_done + interval` once the chore has been completed, otherwise its
/// start date, otherwise today.
pub fn next_due_date(chore: &Chore, today: NaiveDate) -> NaiveDate {
    match (chore.last_done, chore.start_date) {
        (Some(last_done), _) => last_done
            .checked_add_days(Days::new(u64::from(chore.interval_days)))
            .unwrap_or(NaiveDate::MAX),
        (None, Some(start)) => start,
        (None, None) => today,
    }
}

/// Days from `today` until the chore is due. Negative when overdue.
pub fn days_until_due(chore: &Chore, today: NaiveDate) -> i64 {
    (next_due_date(chore, today) - today).num_days()
}

pub fn is_skipped_today(chore: &Chore, today: NaiveDate) -> bool {
    chore.skip_until == Some(today)
}

pub fn is_due(chore: &Chore, today: NaiveDate) -> bool {
    !is_skipped_today(chore, today) && days_until_due(chore, today) <= 0
}

/// Whether the reminder for this chore should go out at `now`.
///
/// Fires in the minute matching the chore's reminder time, at most once per
/// day, and only while the chore is due.
pub fn should_remind(chore: &Chore, now: NaiveDateTime) -> bool {
    let today = now.date();
    chore.time.hour() == now.hour()
        && chore.time.minute() == now.minute()
        && chore.last_reminded != Some(today)
        && is_due(chore, today)
}

/// Ranges `/list` groups chores into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DueBucket {
    Overdue,
    Soon,
    ThisWeek,
    NextWeek,
    Later,
}

impl DueBucket {
    pub const ALL: [DueBucket; 5] = [
        Self::Overdue,
        Self::Soon,
        Self::ThisWeek,
        Self::NextWeek,
        Self::Later,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Self::Overdue => "⛔ Overdue",
            Self::Soon => "🟠 Due in 0–3 days",
            Self::ThisWeek => "🟡 Due in 4–7 days",
            Self::NextWeek => "🟢 Due in 8–14 days",
            Self::Later => "🔵 Due later",
        }
    }
}

/// A chore skipped today is never `Overdue`; it lands in `Soon` instead.
pub fn bucket(chore: &Chore, today: NaiveDate) -> DueBucket {
    let days = days_until_due(chore, today);
    if days < 0 && is_due(chore, today) {
        DueBucket::Overdue
    } else if days <= 3 {
        DueBucket::Soon
    } else if days <= 7 {
        DueBucket::ThisWeek
    } else if days <= 14 {
        DueBucket::NextWeek
    } else {
        DueBucket::Later
    }
}
