//! The add-chore wizard.
//!
//! A linear sequence of questions, one [`WizardStep`] per answer. A bad answer
//! leaves the session where it was so the user can simply try again.

use chrono::{NaiveDate, NaiveTime};

use crate::db::Database;
use crate::error::BotError;
use crate::models::*;

/// Outcome of feeding one answer to the wizard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Save `session` and ask the next question.
    Continue { session: Session, prompt: String },
    /// All answers collected.
    Complete(CreateChoreInput),
}

pub fn start_prompt() -> String {
    format!(
        "🧹 Add chore (step 1/{})\nWhat is the chore name?\nExample: mopping",
        WizardStep::COUNT
    )
}

/// Apply the user's answer to the current step.
///
/// Choosing `rotate` consumes a slot in the household rotation right away,
/// even if the wizard is later cancelled.
pub fn advance(
    db: &Database,
    session: Session,
    text: &str,
    today: NaiveDate,
) -> Result<Transition, BotError> {
    let text = text.trim();
    let Session {
        chat_id,
        user_id,
        step,
        mut draft,
    } = session;

    let next = match step {
        WizardStep::AskName => {
            draft.name = Some(parse_name(text)?);
            WizardStep::AskAssignee
        }
        WizardStep::AskAssignee => {
            let (mode, assignee) = parse_assignee(db, text)?;
            draft.mode = Some(mode);
            draft.assignee = Some(assignee);
            WizardStep::AskCategory
        }
        WizardStep::AskCategory => {
            draft.category = Some(parse_category(text)?);
            WizardStep::AskInterval
        }
        WizardStep::AskInterval => {
            draft.interval_days = Some(parse_interval(text)?);
            WizardStep::AskStartDate
        }
        WizardStep::AskStartDate => {
            draft.start_date = Some(parse_start_date(text, today)?);
            WizardStep::AskTime
        }
        WizardStep::AskTime => {
            let time = parse_reminder_time(text)?;
            let input = draft
                .finish(time)
                .ok_or_else(|| anyhow::anyhow!("Wizard draft is missing earlier answers"))?;
            return Ok(Transition::Complete(input));
        }
    };

    let prompt = prompt_for(next, &db.get_household()?);
    Ok(Transition::Continue {
        session: Session {
            chat_id,
            user_id,
            step: next,
            draft,
        },
        prompt,
    })
}

/// The question asked when the wizard arrives at `step`.
pub fn prompt_for(step: WizardStep, household: &Household) -> String {
    let header = format!("Step {}/{}", step.number(), WizardStep::COUNT);
    match step {
        WizardStep::AskName => start_prompt(),
        WizardStep::AskAssignee => match household.people() {
            Some((p1, p2)) => format!(
                "{}: Who is it assigned to?\nReply: {} / {} / rotate",
                header, p1, p2
            ),
            None => format!(
                "{}: Who is it assigned to?\nReply with a name or 'rotate'. (Tip: /setpeople first)",
                header
            ),
        },
        WizardStep::AskCategory => {
            format!("{}: Category?\nChoose one: {}", header, Category::choices())
        }
        WizardStep::AskInterval => format!(
            "{}: Repeat every how many days?\nReply with a number (e.g., 7)",
            header
        ),
        WizardStep::AskStartDate => format!(
            "{}: When should this chore start?\nReply DD-MM-YYYY (e.g., 05-01-2026) or type: today",
            header
        ),
        WizardStep::AskTime => format!(
            "{}: Reminder time? Reply HH:MM (24h), e.g., 21:00",
            header
        ),
    }
}

pub fn parse_name(text: &str) -> Result<String, BotError> {
    let name = text.trim();
    if name.chars().count() < 2 {
        return Err(BotError::invalid(
            "Please enter a valid chore name (e.g., mopping).",
        ));
    }
    Ok(name.to_string())
}

fn parse_assignee(db: &Database, text: &str) -> Result<(AssignMode, String), BotError> {
    if text.eq_ignore_ascii_case("rotate") {
        let assignee = db.next_rotation_assignee()?.ok_or_else(|| {
            BotError::invalid(
                "Rotation needs two household people.\nUse /setpeople first, or reply with a name.",
            )
        })?;
        return Ok((AssignMode::Rotate, assignee));
    }

    if text.is_empty() {
        return Err(BotError::invalid("Please reply with a name or 'rotate'."));
    }
    Ok((AssignMode::Fixed, text.to_string()))
}

pub fn parse_category(text: &str) -> Result<Category, BotError> {
    Category::parse_input(text).ok_or_else(|| {
        BotError::invalid(format!(
            "Invalid category.\nChoose one: {}",
            Category::choices()
        ))
    })
}

/// Repeat interval in days, 1 to 365.
pub fn parse_interval(text: &str) -> Result<u32, BotError> {
    let text = text.trim();
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(BotError::invalid(
            "Please reply with a number of days (e.g., 7).",
        ));
    }
    match text.parse::<u32>() {
        Ok(days) if (1..=365).contains(&days) => Ok(days),
        _ => Err(BotError::invalid("Please choose an interval from 1–365.")),
    }
}

/// `today` or a DD-MM-YYYY calendar date.
pub fn parse_start_date(text: &str, today: NaiveDate) -> Result<NaiveDate, BotError> {
    let text = text.trim();
    if text.eq_ignore_ascii_case("today") {
        return Ok(today);
    }

    let invalid = || BotError::invalid("Date must be DD-MM-YYYY (e.g., 05-01-2026)");
    if !matches_shape(text, "99-99-9999") {
        return Err(invalid());
    }
    NaiveDate::parse_from_str(text, "%d-%m-%Y").map_err(|_| invalid())
}

/// HH:MM on the 24-hour clock, both fields two digits.
pub fn parse_reminder_time(text: &str) -> Result<NaiveTime, BotError> {
    let text = text.trim();
    if !matches_shape(text, "99:99") {
        return Err(BotError::invalid("Time must be HH:MM (24h), e.g., 21:00"));
    }

    let hour: u32 = text[0..2].parse().map_err(|_| BotError::invalid("Invalid time"))?;
    let minute: u32 = text[3..5].parse().map_err(|_| BotError::invalid("Invalid time"))?;
    NaiveTime::from_hms_opt(hour, minute, 0)
        .ok_or_else(|| BotError::invalid("Invalid time. Hours 00–23, minutes 00–59."))
}

/// `9` in the shape stands for any ASCII digit; other characters must match exactly.
fn matches_shape(text: &str, shape: &str) -> bool {
    text.len() == shape.len()
        && text.chars().zip(shape.chars()).all(|(c, s)| match s {
            '9' => c.is_ascii_digit(),
            _ => c == s,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn db() -> Database {
        let db = Database::open_memory().unwrap();
        db.migrate().unwrap();
        db
    }

    fn answer(db: &Database, session: Session, text: &str) -> Session {
        match advance(db, session, text, date("2024-01-01")).unwrap() {
            Transition::Continue { session, .. } => session,
            Transition::Complete(_) => panic!("wizard finished early"),
        }
    }

    #[test]
    fn names_need_two_characters() {
        assert!(parse_name("m").is_err());
        assert!(parse_name("   ").is_err());
        assert_eq!(parse_name("  mopping ").unwrap(), "mopping");
    }

    #[test]
    fn interval_is_bounded() {
        assert_eq!(parse_interval("7").unwrap(), 7);
        assert_eq!(parse_interval("365").unwrap(), 365);
        assert!(matches!(parse_interval("0"), Err(BotError::Invalid(_))));
        assert!(matches!(parse_interval("366"), Err(BotError::Invalid(_))));
        assert!(matches!(parse_interval("seven"), Err(BotError::Invalid(_))));
        assert!(matches!(parse_interval(""), Err(BotError::Invalid(_))));
        assert!(matches!(parse_interval("7a"), Err(BotError::Invalid(_))));
        assert!(matches!(parse_interval("+7"), Err(BotError::Invalid(_))));
        assert_eq!(parse_interval(" 14 ").unwrap(), 14);
        assert!(matches!(parse_interval("99999999999"), Err(BotError::Invalid(_))));
    }

    #[test]
    fn start_date_accepts_today_or_ddmmyyyy() {
        let today = date("2024-06-01");
        assert_eq!(parse_start_date("Today", today).unwrap(), today);
        assert_eq!(
            parse_start_date("05-01-2026", today).unwrap(),
            date("2026-01-05")
        );
        assert!(parse_start_date("2026-01-05", today).is_err());
        assert!(parse_start_date("5-1-2026", today).is_err());
        assert!(parse_start_date("31-02-2026", today).is_err());
    }

    #[test]
    fn reminder_time_is_strict_24h() {
        assert_eq!(
            parse_reminder_time("21:00").unwrap(),
            NaiveTime::from_hms_opt(21, 0, 0).unwrap()
        );
        assert_eq!(
            parse_reminder_time(" 07:05 ").unwrap(),
            NaiveTime::from_hms_opt(7, 5, 0).unwrap()
        );
        assert!(parse_reminder_time("7:05").is_err());
        assert!(parse_reminder_time("24:00").is_err());
        assert!(parse_reminder_time("12:60").is_err());
        assert!(parse_reminder_time("noon").is_err());
    }

    #[test]
    fn walks_every_step_in_order() {
        let db = db();
        let mut session = Session::start(1, 2);

        session = answer(&db, session, "mopping");
        assert_eq!(session.step, WizardStep::AskAssignee);
        session = answer(&db, session, "Alice");
        assert_eq!(session.step, WizardStep::AskCategory);
        session = answer(&db, session, "DailyCleaning");
        assert_eq!(session.step, WizardStep::AskInterval);
        session = answer(&db, session, "7");
        assert_eq!(session.step, WizardStep::AskStartDate);
        session = answer(&db, session, "today");
        assert_eq!(session.step, WizardStep::AskTime);

        let done = advance(&db, session, "21:00", date("2024-01-01")).unwrap();
        assert_eq!(
            done,
            Transition::Complete(CreateChoreInput {
                name: "mopping".to_string(),
                category: Some(Category::DailyCleaning),
                mode: AssignMode::Fixed,
                assignee: "Alice".to_string(),
                interval_days: 7,
                start_date: Some(date("2024-01-01")),
                time: NaiveTime::from_hms_opt(21, 0, 0).unwrap(),
            })
        );
    }

    #[test]
    fn rotate_without_people_is_rejected() {
        let db = db();
        let session = Session {
            step: WizardStep::AskAssignee,
            ..Session::start(1, 2)
        };
        let result = advance(&db, session, "rotate", date("2024-01-01"));
        assert!(matches!(result, Err(BotError::Invalid(_))));
    }

    #[test]
    fn rotate_takes_next_person() {
        let db = db();
        db.set_people("Alice", "Bob").unwrap();
        let session = Session {
            step: WizardStep::AskAssignee,
            ..Session::start(1, 2)
        };

        let session = answer(&db, session, "ROTATE");
        assert_eq!(session.draft.mode, Some(AssignMode::Rotate));
        assert_eq!(session.draft.assignee.as_deref(), Some("Alice"));
        assert_eq!(db.get_household().unwrap().rotate_index, 1);
    }

    #[test]
    fn assignee_prompt_names_household_people() {
        let household = Household {
            person1: Some("Alice".to_string()),
            person2: Some("Bob".to_string()),
            rotate_index: 0,
        };
        assert_eq!(
            prompt_for(WizardStep::AskAssignee, &household),
            "Step 2/6: Who is it assigned to?\nReply: Alice / Bob / rotate"
        );
    }
}
