use crate::models::HistoryFilter;

pub const SETPEOPLE_USAGE: &str =
    "Usage: /setpeople Person1 Person2\nExample: /setpeople Wife Husband";
pub const DONE_USAGE: &str = "Usage: /done <id> [who]\nExamples:\n/done 3\n/done 3 wife";
pub const SKIP_USAGE: &str = "Usage: /skip <id>\nExample: /skip 2";
pub const REMOVE_USAGE: &str = "Usage: /remove <id>\nExample: /remove 2";

/// Days covered by `/summary` when no argument is given.
pub const DEFAULT_SUMMARY_DAYS: u32 = 7;

/// A slash command, with its arguments already split out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    SetPeople { person1: String, person2: String },
    Add,
    Cancel,
    /// Raw category filter; checked against the category set by the handler.
    List { category: Option<String> },
    Today,
    Done { chore_id: i64, who: Option<String> },
    Skip { chore_id: i64 },
    Remove { chore_id: i64 },
    History(HistoryFilter),
    Summary { days: u32 },
    Stats,
    /// A known command with unusable arguments.
    Malformed { usage: &'static str },
    Unknown(String),
}

impl Command {
    /// Parse a message as a command.
    ///
    /// Returns `None` if the text does not start with `/`. A `@botname`
    /// suffix on the command is ignored.
    pub fn parse(text: &str) -> Option<Self> {
        let rest = text.trim().strip_prefix('/')?;
        let (head, args) = match rest.split_once(char::is_whitespace) {
            Some((head, args)) => (head, args.trim()),
            None => (rest, ""),
        };
        let name = head
            .split_once('@')
            .map_or(head, |(name, _)| name)
            .to_lowercase();

        let command = match name.as_str() {
            "start" | "help" => Self::Help,
            "setpeople" => parse_people(args),
            "add" => Self::Add,
            "cancel" => Self::Cancel,
            "list" => Self::List {
                category: (!args.is_empty()).then(|| args.to_string()),
            },
            "today" => Self::Today,
            "done" => parse_done(args),
            "skip" => match parse_id(args) {
                Some(chore_id) => Self::Skip { chore_id },
                None => Self::Malformed { usage: SKIP_USAGE },
            },
            "remove" => match parse_id(args) {
                Some(chore_id) => Self::Remove { chore_id },
                None => Self::Malformed {
                    usage: REMOVE_USAGE,
                },
            },
            "history" => Self::History(parse_history_filter(args)),
            "summary" => Self::Summary {
                days: parse_count(args).unwrap_or(DEFAULT_SUMMARY_DAYS),
            },
            "stats" => Self::Stats,
            _ => Self::Unknown(name),
        };

        Some(command)
    }
}

fn parse_people(args: &str) -> Command {
    match args.split_once(char::is_whitespace) {
        Some((p1, p2)) if !p2.trim().is_empty() => Command::SetPeople {
            person1: p1.to_string(),
            person2: p2.trim().to_string(),
        },
        _ => Command::Malformed {
            usage: SETPEOPLE_USAGE,
        },
    }
}

fn parse_done(args: &str) -> Command {
    let (id, who) = match args.split_once(char::is_whitespace) {
        Some((id, who)) => (id, Some(who.trim()).filter(|w| !w.is_empty())),
        None => (args, None),
    };

    match parse_id(id) {
        Some(chore_id) => Command::Done {
            chore_id,
            who: who.map(str::to_string),
        },
        None => Command::Malformed { usage: DONE_USAGE },
    }
}

fn parse_history_filter(args: &str) -> HistoryFilter {
    if args.is_empty() {
        return HistoryFilter::All;
    }
    match parse_count(args) {
        Some(days) => HistoryFilter::SinceDays(days),
        None => HistoryFilter::Matching(args.to_string()),
    }
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

/// Chore ids are plain positive integers.
pub fn parse_id(s: &str) -> Option<i64> {
    is_digits(s).then(|| s.parse().ok()).flatten()
}

fn parse_count(s: &str) -> Option<u32> {
    is_digits(s).then(|| s.parse().ok()).flatten()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_not_a_command() {
        assert_eq!(Command::parse("mopping"), None);
        assert_eq!(Command::parse(""), None);
    }

    #[test]
    fn strips_bot_mention() {
        assert_eq!(Command::parse("/help@chore_bot"), Some(Command::Help));
        assert_eq!(Command::parse("/START"), Some(Command::Help));
    }

    #[test]
    fn parses_setpeople() {
        assert_eq!(
            Command::parse("/setpeople Alice Bob"),
            Some(Command::SetPeople {
                person1: "Alice".to_string(),
                person2: "Bob".to_string(),
            })
        );
        assert_eq!(
            Command::parse("/setpeople Alice"),
            Some(Command::Malformed {
                usage: SETPEOPLE_USAGE
            })
        );
    }

    #[test]
    fn second_person_keeps_the_rest_of_the_line() {
        assert_eq!(
            Command::parse("/setpeople Alice Mary Ann"),
            Some(Command::SetPeople {
                person1: "Alice".to_string(),
                person2: "Mary Ann".to_string(),
            })
        );
    }

    #[test]
    fn parses_done_with_and_without_who() {
        assert_eq!(
            Command::parse("/done 3"),
            Some(Command::Done {
                chore_id: 3,
                who: None
            })
        );
        assert_eq!(
            Command::parse("/done 3 Bob"),
            Some(Command::Done {
                chore_id: 3,
                who: Some("Bob".to_string())
            })
        );
        assert_eq!(
            Command::parse("/done three"),
            Some(Command::Malformed { usage: DONE_USAGE })
        );
        assert_eq!(
            Command::parse("/done"),
            Some(Command::Malformed { usage: DONE_USAGE })
        );
    }

    #[test]
    fn skip_and_remove_need_a_numeric_id() {
        assert_eq!(
            Command::parse("/skip 2"),
            Some(Command::Skip { chore_id: 2 })
        );
        assert_eq!(
            Command::parse("/skip -2"),
            Some(Command::Malformed { usage: SKIP_USAGE })
        );
        assert_eq!(
            Command::parse("/remove 2 now"),
            Some(Command::Malformed {
                usage: REMOVE_USAGE
            })
        );
    }

    #[test]
    fn parses_history_filters() {
        assert_eq!(
            Command::parse("/history"),
            Some(Command::History(HistoryFilter::All))
        );
        assert_eq!(
            Command::parse("/history 14"),
            Some(Command::History(HistoryFilter::SinceDays(14)))
        );
        assert_eq!(
            Command::parse("/history Bob"),
            Some(Command::History(HistoryFilter::Matching("Bob".to_string())))
        );
    }

    #[test]
    fn summary_defaults_to_a_week() {
        assert_eq!(Command::parse("/summary"), Some(Command::Summary { days: 7 }));
        assert_eq!(Command::parse("/summary 30"), Some(Command::Summary { days: 30 }));
        assert_eq!(Command::parse("/summary all"), Some(Command::Summary { days: 7 }));
    }

    #[test]
    fn list_keeps_raw_category() {
        assert_eq!(
            Command::parse("/list"),
            Some(Command::List { category: None })
        );
        assert_eq!(
            Command::parse("/list Cat"),
            Some(Command::List {
                category: Some("Cat".to_string())
            })
        );
    }

    #[test]
    fn unknown_commands_are_kept() {
        assert_eq!(
            Command::parse("/weather"),
            Some(Command::Unknown("weather".to_string()))
        );
    }
}
