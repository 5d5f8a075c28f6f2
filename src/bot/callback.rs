use crate::models::Household;

/// Who pressed "Done": the person tapping the button, or someone they named.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completer {
    Sender,
    Named(String),
}

/// Inline button actions, carried in Telegram's `callback_data`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackAction {
    Done { chore_id: i64, by: Completer },
    /// Ask which household member did the chore.
    DoneByOther { chore_id: i64 },
    Skip { chore_id: i64 },
    CancelOther { chore_id: i64 },
}

impl CallbackAction {
    pub fn encode(&self) -> String {
        match self {
            Self::Done {
                chore_id,
                by: Completer::Sender,
            } => format!("done:{}:self", chore_id),
            Self::Done {
                chore_id,
                by: Completer::Named(name),
            } => format!("done:{}:{}", chore_id, name),
            Self::DoneByOther { chore_id } => format!("done_other:{}", chore_id),
            Self::Skip { chore_id } => format!("skip:{}", chore_id),
            Self::CancelOther { chore_id } => format!("cancel_other:{}", chore_id),
        }
    }

    pub fn parse(data: &str) -> Option<Self> {
        let mut parts = data.splitn(3, ':');
        let kind = parts.next()?;
        let chore_id = parts.next()?.parse().ok()?;
        let extra = parts.next();

        match (kind, extra) {
            ("done", Some("self")) => Some(Self::Done {
                chore_id,
                by: Completer::Sender,
            }),
            ("done", Some(name)) if !name.is_empty() => Some(Self::Done {
                chore_id,
                by: Completer::Named(name.to_string()),
            }),
            ("done_other", None) => Some(Self::DoneByOther { chore_id }),
            ("skip", None) => Some(Self::Skip { chore_id }),
            ("cancel_other", None) => Some(Self::CancelOther { chore_id }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub action: CallbackAction,
}

impl Button {
    pub fn new(label: impl Into<String>, action: CallbackAction) -> Self {
        Self {
            label: label.into(),
            action,
        }
    }
}

/// Rows of inline buttons attached to a message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Keyboard {
    pub rows: Vec<Vec<Button>>,
}

/// Done / Done by other / Skip, attached to reminders and `/today` entries.
pub fn reminder_keyboard(chore_id: i64) -> Keyboard {
    Keyboard {
        rows: vec![
            vec![
                Button::new(
                    "Done ✅",
                    CallbackAction::Done {
                        chore_id,
                        by: Completer::Sender,
                    },
                ),
                Button::new("Done by other 👥", CallbackAction::DoneByOther { chore_id }),
            ],
            vec![Button::new("Skip ⏭️", CallbackAction::Skip { chore_id })],
        ],
    }
}

/// One button per household member, plus Cancel.
pub fn done_other_keyboard(chore_id: i64, household: &Household) -> Keyboard {
    let mut rows = Vec::new();
    if let Some((p1, p2)) = household.people() {
        rows.push(
            [p1, p2]
                .into_iter()
                .map(|person| {
                    Button::new(
                        person,
                        CallbackAction::Done {
                            chore_id,
                            by: Completer::Named(person.to_string()),
                        },
                    )
                })
                .collect(),
        );
    }
    rows.push(vec![Button::new(
        "Cancel",
        CallbackAction::CancelOther { chore_id },
    )]);
    Keyboard { rows }
}
