//! Conversation handling.
//!
//! Every inbound chat event becomes an [`Envelope`] carrying one of a closed
//! set of [`Incoming`] kinds. [`Bot::handle`] turns it into a [`Response`]
//! without touching the network; a [`Messenger`] then delivers it.

mod callback;
mod command;
pub mod format;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};

pub use callback::*;
pub use command::*;

use crate::db::Database;
use crate::error::BotError;
use crate::models::*;
use crate::wizard::{self, Transition};

/// Maximum entries returned by `/history`.
pub const HISTORY_LIMIT: u32 = 50;

/// An inbound event with its sender.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub chat_id: i64,
    pub user_id: i64,
    /// Sender's display name; recorded as the completer for "done by me".
    pub sender: String,
    /// Message to reply to, if the event was a message.
    pub message_id: Option<i64>,
    pub incoming: Incoming,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Incoming {
    Command(Command),
    /// Plain text: an answer to the add-chore wizard, if one is running.
    Text(String),
    Callback {
        query_id: String,
        /// `None` when the button data could not be understood.
        action: Option<CallbackAction>,
    },
}

impl Incoming {
    /// Classify message text as a command or a wizard answer.
    pub fn from_text(text: &str) -> Self {
        match Command::parse(text) {
            Some(command) => Self::Command(command),
            None => Self::Text(text.to_string()),
        }
    }
}

/// A message to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outgoing {
    pub chat_id: i64,
    pub text: String,
    pub reply_to: Option<i64>,
    pub keyboard: Option<Keyboard>,
}

impl Outgoing {
    pub fn new(chat_id: i64, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            text: text.into(),
            reply_to: None,
            keyboard: None,
        }
    }

    pub fn with_keyboard(mut self, keyboard: Keyboard) -> Self {
        self.keyboard = Some(keyboard);
        self
    }
}

/// Acknowledgement of an inline button press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackAck {
    pub query_id: String,
    pub text: Option<String>,
}

/// Everything to send back for one inbound event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Response {
    pub ack: Option<CallbackAck>,
    pub messages: Vec<Outgoing>,
}

impl Response {
    /// A single message quoting the triggering message.
    fn reply(envelope: &Envelope, text: impl Into<String>) -> Self {
        Self {
            ack: None,
            messages: vec![Outgoing {
                reply_to: envelope.message_id,
                ..Outgoing::new(envelope.chat_id, text)
            }],
        }
    }

    fn ack(query_id: &str, text: Option<&str>) -> Self {
        Self {
            ack: Some(CallbackAck {
                query_id: query_id.to_string(),
                text: text.map(str::to_string),
            }),
            messages: Vec::new(),
        }
    }

    fn then(mut self, message: Outgoing) -> Self {
        self.messages.push(message);
        self
    }
}

/// Outbound side of a chat platform.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send(&self, message: &Outgoing) -> anyhow::Result<()>;

    async fn answer_callback(&self, ack: &CallbackAck) -> anyhow::Result<()>;
}

/// Send a response: the acknowledgement first, then each message in order.
///
/// Failures are logged and the remaining messages are still attempted.
pub async fn deliver(messenger: &dyn Messenger, response: &Response) {
    if let Some(ack) = &response.ack {
        if let Err(e) = messenger.answer_callback(ack).await {
            tracing::warn!("Failed to answer callback {}: {:#}", ack.query_id, e);
        }
    }
    for message in &response.messages {
        if let Err(e) = messenger.send(message).await {
            tracing::warn!("Failed to send message to chat {}: {:#}", message.chat_id, e);
        }
    }
}

/// Shared handle used by the poller and the webhook server.
pub type SharedMessenger = Arc<dyn Messenger>;

/// Command, wizard and button handling over a [`Database`].
#[derive(Clone)]
pub struct Bot {
    db: Database,
}

impl Bot {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Handle one inbound event at local time `now`.
    ///
    /// Never fails: user mistakes and missing chores become replies, and
    /// internal errors are logged and reported generically.
    pub fn handle(&self, envelope: &Envelope, now: NaiveDateTime) -> Response {
        let today = now.date();
        match &envelope.incoming {
            Incoming::Command(command) => self
                .on_command(envelope, command, today)
                .unwrap_or_else(|e| error_reply(envelope, e)),
            Incoming::Text(text) => self
                .on_text(envelope, text, today)
                .unwrap_or_else(|e| error_reply(envelope, e)),
            Incoming::Callback { query_id, action } => match action {
                Some(action) => self
                    .on_callback(envelope, query_id, action, today)
                    .unwrap_or_else(|e| callback_error(envelope, query_id, e)),
                None => {
                    tracing::debug!("Ignoring unrecognised callback from chat {}", envelope.chat_id);
                    Response::ack(query_id, None)
                }
            },
        }
    }

    // ============================================================
    // Commands
    // ============================================================

    fn on_command(
        &self,
        envelope: &Envelope,
        command: &Command,
        today: NaiveDate,
    ) -> Result<Response, BotError> {
        tracing::debug!("Command from chat {}: {:?}", envelope.chat_id, command);

        let response = match command {
            Command::Help => Response::reply(envelope, format::help()),
            Command::SetPeople { person1, person2 } => {
                self.db.set_people(person1, person2)?;
                tracing::info!("Household people set to {} and {}", person1, person2);
                Response::reply(envelope, format::people_set(person1, person2))
            }
            Command::Add => {
                self.db
                    .save_session(&Session::start(envelope.chat_id, envelope.user_id))?;
                Response::reply(envelope, wizard::start_prompt())
            }
            Command::Cancel => {
                self.db.clear_session(envelope.chat_id, envelope.user_id)?;
                Response::reply(envelope, "❎ Cancelled.")
            }
            Command::List { category } => self.list(envelope, category.as_deref(), today)?,
            Command::Today => self.today(envelope, today)?,
            Command::Done { chore_id, who } => {
                let completed_by = who.as_deref().unwrap_or(&envelope.sender);
                let receipt = self.complete(*chore_id, completed_by, today)?;
                Response::reply(envelope, format::completion(&receipt))
            }
            Command::Skip { chore_id } => {
                self.skip(*chore_id, today)?;
                Response::reply(envelope, "⏭️ Skipped for today.")
            }
            Command::Remove { chore_id } => {
                if !self.db.delete_chore(*chore_id)? {
                    return Err(BotError::chore_not_found(*chore_id));
                }
                tracing::info!("Removed chore {}", chore_id);
                Response::reply(envelope, "🗑️ Removed.")
            }
            Command::History(filter) => {
                let completions = self.db.get_history(filter, today, HISTORY_LIMIT)?;
                Response::reply(envelope, format::history(&completions))
            }
            Command::Summary { days } => {
                let summary = self.db.get_summary(*days, today)?;
                Response::reply(envelope, format::summary(&summary))
            }
            Command::Stats => {
                let stats = self.db.get_lifetime_stats()?;
                Response::reply(envelope, format::stats(&stats))
            }
            Command::Malformed { usage } => Response::reply(envelope, *usage),
            Command::Unknown(name) => {
                tracing::debug!("Ignoring unknown command /{}", name);
                Response::default()
            }
        };

        Ok(response)
    }

    fn list(
        &self,
        envelope: &Envelope,
        category: Option<&str>,
        today: NaiveDate,
    ) -> Result<Response, BotError> {
        let filter = match category {
            Some(raw) => Some(Category::parse_input(raw).ok_or_else(|| {
                BotError::invalid(format!(
                    "Unknown category.\nUse one of: {}\nExample: /list cat",
                    Category::choices()
                ))
            })?),
            None => None,
        };

        let chores: Vec<Chore> = self
            .db
            .list_chores()?
            .into_iter()
            .filter(|c| filter.map_or(true, |f| c.category_or_default() == f))
            .collect();

        if chores.is_empty() {
            return Ok(Response::reply(
                envelope,
                "No chores found for that view. Use /add to create one.",
            ));
        }

        Ok(Response::reply(envelope, format::chore_list(&chores, today)))
    }

    fn today(&self, envelope: &Envelope, today: NaiveDate) -> Result<Response, BotError> {
        let due: Vec<Chore> = self
            .db
            .list_chores()?
            .into_iter()
            .filter(|c| crate::due::is_due(c, today))
            .collect();

        if due.is_empty() {
            return Ok(Response::reply(envelope, "✅ No chores due right now."));
        }

        let mut response = Response::reply(
            envelope,
            format!(
                "📅 Due / overdue now: {} chore(s). Sending details with buttons…",
                due.len()
            ),
        );
        for chore in &due {
            response = response.then(
                Outgoing::new(envelope.chat_id, format::due_now(chore, today))
                    .with_keyboard(reminder_keyboard(chore.id)),
            );
        }
        Ok(response)
    }

    fn complete(
        &self,
        chore_id: i64,
        completed_by: &str,
        today: NaiveDate,
    ) -> Result<CompletionReceipt, BotError> {
        let receipt = self
            .db
            .record_completion(chore_id, completed_by, today)?
            .ok_or_else(|| BotError::chore_not_found(chore_id))?;
        tracing::info!(
            "Chore {} ({}) completed by {}",
            chore_id,
            receipt.completion.chore_name,
            completed_by
        );
        Ok(receipt)
    }

    fn skip(&self, chore_id: i64, today: NaiveDate) -> Result<(), BotError> {
        if !self.db.skip_chore(chore_id, today)? {
            return Err(BotError::chore_not_found(chore_id));
        }
        tracing::info!("Chore {} skipped for {}", chore_id, today);
        Ok(())
    }

    // ============================================================
    // Wizard answers
    // ============================================================

    fn on_text(
        &self,
        envelope: &Envelope,
        text: &str,
        today: NaiveDate,
    ) -> Result<Response, BotError> {
        let session = match self.db.get_session(envelope.chat_id, envelope.user_id) {
            Ok(Some(session)) => session,
            Ok(None) => return Ok(Response::default()),
            Err(e) => {
                tracing::warn!("Discarding unreadable wizard session: {:#}", e);
                self.db.clear_session(envelope.chat_id, envelope.user_id)?;
                return Ok(Response::reply(
                    envelope,
                    "Session reset. Use /add to start again.",
                ));
            }
        };

        match wizard::advance(&self.db, session, text, today)? {
            Transition::Continue { session, prompt } => {
                self.db.save_session(&session)?;
                Ok(Response::reply(envelope, prompt))
            }
            Transition::Complete(input) => {
                let chore = self
                    .db
                    .finish_wizard(envelope.chat_id, envelope.user_id, input)?;
                tracing::info!("Added chore {} ({})", chore.id, chore.name);
                Ok(Response::reply(envelope, format::chore_added(&chore)))
            }
        }
    }

    // ============================================================
    // Inline buttons
    // ============================================================

    fn on_callback(
        &self,
        envelope: &Envelope,
        query_id: &str,
        action: &CallbackAction,
        today: NaiveDate,
    ) -> Result<Response, BotError> {
        let chat_id = envelope.chat_id;
        let response = match action {
            CallbackAction::Done { chore_id, by } => {
                let completed_by = match by {
                    Completer::Sender => envelope.sender.as_str(),
                    Completer::Named(name) => name.as_str(),
                };
                let receipt = self.complete(*chore_id, completed_by, today)?;
                Response::ack(query_id, Some("Marked done"))
                    .then(Outgoing::new(chat_id, format::completion(&receipt)))
            }
            CallbackAction::DoneByOther { chore_id } => {
                let household = self.db.get_household()?;
                Response::ack(query_id, None).then(
                    Outgoing::new(chat_id, "Who completed it?")
                        .with_keyboard(done_other_keyboard(*chore_id, &household)),
                )
            }
            CallbackAction::Skip { chore_id } => {
                self.skip(*chore_id, today)?;
                Response::ack(query_id, Some("Skipped")).then(Outgoing::new(
                    chat_id,
                    format!("⏭️ Skipped chore #{} for today.", chore_id),
                ))
            }
            CallbackAction::CancelOther { .. } => Response::ack(query_id, Some("Cancelled")),
        };
        Ok(response)
    }
}

fn error_reply(envelope: &Envelope, error: BotError) -> Response {
    match error {
        BotError::Invalid(msg) | BotError::NotFound(msg) => {
            Response::reply(envelope, format!("❌ {}", msg))
        }
        BotError::Internal(e) => {
            tracing::error!("Failed to handle message in chat {}: {:#}", envelope.chat_id, e);
            Response::reply(
                envelope,
                "❌ Something went wrong.\nType /cancel then /add to try again.",
            )
        }
    }
}

fn callback_error(envelope: &Envelope, query_id: &str, error: BotError) -> Response {
    let text = match error {
        BotError::Invalid(msg) | BotError::NotFound(msg) => format!("❌ {}", msg),
        BotError::Internal(e) => {
            tracing::error!("Failed to handle button in chat {}: {:#}", envelope.chat_id, e);
            "❌ Something went wrong. Please try again.".to_string()
        }
    };
    Response::ack(query_id, Some("Error")).then(Outgoing::new(envelope.chat_id, text))
}
