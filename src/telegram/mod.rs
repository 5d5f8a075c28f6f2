//! Telegram transport: Bot API client, update decoding and the polling loop.

mod client;
mod types;

use std::time::Duration;

use chrono::{Local, NaiveDateTime};

pub use client::*;
pub use types::*;

use crate::bot::{deliver, Bot, CallbackAction, Envelope, Incoming, Messenger};

/// Pause after a failed `getUpdates` before polling again.
const RETRY_DELAY: Duration = Duration::from_secs(5);

/// Convert an update into an [`Envelope`].
///
/// Returns `None` for updates the bot does not act on: messages without text
/// or sender, and anything other than messages and button presses.
pub fn envelope_from_update(update: &Update) -> Option<Envelope> {
    if let Some(query) = &update.callback_query {
        let chat_id = query
            .message
            .as_ref()
            .map_or(query.from.id, |m| m.chat.id);
        return Some(Envelope {
            chat_id,
            user_id: query.from.id,
            sender: query.from.first_name.clone(),
            message_id: None,
            incoming: Incoming::Callback {
                query_id: query.id.clone(),
                action: query.data.as_deref().and_then(CallbackAction::parse),
            },
        });
    }

    let message = update.message.as_ref()?;
    let from = message.from.as_ref()?;
    let text = message.text.as_deref()?;
    Some(Envelope {
        chat_id: message.chat.id,
        user_id: from.id,
        sender: from.first_name.clone(),
        message_id: Some(message.message_id),
        incoming: Incoming::from_text(text),
    })
}

/// Handle one update at local time `now` and deliver the replies.
pub async fn process_update(
    bot: &Bot,
    messenger: &dyn Messenger,
    update: &Update,
    now: NaiveDateTime,
) {
    let Some(envelope) = envelope_from_update(update) else {
        tracing::debug!("Ignoring update {}", update.update_id);
        return;
    };
    let response = bot.handle(&envelope, now);
    deliver(messenger, &response).await;
}

/// Long-poll Telegram forever, handling updates one at a time in arrival order.
pub async fn run_polling(bot: Bot, client: TelegramClient) {
    let mut offset = None;
    tracing::info!("Polling Telegram for updates");

    loop {
        let updates = match client.get_updates(offset).await {
            Ok(updates) => updates,
            Err(e) => {
                tracing::warn!("getUpdates failed: {}", e);
                tokio::time::sleep(RETRY_DELAY).await;
                continue;
            }
        };

        for update in &updates {
            offset = Some(update.update_id + 1);
            process_update(&bot, &client, update, Local::now().naive_local()).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bot::{Command, Completer};

    fn user() -> User {
        User {
            id: 42,
            first_name: "Alice".to_string(),
            username: None,
        }
    }

    fn message(text: Option<&str>) -> Message {
        Message {
            message_id: 9,
            chat: Chat { id: -100 },
            from: Some(user()),
            text: text.map(str::to_string),
        }
    }

    #[test]
    fn text_message_becomes_command() {
        let update = Update {
            update_id: 1,
            message: Some(message(Some("/done 3"))),
            callback_query: None,
        };
        let envelope = envelope_from_update(&update).unwrap();
        assert_eq!(envelope.chat_id, -100);
        assert_eq!(envelope.sender, "Alice");
        assert_eq!(envelope.message_id, Some(9));
        assert_eq!(
            envelope.incoming,
            Incoming::Command(Command::Done {
                chore_id: 3,
                who: None
            })
        );
    }

    #[test]
    fn callback_uses_chat_of_the_button_message() {
        let update = Update {
            update_id: 2,
            message: None,
            callback_query: Some(CallbackQuery {
                id: "q1".to_string(),
                from: user(),
                message: Some(message(None)),
                data: Some("done:5:self".to_string()),
            }),
        };
        let envelope = envelope_from_update(&update).unwrap();
        assert_eq!(envelope.chat_id, -100);
        assert_eq!(envelope.message_id, None);
        assert_eq!(
            envelope.incoming,
            Incoming::Callback {
                query_id: "q1".to_string(),
                action: Some(CallbackAction::Done {
                    chore_id: 5,
                    by: Completer::Sender
                }),
            }
        );
    }

    #[test]
    fn messages_without_text_are_ignored() {
        let update = Update {
            update_id: 3,
            message: Some(message(None)),
            callback_query: None,
        };
        assert_eq!(envelope_from_update(&update), None);
    }
}
