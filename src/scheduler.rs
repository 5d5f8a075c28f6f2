//! Minute timer for reminders and the daily digest.
//!
//! Spawns a tokio task that wakes at the top of every minute, reminds the
//! household chat about chores whose reminder time has come, and sends the
//! digest once per UTC day at the configured hour.

use std::time::Duration;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, Timelike, Utc};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::bot::{format, reminder_keyboard, Outgoing, SharedMessenger};
use crate::db::Database;
use crate::due;

/// Interval between scheduler ticks (seconds).
const TICK_INTERVAL_SECS: u64 = 60;

pub struct Scheduler {
    db: Database,
    messenger: SharedMessenger,
    /// Household chat that receives reminders and the digest.
    chat_id: i64,
    digest_hour_utc: u32,
}

impl Scheduler {
    pub fn new(db: Database, messenger: SharedMessenger, chat_id: i64, digest_hour_utc: u32) -> Self {
        Self {
            db,
            messenger,
            chat_id,
            digest_hour_utc,
        }
    }

    /// Start the timer loop.
    pub fn run(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            info!(
                "Scheduler started for chat {} (digest at {:02}:00 UTC)",
                self.chat_id, self.digest_hour_utc
            );

            let start = Instant::now() + until_next_minute(Local::now().naive_local());
            let mut interval =
                tokio::time::interval_at(start, Duration::from_secs(TICK_INTERVAL_SECS));
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                interval.tick().await;
                self.tick(Local::now().naive_local(), Utc::now()).await;
            }
        })
    }

    /// Run one tick: reminders against local time, the digest against UTC.
    pub async fn tick(&self, local: NaiveDateTime, utc: DateTime<Utc>) {
        if let Err(e) = self.send_reminders(local).await {
            error!("Reminder check failed: {:#}", e);
        }
        if let Err(e) = self.maybe_send_digest(local.date(), utc).await {
            error!("Digest failed: {:#}", e);
        }
    }

    /// Remind about every chore whose reminder is due at `now`.
    ///
    /// A chore is only marked reminded once its message was sent; a failed
    /// send is not retried.
    pub async fn send_reminders(&self, now: NaiveDateTime) -> anyhow::Result<usize> {
        let today = now.date();
        let chores = self.db.list_chores()?;
        let mut sent = 0;

        for chore in chores.iter().filter(|c| due::should_remind(c, now)) {
            let message = Outgoing::new(self.chat_id, format::reminder(chore, today))
                .with_keyboard(reminder_keyboard(chore.id));

            match self.messenger.send(&message).await {
                Ok(()) => {
                    self.db.mark_reminded(chore.id, today)?;
                    debug!("Reminded chat {} about chore {}", self.chat_id, chore.id);
                    sent += 1;
                }
                Err(e) => warn!("Failed to send reminder for chore {}: {:#}", chore.id, e),
            }
        }

        Ok(sent)
    }

    /// Send the digest if the UTC clock is in the digest hour and it has not
    /// gone out yet this UTC day. Returns whether it was sent.
    ///
    /// The sent date is stored with the household, so a restart inside the
    /// digest hour does not send it twice.
    pub async fn maybe_send_digest(
        &self,
        today: NaiveDate,
        utc: DateTime<Utc>,
    ) -> anyhow::Result<bool> {
        let utc_date = utc.date_naive();
        if utc.hour() != self.digest_hour_utc || self.db.last_digest_on()? == Some(utc_date) {
            return Ok(false);
        }

        let chores = self.db.list_chores()?;
        let message = Outgoing::new(self.chat_id, format::digest(&chores, today));
        self.messenger.send(&message).await?;

        self.db.set_last_digest_on(utc_date)?;
        info!("Daily digest sent to chat {}", self.chat_id);
        Ok(true)
    }
}

/// Time left until the next whole minute.
fn until_next_minute(now: NaiveDateTime) -> Duration {
    let elapsed = Duration::new(u64::from(now.second()), now.nanosecond() % 1_000_000_000);
    Duration::from_secs(TICK_INTERVAL_SECS).saturating_sub(elapsed)
}
