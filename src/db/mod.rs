mod schema;

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{Context, Result};
use chrono::{DateTime, Days, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, SubsecRound, Utc};
use rusqlite::{Connection, OptionalExtension, Row};

use crate::models::*;

const CHORE_COLUMNS: &str = "id, name, category, mode, assignee, interval_days, start_date, time, last_done, last_reminded, skip_until";

const COMPLETION_COLUMNS: &str =
    "id, chore_id, chore_name, assigned_to, completed_by, completed_on, completed_at";

/// Handle to the chore store.
///
/// Cloning is cheap and every clone shares the same connection, so one
/// `Database` opened at startup is handed to the dispatcher, the webhook
/// server and the reminder timer.
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open(path: PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(&path)
            .with_context(|| format!("Failed to open database at {}", path.display()))?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_default() -> Result<Self> {
        let dirs = directories::ProjectDirs::from("", "", "chore-bot")
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
        let db_path = dirs.data_dir().join("chores.db");
        Self::open(db_path)
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn();
        schema::run_migrations(&conn)
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("database lock poisoned")
    }

    // ============================================================
    // Household operations
    // ============================================================

    pub fn get_household(&self) -> Result<Household> {
        let conn = self.conn();
        read_household(&conn)
    }

    /// Set both people and restart the rotation from the first one.
    pub fn set_people(&self, person1: &str, person2: &str) -> Result<Household> {
        let conn = self.conn();
        conn.execute(
            "UPDATE household SET person1 = ?, person2 = ?, rotate_index = 0 WHERE id = 1",
            (person1, person2),
        )?;
        Ok(Household {
            person1: Some(person1.to_string()),
            person2: Some(person2.to_string()),
            rotate_index: 0,
        })
    }

    /// Take the next person from the rotation and advance the cursor.
    ///
    /// Returns `None` (and leaves the cursor alone) if the household people
    /// have not been set.
    pub fn next_rotation_assignee(&self) -> Result<Option<String>> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let household = read_household(&tx)?;

        let Some(person) = household.next_in_rotation().map(str::to_string) else {
            return Ok(None);
        };

        tx.execute(
            "UPDATE household SET rotate_index = ? WHERE id = 1",
            [household.rotate_index + 1],
        )?;
        tx.commit()?;

        Ok(Some(person))
    }

    /// Date (UTC) the daily digest last went out.
    pub fn last_digest_on(&self) -> Result<Option<NaiveDate>> {
        let conn = self.conn();
        let raw: Option<String> = conn.query_row(
            "SELECT last_digest_on FROM household WHERE id = 1",
            [],
            |row| row.get(0),
        )?;
        Ok(parse_date(raw))
    }

    pub fn set_last_digest_on(&self, date: NaiveDate) -> Result<()> {
        let conn = self.conn();
        conn.execute(
            "UPDATE household SET last_digest_on = ? WHERE id = 1",
            [format_date(date)],
        )?;
        Ok(())
    }

    // ============================================================
    // Chore operations
    // ============================================================

    pub fn list_chores(&self) -> Result<Vec<Chore>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM chores ORDER BY id",
            CHORE_COLUMNS
        ))?;

        let chores = stmt
            .query_map([], chore_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(chores)
    }

    pub fn get_chore(&self, id: i64) -> Result<Option<Chore>> {
        let conn = self.conn();
        read_chore(&conn, id)
    }

    pub fn create_chore(&self, input: CreateChoreInput) -> Result<Chore> {
        let conn = self.conn();
        insert_chore(&conn, input)
    }

    /// Delete a chore. Its completions stay in the log.
    pub fn delete_chore(&self, id: i64) -> Result<bool> {
        let conn = self.conn();
        let rows = conn.execute("DELETE FROM chores WHERE id = ?", [id])?;
        Ok(rows > 0)
    }

    /// Suppress the chore for `today` and re-arm its reminder.
    pub fn skip_chore(&self, id: i64, today: NaiveDate) -> Result<bool> {
        let conn = self.conn();
        let rows = conn.execute(
            "UPDATE chores SET skip_until = ?, last_reminded = NULL WHERE id = ?",
            (format_date(today), id),
        )?;
        Ok(rows > 0)
    }

    pub fn mark_reminded(&self, id: i64, today: NaiveDate) -> Result<bool> {
        let conn = self.conn();
        let rows = conn.execute(
            "UPDATE chores SET last_reminded = ? WHERE id = ?",
            (format_date(today), id),
        )?;
        Ok(rows > 0)
    }

    /// Mark a chore done today and append a completion to the log.
    ///
    /// The chore's assignee is left untouched; `completed_by` only goes into
    /// the log. Returns `None` if the chore does not exist.
    pub fn record_completion(
        &self,
        chore_id: i64,
        completed_by: &str,
        today: NaiveDate,
    ) -> Result<Option<CompletionReceipt>> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let Some(chore) = read_chore(&tx, chore_id)? else {
            return Ok(None);
        };

        tx.execute(
            "UPDATE chores SET last_done = ?, skip_until = NULL, last_reminded = NULL WHERE id = ?",
            (format_date(today), chore_id),
        )?;

        let now = Utc::now().trunc_subsecs(6);
        tx.execute(
            "INSERT INTO completions (chore_id, chore_name, assigned_to, completed_by, completed_on, completed_at)
             VALUES (?, ?, ?, ?, ?, ?)",
            (
                chore_id,
                &chore.name,
                &chore.assignee,
                completed_by,
                format_date(today),
                format_timestamp(now),
            ),
        )?;
        let completion_id = tx.last_insert_rowid();
        tx.commit()?;

        Ok(Some(CompletionReceipt {
            completion: Completion {
                id: completion_id,
                chore_id,
                chore_name: chore.name,
                assigned_to: chore.assignee,
                completed_by: completed_by.to_string(),
                completed_on: today,
                completed_at: now,
            },
            interval_days: chore.interval_days,
        }))
    }

    // ============================================================
    // Session operations
    // ============================================================

    pub fn get_session(&self, chat_id: i64, user_id: i64) -> Result<Option<Session>> {
        let conn = self.conn();
        let row: Option<(String, String)> = conn
            .query_row(
                "SELECT step, data FROM sessions WHERE chat_id = ? AND user_id = ?",
                (chat_id, user_id),
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let Some((step, data)) = row else {
            return Ok(None);
        };

        let step = WizardStep::from_str(&step)
            .ok_or_else(|| anyhow::anyhow!("Unknown wizard step: {}", step))?;
        let draft: ChoreDraft =
            serde_json::from_str(&data).context("Failed to decode wizard draft")?;

        Ok(Some(Session {
            chat_id,
            user_id,
            step,
            draft,
        }))
    }

    pub fn save_session(&self, session: &Session) -> Result<()> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO sessions (chat_id, user_id, step, data) VALUES (?, ?, ?, ?)
             ON CONFLICT(chat_id, user_id) DO UPDATE SET step = excluded.step, data = excluded.data",
            (
                session.chat_id,
                session.user_id,
                session.step.as_str(),
                serde_json::to_string(&session.draft)?,
            ),
        )?;
        Ok(())
    }

    pub fn clear_session(&self, chat_id: i64, user_id: i64) -> Result<bool> {
        let conn = self.conn();
        let rows = conn.execute(
            "DELETE FROM sessions WHERE chat_id = ? AND user_id = ?",
            (chat_id, user_id),
        )?;
        Ok(rows > 0)
    }

    /// Create the chore collected by a wizard and drop the wizard session,
    /// both or neither.
    pub fn finish_wizard(
        &self,
        chat_id: i64,
        user_id: i64,
        input: CreateChoreInput,
    ) -> Result<Chore> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let chore = insert_chore(&tx, input)?;
        tx.execute(
            "DELETE FROM sessions WHERE chat_id = ? AND user_id = ?",
            (chat_id, user_id),
        )?;
        tx.commit()?;

        Ok(chore)
    }

    // ============================================================
    // Completion log operations
    // ============================================================

    /// Most recent completions first.
    pub fn get_history(
        &self,
        filter: &HistoryFilter,
        today: NaiveDate,
        limit: u32,
    ) -> Result<Vec<Completion>> {
        let conn = self.conn();

        let mut sql = format!("SELECT {} FROM completions", COMPLETION_COLUMNS);
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        match filter {
            HistoryFilter::All => {}
            HistoryFilter::SinceDays(days) => {
                sql.push_str(" WHERE completed_on >= ?");
                params.push(Box::new(format_date(days_before(today, *days))));
            }
            HistoryFilter::Matching(text) => {
                sql.push_str(
                    " WHERE (instr(LOWER(completed_by), ?) > 0
                       OR instr(LOWER(chore_name), ?) > 0
                       OR instr(LOWER(assigned_to), ?) > 0)",
                );
                let needle = text.to_ascii_lowercase();
                for _ in 0..3 {
                    params.push(Box::new(needle.clone()));
                }
            }
        }

        sql.push_str(" ORDER BY completed_at DESC, id DESC LIMIT ?");
        params.push(Box::new(limit));

        let params_ref: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let mut stmt = conn.prepare(&sql)?;
        let completions = stmt
            .query_map(params_ref.as_slice(), completion_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(completions)
    }

    /// Who did what over the last `days` days, and who covered for whom.
    pub fn get_summary(&self, days: u32, today: NaiveDate) -> Result<PeriodSummary> {
        let conn = self.conn();
        let since = format_date(days_before(today, days));

        let by_completer = person_counts(
            &conn,
            "SELECT completed_by, COUNT(*) FROM completions
             WHERE completed_on >= ?
             GROUP BY completed_by
             ORDER BY COUNT(*) DESC, completed_by",
            [&since],
        )?;

        let mut stmt = conn.prepare(
            "SELECT assigned_to, completed_by, COUNT(*) FROM completions
             WHERE completed_on >= ? AND LOWER(assigned_to) != LOWER(completed_by)
             GROUP BY assigned_to, completed_by
             ORDER BY COUNT(*) DESC, assigned_to, completed_by",
        )?;
        let covers = stmt
            .query_map([&since], |row| {
                Ok(CoverCount {
                    assigned_to: row.get(0)?,
                    completed_by: row.get(1)?,
                    count: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PeriodSummary {
            days,
            by_completer,
            covers,
        })
    }

    pub fn get_lifetime_stats(&self) -> Result<LifetimeStats> {
        let conn = self.conn();

        let by_completer = person_counts(
            &conn,
            "SELECT completed_by, COUNT(*) FROM completions
             GROUP BY completed_by
             ORDER BY COUNT(*) DESC, completed_by",
            [],
        )?;

        let by_assignee = person_counts(
            &conn,
            "SELECT assigned_to, COUNT(*) FROM completions
             GROUP BY assigned_to
             ORDER BY COUNT(*) DESC, assigned_to",
            [],
        )?;

        let total_covers: i64 = conn.query_row(
            "SELECT COUNT(*) FROM completions WHERE LOWER(assigned_to) != LOWER(completed_by)",
            [],
            |row| row.get(0),
        )?;

        Ok(LifetimeStats {
            by_completer,
            by_assignee,
            total_covers,
        })
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            conn: self.conn.clone(),
        }
    }
}

fn read_household(conn: &Connection) -> Result<Household> {
    let household = conn
        .query_row(
            "SELECT person1, person2, rotate_index FROM household WHERE id = 1",
            [],
            |row| {
                Ok(Household {
                    person1: row.get(0)?,
                    person2: row.get(1)?,
                    rotate_index: row.get::<_, Option<i64>>(2)?.unwrap_or(0),
                })
            },
        )
        .optional()?;
    Ok(household.unwrap_or_default())
}

fn read_chore(conn: &Connection, id: i64) -> Result<Option<Chore>> {
    let chore = conn
        .query_row(
            &format!("SELECT {} FROM chores WHERE id = ?", CHORE_COLUMNS),
            [id],
            chore_from_row,
        )
        .optional()?;
    Ok(chore)
}

fn insert_chore(conn: &Connection, input: CreateChoreInput) -> Result<Chore> {
    conn.execute(
        "INSERT INTO chores (name, category, mode, assignee, interval_days, start_date, time)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
        (
            &input.name,
            input.category.map(|c| c.as_str()),
            input.mode.as_str(),
            &input.assignee,
            input.interval_days,
            input.start_date.map(format_date),
            format_time(input.time),
        ),
    )?;

    Ok(Chore {
        id: conn.last_insert_rowid(),
        name: input.name,
        category: input.category,
        mode: input.mode,
        assignee: input.assignee,
        interval_days: input.interval_days,
        start_date: input.start_date,
        time: input.time,
        last_done: None,
        last_reminded: None,
        skip_until: None,
    })
}

fn person_counts<P: rusqlite::Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> Result<Vec<PersonCount>> {
    let mut stmt = conn.prepare(sql)?;
    let counts = stmt
        .query_map(params, |row| {
            Ok(PersonCount {
                person: row.get(0)?,
                count: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(counts)
}

fn chore_from_row(row: &Row<'_>) -> rusqlite::Result<Chore> {
    Ok(Chore {
        id: row.get(0)?,
        name: row.get(1)?,
        category: row
            .get::<_, Option<String>>(2)?
            .as_deref()
            .and_then(Category::from_str),
        mode: AssignMode::from_str(&row.get::<_, String>(3)?).unwrap_or(AssignMode::Fixed),
        assignee: row.get(4)?,
        interval_days: row.get(5)?,
        start_date: parse_date(row.get(6)?),
        time: time_column(row, 7)?,
        last_done: parse_date(row.get(8)?),
        last_reminded: parse_date(row.get(9)?),
        skip_until: parse_date(row.get(10)?),
    })
}

fn completion_from_row(row: &Row<'_>) -> rusqlite::Result<Completion> {
    Ok(Completion {
        id: row.get(0)?,
        chore_id: row.get(1)?,
        chore_name: row.get(2)?,
        assigned_to: row.get(3)?,
        completed_by: row.get(4)?,
        completed_on: date_column(row, 5)?,
        completed_at: parse_datetime(row.get::<_, String>(6)?),
    })
}

fn date_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDate> {
    let raw: String = row.get(idx)?;
    NaiveDate::parse_from_str(&raw, DATE_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn time_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveTime> {
    let raw: String = row.get(idx)?;
    NaiveTime::parse_from_str(&raw, TIME_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M";
const LEGACY_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn format_time(time: NaiveTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_date(s: Option<String>) -> Option<NaiveDate> {
    s.and_then(|s| NaiveDate::parse_from_str(&s, DATE_FORMAT).ok())
}

/// RFC 3339, or the naive ISO timestamps older databases stored (taken as UTC).
fn parse_datetime(s: String) -> DateTime<Utc> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(&s) {
        return dt.with_timezone(&Utc);
    }
    match NaiveDateTime::parse_from_str(&s, LEGACY_TIMESTAMP_FORMAT) {
        Ok(naive) => naive.and_utc(),
        Err(_) => {
            tracing::warn!("Unreadable completion timestamp {:?}", s);
            Utc::now()
        }
    }
}

fn days_before(today: NaiveDate, days: u32) -> NaiveDate {
    today
        .checked_sub_days(Days::new(u64::from(days)))
        .unwrap_or(NaiveDate::MIN)
}
