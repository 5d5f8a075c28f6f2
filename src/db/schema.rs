use anyhow::{Context, Result};
use rusqlite::Connection;

struct Migration {
    version: &'static str,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: "001",
        name: "initial",
        sql: include_str!("migrations/001_initial.sql"),
    },
    Migration {
        version: "002",
        name: "chore_category_start",
        sql: include_str!("migrations/002_chore_category_start.sql"),
    },
    Migration {
        version: "003",
        name: "household_last_digest",
        sql: include_str!("migrations/003_household_last_digest.sql"),
    },
];

pub fn run_migrations(conn: &Connection) -> Result<()> {
    // Create migrations tracking table
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL
        )",
    )
    .context("Failed to create schema_migrations table")?;

    baseline_legacy_database(conn)?;

    let applied = get_applied_migrations(conn)?;

    for migration in MIGRATIONS {
        if !applied.iter().any(|v| v == migration.version) {
            apply_migration(conn, migration)?;
        }
    }

    ensure_household_row(conn)?;

    Ok(())
}

/// Databases written before version tracking already have the chore tables,
/// and usually the category/start date columns as well.
fn baseline_legacy_database(conn: &Connection) -> Result<()> {
    let migration_count: i32 =
        conn.query_row("SELECT COUNT(*) FROM schema_migrations", [], |row| {
            row.get(0)
        })?;

    if migration_count > 0 {
        return Ok(());
    }

    let chores_exist: i32 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='chores'",
        [],
        |row| row.get(0),
    )?;

    if chores_exist == 0 {
        return Ok(());
    }

    mark_migration_applied(conn, "001", "initial")?;
    tracing::info!("Detected existing database, marked migration 001 as applied");

    // Older revisions added these columns one at a time, so either may be missing.
    let columns = table_columns(conn, "chores")?;
    for column in ["category", "start_date"] {
        if !columns.iter().any(|c| c == column) {
            conn.execute_batch(&format!("ALTER TABLE chores ADD COLUMN {} TEXT", column))
                .with_context(|| format!("Failed to add chores.{} to existing database", column))?;
            tracing::info!("Added missing chores.{} column", column);
        }
    }
    mark_migration_applied(conn, "002", "chore_category_start")?;
    tracing::info!("Existing chores table has category and start_date, marked migration 002 as applied");

    Ok(())
}

fn table_columns(conn: &Connection, table: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let columns = stmt
        .query_map([], |row| row.get(1))?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(columns)
}

fn ensure_household_row(conn: &Connection) -> Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO household (id, person1, person2, rotate_index) VALUES (1, NULL, NULL, 0)",
        [],
    )
    .context("Failed to create household row")?;
    Ok(())
}

fn get_applied_migrations(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT version FROM schema_migrations ORDER BY version")?;
    let versions = stmt
        .query_map([], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(versions)
}

fn mark_migration_applied(conn: &Connection, version: &str, name: &str) -> Result<()> {
    let now = chrono::Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO schema_migrations (version, name, applied_at) VALUES (?, ?, ?)",
        (version, name, &now),
    )?;
    Ok(())
}

fn apply_migration(conn: &Connection, migration: &Migration) -> Result<()> {
    tracing::info!(
        "Applying migration {}: {}",
        migration.version,
        migration.name
    );

    conn.execute_batch(&format!("BEGIN TRANSACTION; {} COMMIT;", migration.sql))
        .with_context(|| {
            format!(
                "Failed to apply migration {}: {}",
                migration.version, migration.name
            )
        })?;

    mark_migration_applied(conn, migration.version, migration.name)?;

    tracing::info!("Migration {} applied successfully", migration.version);
    Ok(())
}
