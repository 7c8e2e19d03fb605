//! Schema history of the task database.
//!
//! - v1 `kv_entries`: string key to string value, one row per storage key;
//!   the task list lives under a single key as a JSON array.
//! - v2 `reminders`: pending reminders keyed by handle with an absolute
//!   `due_at` in epoch milliseconds, indexed for the due-time drain.
//!
//! Pending steps run in one transaction and the reached version is written
//! to `PRAGMA user_version`. Steps are append-only.

use crate::db::{DbError, DbResult};
use log::debug;
use rusqlite::Connection;

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    /// Tables the step creates, for the migration log line.
    tables: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        tables: "kv_entries",
        sql: include_str!("0001_kv_entries.sql"),
    },
    Migration {
        version: 2,
        tables: "reminders",
        sql: include_str!("0002_reminders.sql"),
    },
];

/// Schema version this build writes.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Brings `conn` up to `latest_version`.
///
/// # Errors
/// - The file is newer than this build (`UnsupportedSchemaVersion`).
/// - A step fails; the whole upgrade rolls back.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let current_version = current_user_version(conn)?;
    let latest = latest_version();

    if current_version > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: current_version,
            latest_supported: latest,
        });
    }

    if current_version == latest {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for migration in MIGRATIONS {
        if migration.version <= current_version {
            continue;
        }

        tx.execute_batch(migration.sql)?;
        tx.execute_batch(&format!("PRAGMA user_version = {};", migration.version))?;
        debug!(
            "event=db_migrate module=db status=applied version={} tables={}",
            migration.version, migration.tables
        );
    }
    tx.commit()?;

    Ok(())
}

fn current_user_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}
