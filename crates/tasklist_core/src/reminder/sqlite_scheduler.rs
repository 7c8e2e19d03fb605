//! SQLite-backed pending reminder queue.
//!
//! # Responsibility
//! - Persist scheduled reminders with an absolute due time.
//! - Hand due reminders to the host exactly once via `take_due`.
//!
//! # Invariants
//! - Rows are deleted on cancel and on delivery; a handle never fires twice.
//! - Permission is host-reported state and is not persisted.

use super::{
    NotificationPermission, ReminderError, ReminderHandle, ReminderResult, ReminderScheduler,
};
use crate::db::{open_db, open_db_in_memory, DbResult};
use log::{debug, info};
use rusqlite::{params, Connection};
use std::cell::Cell;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Reminder whose due time has passed, ready to be posted by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DueReminder {
    pub handle: ReminderHandle,
    pub title: String,
    pub body: String,
    /// Unix epoch milliseconds.
    pub due_at_ms: i64,
}

/// Reminder scheduler over the `reminders` table.
pub struct SqliteReminderScheduler {
    conn: Connection,
    permission: Cell<NotificationPermission>,
}

impl SqliteReminderScheduler {
    /// Wraps a connection that already went through `open_db`.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn,
            permission: Cell::new(NotificationPermission::default()),
        }
    }

    pub fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        Ok(Self::new(open_db(path)?))
    }

    pub fn open_in_memory() -> DbResult<Self> {
        Ok(Self::new(open_db_in_memory()?))
    }

    /// Records the permission state reported by the host.
    pub fn set_permission(&self, permission: NotificationPermission) {
        info!(
            "event=notification_permission module=reminder status=ok permission={}",
            permission.as_str()
        );
        self.permission.set(permission);
    }

    /// Number of reminders not yet delivered or cancelled.
    pub fn pending_count(&self) -> ReminderResult<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM reminders;", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    /// Schedules with an explicit clock reading.
    pub fn schedule_at(
        &self,
        title: &str,
        body: &str,
        delay_seconds: u64,
        now_ms: i64,
    ) -> ReminderResult<ReminderHandle> {
        if self.permission.get() == NotificationPermission::Denied {
            return Err(ReminderError::PermissionDenied);
        }

        let delay_ms = i64::try_from(delay_seconds.saturating_mul(1000)).unwrap_or(i64::MAX);
        let due_at = now_ms.saturating_add(delay_ms);
        let handle = ReminderHandle::new(Uuid::new_v4().to_string());
        self.conn.execute(
            "INSERT INTO reminders (handle, title, body, due_at) VALUES (?1, ?2, ?3, ?4);",
            params![handle.as_str(), title, body, due_at],
        )?;
        debug!(
            "event=reminder_schedule module=reminder status=ok handle={} due_at={}",
            handle, due_at
        );
        Ok(handle)
    }

    /// Removes and returns every reminder due at or before `now_ms`, oldest first.
    ///
    /// Only the returned rows are deleted, inside one transaction, so a
    /// reminder written by another connection is never dropped undelivered.
    pub fn take_due(&self, now_ms: i64) -> ReminderResult<Vec<DueReminder>> {
        let tx = self.conn.unchecked_transaction()?;
        let due = {
            let mut select = tx.prepare(
                "SELECT handle, title, body, due_at
                 FROM reminders
                 WHERE due_at <= ?1
                 ORDER BY due_at ASC, handle ASC;",
            )?;
            let rows = select
                .query_map([now_ms], |row| {
                    Ok(DueReminder {
                        handle: ReminderHandle::new(row.get::<_, String>(0)?),
                        title: row.get(1)?,
                        body: row.get(2)?,
                        due_at_ms: row.get(3)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        };

        if !due.is_empty() {
            let mut delete = tx.prepare("DELETE FROM reminders WHERE handle = ?1;")?;
            for reminder in &due {
                delete.execute([reminder.handle.as_str()])?;
            }
        }
        tx.commit()?;

        if !due.is_empty() {
            debug!(
                "event=reminder_take_due module=reminder status=ok count={}",
                due.len()
            );
        }
        Ok(due)
    }
}

impl ReminderScheduler for SqliteReminderScheduler {
    fn schedule(
        &self,
        title: &str,
        body: &str,
        delay_seconds: u64,
    ) -> ReminderResult<ReminderHandle> {
        self.schedule_at(title, body, delay_seconds, now_epoch_ms())
    }

    fn cancel(&self, handle: &ReminderHandle) -> ReminderResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM reminders WHERE handle = ?1;", [handle.as_str()])?;
        if changed == 0 {
            return Err(ReminderError::NotFound(handle.clone()));
        }
        debug!("event=reminder_cancel module=reminder status=ok handle={handle}");
        Ok(())
    }

    fn permission(&self) -> NotificationPermission {
        self.permission.get()
    }
}

/// Current wall clock in Unix epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or_default()
}
