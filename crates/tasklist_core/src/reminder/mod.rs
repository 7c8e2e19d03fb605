//! Reminder scheduler gateway.
//!
//! # Responsibility
//! - Define the one-shot local reminder contract used by the task store.
//! - Provide a SQLite-backed pending queue the host drains into OS
//!   notifications, and an in-memory scheduler.
//!
//! # Invariants
//! - A handle identifies at most one pending reminder.
//! - Cancelling removes a reminder before it is delivered; delivered or
//!   unknown handles fail with `NotFound`.

use crate::db::DbError;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod memory;
pub mod sqlite_scheduler;

pub use memory::{MemoryReminderScheduler, ScheduledReminder};
pub use sqlite_scheduler::{DueReminder, SqliteReminderScheduler};

pub type ReminderResult<T> = Result<T, ReminderError>;

/// Opaque handle of a scheduled, not-yet-delivered reminder.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReminderHandle(String);

impl ReminderHandle {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ReminderHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Host notification permission as reported at startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NotificationPermission {
    Granted,
    Denied,
    #[default]
    Undetermined,
}

impl NotificationPermission {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Granted => "granted",
            Self::Denied => "denied",
            Self::Undetermined => "undetermined",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "granted" => Some(Self::Granted),
            "denied" => Some(Self::Denied),
            "undetermined" => Some(Self::Undetermined),
            _ => None,
        }
    }
}

/// Reminder scheduling or cancellation failure.
#[derive(Debug)]
pub enum ReminderError {
    PermissionDenied,
    NotFound(ReminderHandle),
    Db(DbError),
    Unavailable(String),
}

impl Display for ReminderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PermissionDenied => write!(f, "notification permission denied"),
            Self::NotFound(handle) => write!(f, "reminder not found: {handle}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Unavailable(message) => write!(f, "reminder scheduler unavailable: {message}"),
        }
    }
}

impl Error for ReminderError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for ReminderError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for ReminderError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// One-shot local reminder scheduling.
pub trait ReminderScheduler {
    /// Schedules a reminder `delay_seconds` from now and returns its handle.
    fn schedule(&self, title: &str, body: &str, delay_seconds: u64)
        -> ReminderResult<ReminderHandle>;
    /// Cancels a pending reminder.
    fn cancel(&self, handle: &ReminderHandle) -> ReminderResult<()>;
    fn permission(&self) -> NotificationPermission;
}

impl<T: ReminderScheduler + ?Sized> ReminderScheduler for &T {
    fn schedule(
        &self,
        title: &str,
        body: &str,
        delay_seconds: u64,
    ) -> ReminderResult<ReminderHandle> {
        (**self).schedule(title, body, delay_seconds)
    }

    fn cancel(&self, handle: &ReminderHandle) -> ReminderResult<()> {
        (**self).cancel(handle)
    }

    fn permission(&self) -> NotificationPermission {
        (**self).permission()
    }
}
