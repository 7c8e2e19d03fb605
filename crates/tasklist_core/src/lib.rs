//! Core domain logic for the task list app.
//! This crate is the single source of truth for task lifecycle invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod reminder;
pub mod service;
pub mod storage;

pub use config::StoreConfig;
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::task::{Priority, Task, TaskId, TaskValidationError};
pub use reminder::{
    DueReminder, MemoryReminderScheduler, NotificationPermission, ReminderError, ReminderHandle,
    ReminderResult, ReminderScheduler, SqliteReminderScheduler,
};
pub use service::task_store::TaskStore;
pub use storage::{
    KeyValueStore, MemoryKeyValueStore, SqliteKeyValueStore, StorageError, StorageResult,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
