//! Task store configuration.

/// Storage key the collection blob is written under.
pub const DEFAULT_STORAGE_KEY: &str = "tasks";
/// Title of every task reminder notification.
pub const DEFAULT_REMINDER_TITLE: &str = "Task reminder";
/// Fixed delay between task creation and its reminder.
pub const DEFAULT_REMINDER_DELAY_SECS: u64 = 5;
/// Shown once at startup when notification permission is denied.
pub const PERMISSION_DENIED_WARNING: &str =
    "Notifications are disabled. Tasks will be saved, but reminders will not be shown.";

/// Tunables for `TaskStore`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub storage_key: String,
    pub reminder_title: String,
    pub reminder_delay_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            reminder_title: DEFAULT_REMINDER_TITLE.to_string(),
            reminder_delay_secs: DEFAULT_REMINDER_DELAY_SECS,
        }
    }
}
