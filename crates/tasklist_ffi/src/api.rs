//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose the task list operations to Dart via FRB.
//! - Own the single process-wide `TaskStore` for the running app.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Functions that lock the session are async on the Dart side; only
//!   stateless calls are `sync`, so a slow load or save never blocks the UI
//!   isolate.
//! - Every mutation returns the full, freshly ordered list for re-render.
//! - Task ids cross the boundary as UUID strings, priorities as
//!   `low|medium|high`.

use log::{info, warn};
use once_cell::sync::OnceCell;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock, PoisonError};
use tasklist_core::reminder::sqlite_scheduler::now_epoch_ms;
use tasklist_core::{
    core_version as core_version_inner, init_logging as init_logging_inner,
    NotificationPermission, Priority, SqliteKeyValueStore, SqliteReminderScheduler, Task, TaskId,
    TaskStore,
};
use uuid::Uuid;

const DB_FILE_NAME: &str = "tasklist.sqlite3";
const DB_PATH_ENV: &str = "TASKLIST_DB_PATH";

type SessionStore = TaskStore<SqliteKeyValueStore, SqliteReminderScheduler>;

static DB_PATH: OnceLock<PathBuf> = OnceLock::new();
static SESSION: OnceCell<Mutex<SessionStore>> = OnceCell::new();

/// Minimal health-check API for FRB smoke integration.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    tasklist_core::ping().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// # FFI contract
/// - `level`: `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory for rolling logs.
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Pins the database file used by the task session.
///
/// Must be called before the first task call to take effect. Returns empty
/// string on success, or an error message when a different path is already
/// in use.
#[flutter_rust_bridge::frb(sync)]
pub fn configure_db_path(path: String) -> String {
    let requested = PathBuf::from(path.trim());
    if requested.as_os_str().is_empty() {
        return "db path cannot be empty".to_string();
    }
    let active = DB_PATH.get_or_init(|| requested.clone());
    if *active == requested {
        String::new()
    } else {
        format!(
            "db path already set to `{}`; refusing to switch to `{}`",
            active.display(),
            requested.display()
        )
    }
}

/// One row of the task list as rendered by Flutter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskItem {
    pub id: String,
    pub text: String,
    pub completed: bool,
    /// `low|medium|high`.
    pub priority: String,
    pub has_reminder: bool,
    pub editing: bool,
}

/// Envelope returned by every task call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskActionResponse {
    /// Whether the operation changed anything.
    pub ok: bool,
    /// Addressed or created task id.
    pub task_id: Option<String>,
    /// Human-readable response message for diagnostics.
    pub message: String,
    /// Current list in display order.
    pub tasks: Vec<TaskItem>,
    /// Shared inline edit buffer.
    pub edit_buffer: String,
}

impl TaskActionResponse {
    fn from_store(
        store: &SessionStore,
        ok: bool,
        task_id: Option<TaskId>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            ok,
            task_id: task_id.map(|id| id.to_string()),
            message: message.into(),
            tasks: store.tasks().iter().map(to_task_item).collect(),
            edit_buffer: store.edit_buffer().to_string(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            task_id: None,
            message: message.into(),
            tasks: Vec::new(),
            edit_buffer: String::new(),
        }
    }
}

/// Reminder due for delivery as an OS notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DueReminderItem {
    pub handle: String,
    pub title: String,
    pub body: String,
    pub due_at_ms: i64,
}

/// Reloads tasks from storage, replacing the session state.
pub fn tasks_load() -> TaskActionResponse {
    with_session(|store| {
        let count = store.load();
        TaskActionResponse::from_store(store, true, None, format!("Loaded {count} task(s)."))
    })
    .unwrap_or_else(TaskActionResponse::failure)
}

/// Returns the current list without touching storage.
pub fn tasks_list() -> TaskActionResponse {
    with_session(|store| TaskActionResponse::from_store(store, true, None, ""))
        .unwrap_or_else(TaskActionResponse::failure)
}

/// Adds a task. Blank text returns `ok=false` and leaves the list unchanged.
pub fn task_add(text: String) -> TaskActionResponse {
    with_session(|store| match store.add(&text) {
        Some(id) => TaskActionResponse::from_store(store, true, Some(id), "Task added."),
        None => TaskActionResponse::from_store(store, false, None, "Task text is empty."),
    })
    .unwrap_or_else(TaskActionResponse::failure)
}

/// Toggles inline editing for one task. UI-only; nothing is persisted.
pub fn task_set_editing(task_id: String, initial_text: String) -> TaskActionResponse {
    with_task(&task_id, |store, id| {
        let ok = store.set_editing(id, &initial_text);
        TaskActionResponse::from_store(store, ok, Some(id), not_found_message(ok))
    })
}

/// Commits inline edit text.
pub fn task_commit_edit(task_id: String, text: String) -> TaskActionResponse {
    with_task(&task_id, |store, id| {
        let ok = store.commit_edit(id, &text);
        let message = if ok {
            "Task updated."
        } else if store.task(id).is_some() {
            "Task text is empty."
        } else {
            "Task not found."
        };
        TaskActionResponse::from_store(store, ok, Some(id), message)
    })
}

/// Sets priority from `low|medium|high`.
pub fn task_set_priority(task_id: String, priority: String) -> TaskActionResponse {
    let Some(priority) = Priority::parse(&priority) else {
        return TaskActionResponse::failure(format!("unsupported priority `{priority}`"));
    };
    with_task(&task_id, |store, id| {
        let ok = store.set_priority(id, priority);
        TaskActionResponse::from_store(store, ok, Some(id), not_found_message(ok))
    })
}

/// Advances priority along `low -> medium -> high -> low`.
pub fn task_cycle_priority(task_id: String) -> TaskActionResponse {
    with_task(&task_id, |store, id| {
        let ok = store.cycle_priority(id).is_some();
        TaskActionResponse::from_store(store, ok, Some(id), not_found_message(ok))
    })
}

/// Flips completion of one task.
pub fn task_toggle_completed(task_id: String) -> TaskActionResponse {
    with_task(&task_id, |store, id| {
        let ok = store.toggle_completed(id).is_some();
        TaskActionResponse::from_store(store, ok, Some(id), not_found_message(ok))
    })
}

/// Deletes one task and cancels its reminder.
pub fn task_remove(task_id: String) -> TaskActionResponse {
    with_task(&task_id, |store, id| {
        let ok = store.remove(id).is_some();
        let message = if ok { "Task removed." } else { "Task not found." };
        TaskActionResponse::from_store(store, ok, Some(id), message)
    })
}

/// Records the host notification permission (`granted|denied|undetermined`).
///
/// Returns empty string on success and error message on failure.
pub fn notification_set_permission(permission: String) -> String {
    let Some(parsed) = NotificationPermission::parse(&permission) else {
        return format!("unsupported permission `{}`", permission.trim());
    };
    match with_session(|store| store.scheduler().set_permission(parsed)) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// One-shot permission warning for the startup banner.
pub fn startup_warning() -> Option<String> {
    with_session(|store| store.startup_warning().map(str::to_owned))
        .ok()
        .flatten()
}

/// Drains reminders whose delay has elapsed so the host can post them.
///
/// The delivered reminders' handles are cleared from their tasks.
pub fn reminders_take_due() -> Vec<DueReminderItem> {
    let result = with_session(|store| store.take_due_reminders(now_epoch_ms()));
    match result {
        Ok(Ok(due)) => due
            .into_iter()
            .map(|reminder| DueReminderItem {
                handle: reminder.handle.to_string(),
                title: reminder.title,
                body: reminder.body,
                due_at_ms: reminder.due_at_ms,
            })
            .collect(),
        Ok(Err(err)) => {
            warn!("event=reminders_take_due module=ffi status=error error={err}");
            Vec::new()
        }
        Err(err) => {
            warn!("event=reminders_take_due module=ffi status=error error={err}");
            Vec::new()
        }
    }
}

fn not_found_message(ok: bool) -> &'static str {
    if ok {
        "OK."
    } else {
        "Task not found."
    }
}

fn to_task_item(task: &Task) -> TaskItem {
    TaskItem {
        id: task.id.to_string(),
        text: task.text.clone(),
        completed: task.completed,
        priority: task.priority.as_str().to_string(),
        has_reminder: task.reminder_handle.is_some(),
        editing: task.editing,
    }
}

fn resolve_db_path() -> PathBuf {
    DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var(DB_PATH_ENV) {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(DB_FILE_NAME)
        })
        .clone()
}

fn open_session() -> Result<Mutex<SessionStore>, String> {
    let db_path = resolve_db_path();
    let storage = SqliteKeyValueStore::open(&db_path).or_else(|err| {
        warn!(
            "event=session_open module=ffi status=degraded store=kv fallback=memory error={}",
            err
        );
        SqliteKeyValueStore::open_in_memory()
    });
    let storage = storage.map_err(|err| format!("task storage open failed: {err}"))?;

    let scheduler = SqliteReminderScheduler::open(&db_path).or_else(|err| {
        warn!(
            "event=session_open module=ffi status=degraded store=reminders fallback=memory error={}",
            err
        );
        SqliteReminderScheduler::open_in_memory()
    });
    let scheduler = scheduler.map_err(|err| format!("reminder scheduler open failed: {err}"))?;

    let mut store = TaskStore::new(storage, scheduler);
    let count = store.load();
    info!("event=session_open module=ffi status=ok tasks={count}");
    Ok(Mutex::new(store))
}

fn with_session<T>(f: impl FnOnce(&mut SessionStore) -> T) -> Result<T, String> {
    let session = SESSION.get_or_try_init(open_session)?;
    let mut store = session.lock().unwrap_or_else(PoisonError::into_inner);
    Ok(f(&mut store))
}

fn with_task(
    task_id: &str,
    f: impl FnOnce(&mut SessionStore, TaskId) -> TaskActionResponse,
) -> TaskActionResponse {
    let Ok(id) = Uuid::parse_str(task_id.trim()) else {
        return TaskActionResponse::failure(format!("invalid task id `{}`", task_id.trim()));
    };
    with_session(|store| f(store, id)).unwrap_or_else(TaskActionResponse::failure)
}

#[cfg(test)]
mod tests {
    use super::{
        configure_db_path, core_version, init_logging, notification_set_permission, ping,
        reminders_take_due, startup_warning, task_add, task_commit_edit, task_cycle_priority,
        task_remove, task_set_editing, task_set_priority, task_toggle_completed, tasks_list,
    };
    use std::sync::Once;

    static SESSION_PATH: Once = Once::new();

    fn use_temp_session() {
        SESSION_PATH.call_once(|| {
            let dir = std::env::temp_dir().join(format!("tasklist-ffi-{}", uuid::Uuid::new_v4()));
            std::fs::create_dir_all(&dir).expect("create temp dir");
            let error = configure_db_path(dir.join("tasks.sqlite3").display().to_string());
            assert!(error.is_empty(), "{error}");
        });
    }

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        let error = init_logging("info".to_string(), String::new());
        assert!(!error.is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let error = init_logging("verbose".to_string(), "tmp/logs".to_string());
        assert!(!error.is_empty());
    }

    #[test]
    fn task_add_rejects_blank_text() {
        use_temp_session();
        let response = task_add("   ".to_string());
        assert!(!response.ok);
        assert!(response.task_id.is_none());
    }

    #[test]
    fn task_lifecycle_through_ffi() {
        use_temp_session();
        let added = task_add("ffi lifecycle".to_string());
        assert!(added.ok, "{}", added.message);
        let id = added.task_id.clone().expect("created task id");
        let item = added
            .tasks
            .iter()
            .find(|item| item.id == id)
            .expect("new task listed");
        assert_eq!(item.priority, "medium");
        assert!(!item.completed);

        let cycled = task_cycle_priority(id.clone());
        let item = cycled.tasks.iter().find(|item| item.id == id).expect("listed");
        assert_eq!(item.priority, "high");

        let editing = task_set_editing(id.clone(), "ffi lifecycle".to_string());
        assert!(editing.ok);
        assert_eq!(editing.edit_buffer, "ffi lifecycle");

        let edited = task_commit_edit(id.clone(), " renamed ".to_string());
        let item = edited.tasks.iter().find(|item| item.id == id).expect("listed");
        assert_eq!(item.text, "renamed");
        assert!(!item.editing);

        let toggled = task_toggle_completed(id.clone());
        let item = toggled.tasks.iter().find(|item| item.id == id).expect("listed");
        assert!(item.completed);
        assert!(!item.has_reminder);

        let removed = task_remove(id.clone());
        assert!(removed.ok);
        assert!(tasks_list().tasks.iter().all(|item| item.id != id));
    }

    #[test]
    fn invalid_inputs_return_failure_envelopes() {
        use_temp_session();
        assert!(!task_remove("not-a-uuid".to_string()).ok);
        assert!(!task_set_priority(uuid::Uuid::new_v4().to_string(), "urgent".to_string()).ok);
        assert!(!task_toggle_completed(uuid::Uuid::new_v4().to_string()).ok);
        assert!(!notification_set_permission("maybe".to_string()).is_empty());
    }

    #[test]
    fn denied_permission_warns_once() {
        use_temp_session();
        assert!(notification_set_permission("denied".to_string()).is_empty());
        let first = startup_warning();
        let second = startup_warning();
        assert!(notification_set_permission("granted".to_string()).is_empty());

        assert!(first.is_some());
        assert!(second.is_none());
    }

    #[test]
    fn reminders_take_due_keeps_fresh_reminders_pending() {
        use_temp_session();
        let added = task_add("not yet due".to_string());
        let id = added.task_id.clone().expect("created task id");

        let due = reminders_take_due();

        assert!(due.iter().all(|reminder| reminder.body != "not yet due"));
        assert!(task_remove(id).ok);
    }
}
