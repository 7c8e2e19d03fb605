use tasklist_core::config::{DEFAULT_STORAGE_KEY, PERMISSION_DENIED_WARNING};
use tasklist_core::storage::{decode_tasks, encode_tasks};
use tasklist_core::{
    KeyValueStore, MemoryKeyValueStore, MemoryReminderScheduler, NotificationPermission, Priority,
    ReminderScheduler, SqliteKeyValueStore, SqliteReminderScheduler, StoreConfig, TaskStore,
};
use uuid::Uuid;

fn memory_store() -> TaskStore<MemoryKeyValueStore, MemoryReminderScheduler> {
    TaskStore::new(
        MemoryKeyValueStore::new(),
        MemoryReminderScheduler::default(),
    )
}

fn persisted<R: ReminderScheduler>(
    store: &TaskStore<MemoryKeyValueStore, R>,
) -> Vec<tasklist_core::Task> {
    let blob = store
        .storage()
        .raw(DEFAULT_STORAGE_KEY)
        .expect("collection should be persisted");
    decode_tasks(&blob).unwrap()
}

#[test]
fn add_toggle_remove_scenario() {
    let mut store = memory_store();

    let id = store.add("Buy milk").unwrap();
    assert_eq!(store.len(), 1);
    let task = store.task(id).unwrap();
    assert_eq!(task.text, "Buy milk");
    assert!(!task.completed);
    assert_eq!(task.priority, Priority::Medium);

    assert_eq!(store.toggle_completed(id), Some(true));
    assert!(store.task(id).unwrap().completed);

    let removed = store.remove(id).unwrap();
    assert_eq!(removed.id, id);
    assert!(store.is_empty());
    assert!(persisted(&store).is_empty());
}

#[test]
fn blank_add_leaves_collection_unchanged() {
    let mut store = memory_store();
    assert_eq!(store.add("  "), None);
    assert_eq!(store.add(""), None);
    assert_eq!(store.add("\n\t"), None);
    assert_eq!(store.len(), 0);
}

#[test]
fn set_priority_then_cycle_wraps_to_low() {
    let mut store = memory_store();
    let a = store.add("A").unwrap();
    let b = store.add("B").unwrap();

    assert!(store.set_priority(a, Priority::High));
    assert_eq!(store.cycle_priority(a), Some(Priority::Low));
    assert_eq!(store.task(a).unwrap().priority, Priority::Low);
    assert_eq!(store.task(b).unwrap().priority, Priority::Medium);
    assert_eq!(persisted(&store)[0].priority, Priority::Low);
}

#[test]
fn insertion_order_is_display_order() {
    let mut store = memory_store();
    let ids: Vec<_> = ["one", "two", "three"]
        .into_iter()
        .map(|text| store.add(text).unwrap())
        .collect();

    let listed: Vec<_> = store.tasks().iter().map(|task| task.id).collect();
    assert_eq!(listed, ids);

    store.remove(ids[1]).unwrap();
    let texts: Vec<_> = store.tasks().iter().map(|task| task.text.as_str()).collect();
    assert_eq!(texts, ["one", "three"]);
}

#[test]
fn completing_cancels_reminder_and_clears_handle() {
    let mut store = memory_store();
    let id = store.add("call dentist").unwrap();
    let handle = store.task(id).unwrap().reminder_handle.clone().unwrap();

    store.toggle_completed(id).unwrap();

    assert_eq!(store.scheduler().cancelled(), vec![handle]);
    assert!(store.task(id).unwrap().reminder_handle.is_none());
    assert!(persisted(&store)[0].reminder_handle.is_none());

    // Reopening does not reschedule.
    assert_eq!(store.toggle_completed(id), Some(false));
    assert!(store.task(id).unwrap().reminder_handle.is_none());
    assert!(store.scheduler().pending().is_empty());
}

#[test]
fn remove_cancels_outstanding_reminder() {
    let mut store = memory_store();
    let keep = store.add("keep").unwrap();
    let drop_id = store.add("drop").unwrap();
    let handle = store.task(drop_id).unwrap().reminder_handle.clone().unwrap();

    store.remove(drop_id).unwrap();

    assert_eq!(store.scheduler().cancelled(), vec![handle]);
    assert_eq!(store.scheduler().pending().len(), 1);
    assert!(store.task(keep).is_some());
}

#[test]
fn unknown_ids_are_no_ops() {
    let mut store = memory_store();
    store.add("only").unwrap();
    let writes = store.storage().write_count();
    let missing = Uuid::new_v4();

    assert_eq!(store.remove(missing), None);
    assert_eq!(store.toggle_completed(missing), None);
    assert_eq!(store.cycle_priority(missing), None);
    assert!(!store.set_priority(missing, Priority::High));
    assert!(!store.commit_edit(missing, "text"));
    assert!(!store.set_editing(missing, "text"));

    assert_eq!(store.len(), 1);
    assert_eq!(store.storage().write_count(), writes);
}

#[test]
fn editing_is_exclusive_and_toggles() {
    let mut store = memory_store();
    let a = store.add("a").unwrap();
    let b = store.add("b").unwrap();

    assert!(store.set_editing(a, "a"));
    assert_eq!(store.editing_task().map(|task| task.id), Some(a));

    assert!(store.set_editing(b, "b"));
    assert_eq!(store.editing_task().map(|task| task.id), Some(b));
    assert!(!store.task(a).unwrap().editing);
    assert_eq!(store.edit_buffer(), "b");

    assert!(store.set_editing(b, "b"));
    assert!(store.editing_task().is_none());
}

#[test]
fn commit_edit_trims_and_leaves_editing_mode() {
    let mut store = memory_store();
    let id = store.add("draft").unwrap();
    store.set_editing(id, "draft");

    assert!(!store.commit_edit(id, "   "));
    assert_eq!(store.task(id).unwrap().text, "draft");
    assert!(store.task(id).unwrap().editing);

    assert!(store.commit_edit(id, "  final  "));
    let task = store.task(id).unwrap();
    assert_eq!(task.text, "final");
    assert!(!task.editing);
    assert_eq!(persisted(&store)[0].text, "final");
}

#[test]
fn schedule_failure_still_creates_task() {
    let mut store = memory_store();
    store.scheduler().set_fail_schedule(true);

    let id = store.add("no reminder").unwrap();

    assert_eq!(store.len(), 1);
    assert!(store.task(id).unwrap().reminder_handle.is_none());
}

#[test]
fn cancel_failure_does_not_block_mutation() {
    let mut store = memory_store();
    let id = store.add("stubborn").unwrap();
    store.scheduler().set_fail_cancel(true);

    assert_eq!(store.toggle_completed(id), Some(true));
    assert!(store.task(id).unwrap().reminder_handle.is_none());

    let other = store.add("also stubborn").unwrap();
    assert!(store.remove(other).is_some());
    assert_eq!(store.len(), 1);
}

#[test]
fn write_failure_keeps_in_memory_state() {
    let mut store = memory_store();
    store.add("saved").unwrap();
    store.storage().set_fail_writes(true);

    let id = store.add("unsaved").unwrap();

    assert_eq!(store.len(), 2);
    assert!(store.task(id).is_some());
    assert_eq!(persisted(&store).len(), 1);

    store.storage().set_fail_writes(false);
    store.toggle_completed(id).unwrap();
    assert_eq!(persisted(&store).len(), 2);
}

#[test]
fn load_fails_soft_on_read_error_and_corrupt_blob() {
    let storage = MemoryKeyValueStore::new();
    storage.set(DEFAULT_STORAGE_KEY, "{not json").unwrap();
    let mut store = TaskStore::new(&storage, MemoryReminderScheduler::default());
    assert_eq!(store.load(), 0);
    assert!(store.is_empty());

    storage.set_fail_reads(true);
    assert_eq!(store.load(), 0);
    assert!(store.is_empty());
}

#[test]
fn load_on_first_run_is_empty() {
    let mut store = memory_store();
    assert_eq!(store.load(), 0);
    assert!(store.is_empty());
}

#[test]
fn reload_reproduces_collection_without_editing_flags() {
    let storage = MemoryKeyValueStore::new();
    let scheduler = MemoryReminderScheduler::default();

    let mut first = TaskStore::new(&storage, &scheduler);
    let a = first.add("alpha").unwrap();
    let b = first.add("beta").unwrap();
    first.set_priority(a, Priority::High);
    first.toggle_completed(b);
    first.set_editing(a, "alpha");
    let expected = first.tasks().to_vec();

    let mut second = TaskStore::new(&storage, &scheduler);
    assert_eq!(second.load(), 2);
    assert_eq!(second.tasks().len(), expected.len());
    for (loaded, original) in second.tasks().iter().zip(&expected) {
        assert!(loaded.same_persisted(original));
        assert!(!loaded.editing);
    }
}

#[test]
fn custom_config_controls_key_and_reminder() {
    let config = StoreConfig {
        storage_key: "todo-v1".to_string(),
        reminder_title: "Heads up".to_string(),
        reminder_delay_secs: 30,
    };
    let mut store = TaskStore::with_config(
        MemoryKeyValueStore::new(),
        MemoryReminderScheduler::default(),
        config,
    );

    store.add("configured").unwrap();

    assert!(store.storage().raw("todo-v1").is_some());
    assert!(store.storage().raw(DEFAULT_STORAGE_KEY).is_none());
    let pending = store.scheduler().pending();
    assert_eq!(pending[0].title, "Heads up");
    assert_eq!(pending[0].delay_seconds, 30);
}

#[test]
fn startup_warning_is_shown_once_when_permission_denied() {
    let mut store = TaskStore::new(
        MemoryKeyValueStore::new(),
        MemoryReminderScheduler::new(NotificationPermission::Denied),
    );

    assert_eq!(store.startup_warning(), Some(PERMISSION_DENIED_WARNING));
    assert_eq!(store.startup_warning(), None);

    let id = store.add("still works").unwrap();
    assert!(store.task(id).unwrap().reminder_handle.is_none());
}

#[test]
fn startup_warning_is_silent_when_permission_granted() {
    let mut store = memory_store();
    assert_eq!(store.startup_warning(), None);
}

#[test]
fn sqlite_gateways_persist_across_sessions() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tasks.sqlite3");

    let (id, handle) = {
        let mut store = TaskStore::new(
            SqliteKeyValueStore::open(&path).unwrap(),
            SqliteReminderScheduler::open(&path).unwrap(),
        );
        store.load();
        let id = store.add("persisted").unwrap();
        store.set_priority(id, Priority::Low);
        let handle = store.task(id).unwrap().reminder_handle.clone().unwrap();
        (id, handle)
    };

    let mut store = TaskStore::new(
        SqliteKeyValueStore::open(&path).unwrap(),
        SqliteReminderScheduler::open(&path).unwrap(),
    );
    assert_eq!(store.load(), 1);
    let task = store.task(id).unwrap();
    assert_eq!(task.text, "persisted");
    assert_eq!(task.priority, Priority::Low);
    assert_eq!(task.reminder_handle.as_ref(), Some(&handle));
    assert_eq!(store.scheduler().pending_count().unwrap(), 1);

    store.remove(id).unwrap();
    assert_eq!(store.scheduler().pending_count().unwrap(), 0);
}

#[test]
fn delivered_reminder_clears_task_handle() {
    let mut store = TaskStore::new(
        SqliteKeyValueStore::open_in_memory().unwrap(),
        SqliteReminderScheduler::open_in_memory().unwrap(),
    );
    let delivered = store.add("water plants").unwrap();
    let handle = store.task(delivered).unwrap().reminder_handle.clone().unwrap();
    store.scheduler().set_permission(NotificationPermission::Denied);
    let silent = store.add("no reminder").unwrap();

    let due = store.take_due_reminders(i64::MAX).unwrap();

    assert_eq!(due.len(), 1);
    assert_eq!(due[0].handle, handle);
    assert_eq!(due[0].body, "water plants");
    assert!(store.task(delivered).unwrap().reminder_handle.is_none());
    assert!(store.task(silent).unwrap().reminder_handle.is_none());
    assert_eq!(store.scheduler().pending_count().unwrap(), 0);

    let blob = store.storage().get(DEFAULT_STORAGE_KEY).unwrap().unwrap();
    assert!(decode_tasks(&blob)
        .unwrap()
        .iter()
        .all(|task| task.reminder_handle.is_none()));

    // Nothing left to cancel once the reminder has fired.
    assert_eq!(store.toggle_completed(delivered), Some(true));
    assert!(store.remove(delivered).is_some());
    assert!(store.take_due_reminders(i64::MAX).unwrap().is_empty());
}

#[test]
fn take_due_reminders_keeps_handles_not_yet_due() {
    let mut store = TaskStore::new(
        SqliteKeyValueStore::open_in_memory().unwrap(),
        SqliteReminderScheduler::open_in_memory().unwrap(),
    );
    let id = store.add("later").unwrap();

    assert!(store.take_due_reminders(0).unwrap().is_empty());
    assert!(store.task(id).unwrap().reminder_handle.is_some());
    assert_eq!(store.scheduler().pending_count().unwrap(), 1);
}

#[test]
fn encoded_blob_round_trips_through_decode() {
    let mut store = memory_store();
    store.add("x").unwrap();
    store.add("y").unwrap();

    let blob = encode_tasks(store.tasks()).unwrap();
    let decoded = decode_tasks(&blob).unwrap();
    assert_eq!(decoded, store.tasks());
}
