//! Task store: the in-memory task list and its mutation operations.
//!
//! # Responsibility
//! - Own the ordered task collection (insertion order is display order).
//! - Keep in-memory state, the persisted blob and scheduled reminders in step.
//!
//! # Invariants
//! - Task ids are unique within the collection.
//! - At most one task has `editing = true`.
//! - A completed or removed task has no outstanding reminder handle.
//! - Draining delivered reminders clears their handles from the tasks.
//! - Gateway failures are logged and never roll back an in-memory mutation.

use crate::config::{StoreConfig, PERMISSION_DENIED_WARNING};
use crate::model::task::{Priority, Task, TaskId};
use crate::reminder::{
    DueReminder, NotificationPermission, ReminderHandle, ReminderResult, ReminderScheduler,
    SqliteReminderScheduler,
};
use crate::storage::{decode_tasks, encode_tasks, KeyValueStore};
use log::{debug, error, info, warn};

/// Authoritative task list for one app session.
pub struct TaskStore<S: KeyValueStore, R: ReminderScheduler> {
    storage: S,
    scheduler: R,
    config: StoreConfig,
    tasks: Vec<Task>,
    edit_buffer: String,
    permission_warning_shown: bool,
}

impl<S: KeyValueStore, R: ReminderScheduler> TaskStore<S, R> {
    /// Creates an empty store with default configuration.
    ///
    /// Call `load` to pick up previously persisted tasks.
    pub fn new(storage: S, scheduler: R) -> Self {
        Self::with_config(storage, scheduler, StoreConfig::default())
    }

    pub fn with_config(storage: S, scheduler: R, config: StoreConfig) -> Self {
        Self {
            storage,
            scheduler,
            config,
            tasks: Vec::new(),
            edit_buffer: String::new(),
            permission_warning_shown: false,
        }
    }

    /// Replaces the collection with the persisted one.
    ///
    /// Fails soft: a read or parse failure leaves the collection empty.
    /// Returns the number of tasks loaded.
    pub fn load(&mut self) -> usize {
        self.tasks.clear();
        self.edit_buffer.clear();

        let blob = match self.storage.get(&self.config.storage_key) {
            Ok(Some(blob)) => blob,
            Ok(None) => {
                info!("event=tasks_load module=store status=ok count=0 source=empty");
                return 0;
            }
            Err(err) => {
                error!(
                    "event=tasks_load module=store status=error error_code=storage_read_failed error={}",
                    err
                );
                return 0;
            }
        };

        match decode_tasks(&blob) {
            Ok(tasks) => {
                self.tasks = tasks;
                info!(
                    "event=tasks_load module=store status=ok count={} source=storage",
                    self.tasks.len()
                );
            }
            Err(err) => {
                error!(
                    "event=tasks_load module=store status=error error_code=blob_parse_failed error={}",
                    err
                );
            }
        }
        self.tasks.len()
    }

    /// Adds a task for `text`, scheduling its reminder best-effort.
    ///
    /// Returns `None` without side effects when `text` is blank.
    pub fn add(&mut self, text: &str) -> Option<TaskId> {
        let mut task = match Task::new(text) {
            Ok(task) => task,
            Err(err) => {
                debug!("event=task_add module=store status=skipped reason=invalid_text error={err}");
                return None;
            }
        };
        task.reminder_handle = self.schedule_reminder(&task.text);

        let id = task.id;
        info!(
            "event=task_add module=store status=ok task_id={} reminder={}",
            id,
            if task.reminder_handle.is_some() {
                "scheduled"
            } else {
                "none"
            }
        );
        self.tasks.push(task);
        self.persist();
        Some(id)
    }

    /// Toggles inline editing for `id` and closes it everywhere else.
    ///
    /// Seeds the shared edit buffer with `initial_text`. Not persisted.
    /// Returns `false` when `id` is unknown.
    pub fn set_editing(&mut self, id: TaskId, initial_text: &str) -> bool {
        if self.position(id).is_none() {
            debug!("event=task_set_editing module=store status=skipped reason=not_found task_id={id}");
            return false;
        }

        for task in &mut self.tasks {
            task.editing = if task.id == id { !task.editing } else { false };
        }
        self.edit_buffer = initial_text.to_string();
        true
    }

    /// Commits edited text for `id` and leaves editing mode.
    ///
    /// Blank text and unknown ids are no-ops returning `false`.
    pub fn commit_edit(&mut self, id: TaskId, edited_text: &str) -> bool {
        let trimmed = edited_text.trim();
        if trimmed.is_empty() {
            debug!("event=task_commit_edit module=store status=skipped reason=empty_text task_id={id}");
            return false;
        }
        let Some(task) = self.task_mut(id) else {
            return false;
        };

        task.text = trimmed.to_string();
        task.editing = false;
        info!("event=task_commit_edit module=store status=ok task_id={id}");
        self.persist();
        true
    }

    /// Sets the priority of `id`. Returns `false` when `id` is unknown.
    pub fn set_priority(&mut self, id: TaskId, priority: Priority) -> bool {
        let Some(task) = self.task_mut(id) else {
            return false;
        };

        task.priority = priority;
        info!(
            "event=task_set_priority module=store status=ok task_id={} priority={}",
            id, priority
        );
        self.persist();
        true
    }

    /// Advances `id` to the next priority in the `low -> medium -> high` cycle.
    pub fn cycle_priority(&mut self, id: TaskId) -> Option<Priority> {
        let next = self.task(id)?.priority.next();
        self.set_priority(id, next);
        Some(next)
    }

    /// Flips completion of `id` and returns the new state.
    ///
    /// Completing a task cancels its reminder (best-effort) and clears the handle.
    pub fn toggle_completed(&mut self, id: TaskId) -> Option<bool> {
        let index = self.position(id)?;

        let task = &mut self.tasks[index];
        task.completed = !task.completed;
        let completed = task.completed;
        let handle = if completed {
            task.reminder_handle.take()
        } else {
            None
        };

        if let Some(handle) = handle {
            self.cancel_reminder(&handle);
        }
        info!(
            "event=task_toggle_completed module=store status=ok task_id={} completed={}",
            id, completed
        );
        self.persist();
        Some(completed)
    }

    /// Removes `id`, cancelling its reminder first. Unknown ids are no-ops.
    pub fn remove(&mut self, id: TaskId) -> Option<Task> {
        let index = self.position(id)?;

        if let Some(handle) = self.tasks[index].reminder_handle.take() {
            self.cancel_reminder(&handle);
        }
        let removed = self.tasks.remove(index);
        info!(
            "event=task_remove module=store status=ok task_id={} remaining={}",
            id,
            self.tasks.len()
        );
        self.persist();
        Some(removed)
    }

    /// Drops handles of reminders the host has already delivered.
    ///
    /// Persists once when at least one task changed. Returns the number of
    /// tasks whose handle was cleared.
    pub fn clear_delivered_reminders(&mut self, delivered: &[ReminderHandle]) -> usize {
        let mut cleared = 0;
        for task in &mut self.tasks {
            let is_delivered = task
                .reminder_handle
                .as_ref()
                .is_some_and(|handle| delivered.contains(handle));
            if is_delivered {
                task.reminder_handle = None;
                cleared += 1;
            }
        }

        if cleared > 0 {
            info!("event=reminders_delivered module=store status=ok cleared={cleared}");
            self.persist();
        }
        cleared
    }

    /// Returns the permission warning the first time it applies.
    pub fn startup_warning(&mut self) -> Option<&'static str> {
        if self.permission_warning_shown
            || self.scheduler.permission() != NotificationPermission::Denied
        {
            return None;
        }
        self.permission_warning_shown = true;
        warn!("event=notification_permission module=store status=denied");
        Some(PERMISSION_DENIED_WARNING)
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    /// Task currently open in the inline editor.
    pub fn editing_task(&self) -> Option<&Task> {
        self.tasks.iter().find(|task| task.editing)
    }

    pub fn edit_buffer(&self) -> &str {
        &self.edit_buffer
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn scheduler(&self) -> &R {
        &self.scheduler
    }

    fn position(&self, id: TaskId) -> Option<usize> {
        self.tasks.iter().position(|task| task.id == id)
    }

    fn task_mut(&mut self, id: TaskId) -> Option<&mut Task> {
        let task = self.tasks.iter_mut().find(|task| task.id == id);
        if task.is_none() {
            debug!("event=task_lookup module=store status=skipped reason=not_found task_id={id}");
        }
        task
    }

    fn schedule_reminder(&self, text: &str) -> Option<ReminderHandle> {
        match self.scheduler.schedule(
            &self.config.reminder_title,
            text,
            self.config.reminder_delay_secs,
        ) {
            Ok(handle) => Some(handle),
            Err(err) => {
                warn!(
                    "event=reminder_schedule module=store status=error error_code=schedule_failed error={}",
                    err
                );
                None
            }
        }
    }

    fn cancel_reminder(&self, handle: &ReminderHandle) {
        if let Err(err) = self.scheduler.cancel(handle) {
            warn!(
                "event=reminder_cancel module=store status=error error_code=cancel_failed handle={} error={}",
                handle, err
            );
        }
    }

    fn persist(&self) {
        let blob = match encode_tasks(&self.tasks) {
            Ok(blob) => blob,
            Err(err) => {
                error!(
                    "event=tasks_persist module=store status=error error_code=blob_encode_failed error={}",
                    err
                );
                return;
            }
        };

        match self.storage.set(&self.config.storage_key, &blob) {
            Ok(()) => debug!(
                "event=tasks_persist module=store status=ok count={}",
                self.tasks.len()
            ),
            Err(err) => error!(
                "event=tasks_persist module=store status=error error_code=storage_write_failed error={}",
                err
            ),
        }
    }
}

impl<S: KeyValueStore> TaskStore<S, SqliteReminderScheduler> {
    /// Drains reminders due at or before `now_ms` and clears their handles.
    ///
    /// # Errors
    /// - Reading or deleting the due rows fails; no handle is cleared then.
    pub fn take_due_reminders(&mut self, now_ms: i64) -> ReminderResult<Vec<DueReminder>> {
        let due = self.scheduler.take_due(now_ms)?;
        let handles: Vec<ReminderHandle> =
            due.iter().map(|reminder| reminder.handle.clone()).collect();
        self.clear_delivered_reminders(&handles);
        Ok(due)
    }
}
