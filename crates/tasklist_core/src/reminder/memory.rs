//! In-memory reminder scheduler.

use super::{
    NotificationPermission, ReminderError, ReminderHandle, ReminderResult, ReminderScheduler,
};
use std::cell::{Cell, RefCell};
use uuid::Uuid;

/// A reminder accepted by `MemoryReminderScheduler`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledReminder {
    pub handle: ReminderHandle,
    pub title: String,
    pub body: String,
    pub delay_seconds: u64,
}

/// Scheduler that keeps pending reminders in process memory.
///
/// Never delivers anything; it records calls so callers can inspect pending
/// and cancelled reminders, and can be told to fail.
#[derive(Debug)]
pub struct MemoryReminderScheduler {
    pending: RefCell<Vec<ScheduledReminder>>,
    cancelled: RefCell<Vec<ReminderHandle>>,
    permission: Cell<NotificationPermission>,
    fail_schedule: Cell<bool>,
    fail_cancel: Cell<bool>,
}

impl Default for MemoryReminderScheduler {
    fn default() -> Self {
        Self::new(NotificationPermission::Granted)
    }
}

impl MemoryReminderScheduler {
    pub fn new(permission: NotificationPermission) -> Self {
        Self {
            pending: RefCell::new(Vec::new()),
            cancelled: RefCell::new(Vec::new()),
            permission: Cell::new(permission),
            fail_schedule: Cell::new(false),
            fail_cancel: Cell::new(false),
        }
    }

    pub fn set_permission(&self, permission: NotificationPermission) {
        self.permission.set(permission);
    }

    pub fn set_fail_schedule(&self, fail: bool) {
        self.fail_schedule.set(fail);
    }

    pub fn set_fail_cancel(&self, fail: bool) {
        self.fail_cancel.set(fail);
    }

    /// Reminders scheduled and not cancelled, in scheduling order.
    pub fn pending(&self) -> Vec<ScheduledReminder> {
        self.pending.borrow().clone()
    }

    /// Handles cancelled so far, in cancellation order.
    pub fn cancelled(&self) -> Vec<ReminderHandle> {
        self.cancelled.borrow().clone()
    }
}

impl ReminderScheduler for MemoryReminderScheduler {
    fn schedule(
        &self,
        title: &str,
        body: &str,
        delay_seconds: u64,
    ) -> ReminderResult<ReminderHandle> {
        if self.permission.get() == NotificationPermission::Denied {
            return Err(ReminderError::PermissionDenied);
        }
        if self.fail_schedule.get() {
            return Err(ReminderError::Unavailable("schedule refused".to_string()));
        }

        let handle = ReminderHandle::new(Uuid::new_v4().to_string());
        self.pending.borrow_mut().push(ScheduledReminder {
            handle: handle.clone(),
            title: title.to_string(),
            body: body.to_string(),
            delay_seconds,
        });
        Ok(handle)
    }

    fn cancel(&self, handle: &ReminderHandle) -> ReminderResult<()> {
        if self.fail_cancel.get() {
            return Err(ReminderError::Unavailable("cancel refused".to_string()));
        }

        let mut pending = self.pending.borrow_mut();
        let Some(position) = pending.iter().position(|item| &item.handle == handle) else {
            return Err(ReminderError::NotFound(handle.clone()));
        };
        pending.remove(position);
        self.cancelled.borrow_mut().push(handle.clone());
        Ok(())
    }

    fn permission(&self) -> NotificationPermission {
        self.permission.get()
    }
}
