//! Task domain model.
//!
//! # Responsibility
//! - Define the single record rendered by the task list.
//! - Provide the fixed priority cycle used by the presentation layer.
//!
//! # Invariants
//! - `id` is stable and never reused for another task.
//! - `text` is trimmed and non-empty once a create or edit commits.
//! - `editing` is transient UI state and never part of the persisted shape.

use crate::reminder::ReminderHandle;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for one task.
pub type TaskId = Uuid;

/// Task priority level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    /// Returns the next level in the fixed cycle `low -> medium -> high -> low`.
    pub fn next(self) -> Self {
        match self {
            Self::Low => Self::Medium,
            Self::Medium => Self::High,
            Self::High => Self::Low,
        }
    }

    /// Stable wire label.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// Parses a wire label, ignoring surrounding whitespace and case.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

impl Display for Priority {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validation errors for task construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskValidationError {
    /// `id` must not be nil.
    NilId,
    /// `text` is empty after trimming.
    EmptyText,
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilId => write!(f, "task id must not be nil"),
            Self::EmptyText => write!(f, "task text must not be empty"),
        }
    }
}

impl Error for TaskValidationError {}

/// One to-do item.
///
/// Serialized in the camelCase record shape shared with the host app:
/// `{id, text, completed, priority, reminderHandle?}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "TaskRecord")]
pub struct Task {
    pub id: TaskId,
    pub text: String,
    pub completed: bool,
    pub priority: Priority,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reminder_handle: Option<ReminderHandle>,
    /// Whether the row is open in the inline editor.
    #[serde(skip)]
    pub editing: bool,
}

impl Task {
    /// Creates a task with a fresh id and default state.
    ///
    /// Text is trimmed; whitespace-only input is rejected.
    pub fn new(text: &str) -> Result<Self, TaskValidationError> {
        Self::with_id(Uuid::new_v4(), text)
    }

    /// Creates a task with a caller-provided id.
    pub fn with_id(id: TaskId, text: &str) -> Result<Self, TaskValidationError> {
        let task = Self {
            id,
            text: text.trim().to_string(),
            completed: false,
            priority: Priority::default(),
            reminder_handle: None,
            editing: false,
        };
        task.validate()?;
        Ok(task)
    }

    /// Checks id and text invariants.
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        if self.id.is_nil() {
            return Err(TaskValidationError::NilId);
        }
        if self.text.trim().is_empty() {
            return Err(TaskValidationError::EmptyText);
        }
        Ok(())
    }

    /// Equality over persisted fields only.
    pub fn same_persisted(&self, other: &Task) -> bool {
        self.id == other.id
            && self.text == other.text
            && self.completed == other.completed
            && self.priority == other.priority
            && self.reminder_handle == other.reminder_handle
    }
}

// Wire shape accepted on read; every record passes `Task::validate`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskRecord {
    id: TaskId,
    text: String,
    #[serde(default)]
    completed: bool,
    #[serde(default)]
    priority: Priority,
    #[serde(default)]
    reminder_handle: Option<ReminderHandle>,
}

impl TryFrom<TaskRecord> for Task {
    type Error = TaskValidationError;

    fn try_from(value: TaskRecord) -> Result<Self, Self::Error> {
        let task = Self {
            id: value.id,
            text: value.text,
            completed: value.completed,
            priority: value.priority,
            reminder_handle: value.reminder_handle,
            editing: false,
        };
        task.validate()?;
        Ok(task)
    }
}
