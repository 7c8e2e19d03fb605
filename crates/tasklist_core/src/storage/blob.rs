//! Persisted blob format for the task collection.
//!
//! The blob is a JSON array of task records in display order:
//! `[{"id", "text", "completed", "priority", "reminderHandle"?}, ...]`.
//! There is no version field; any shape change breaks existing data.

use crate::model::task::{Task, TaskId};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Blob encode/decode failure.
#[derive(Debug)]
pub enum BlobError {
    Json(serde_json::Error),
    DuplicateId(TaskId),
}

impl Display for BlobError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json(err) => write!(f, "invalid task blob: {err}"),
            Self::DuplicateId(id) => write!(f, "invalid task blob: duplicate task id {id}"),
        }
    }
}

impl Error for BlobError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Json(err) => Some(err),
            Self::DuplicateId(_) => None,
        }
    }
}

impl From<serde_json::Error> for BlobError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

/// Serializes the full collection. Transient `editing` flags are dropped.
pub fn encode_tasks(tasks: &[Task]) -> Result<String, BlobError> {
    Ok(serde_json::to_string(tasks)?)
}

/// Parses a blob back into a collection.
///
/// Rejects records with empty text or a repeated id; legacy `editing` keys
/// are ignored.
pub fn decode_tasks(blob: &str) -> Result<Vec<Task>, BlobError> {
    let tasks: Vec<Task> = serde_json::from_str(blob)?;
    let mut seen = HashSet::with_capacity(tasks.len());
    for task in &tasks {
        if !seen.insert(task.id) {
            return Err(BlobError::DuplicateId(task.id));
        }
    }
    Ok(tasks)
}
