//! Domain model for the task list.
//!
//! # Responsibility
//! - Define canonical data structures used by the task store.
//!
//! # Invariants
//! - Every task is identified by a stable `TaskId`.
//! - Deletion is a hard removal from the collection.

pub mod task;
