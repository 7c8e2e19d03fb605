//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate the persistence and reminder gateways into task list
//!   operations.
//! - Keep UI/FFI layers decoupled from storage and scheduler details.

pub mod task_store;
