//! To-do domain model.
//!
//! # Responsibility
//! - Define the canonical task record and its text rules.
//! - Provide pluggable id generation.
//!
//! # Invariants
//! - Every task is identified by a stable `TaskId`.
//! - Task text is stored only in normalized form.

pub mod id;
pub mod task;
