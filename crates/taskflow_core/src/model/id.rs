//! Task id generation strategies.
//!
//! # Responsibility
//! - Produce fresh `TaskId` values for newly added tasks.
//!
//! # Invariants
//! - A single generator instance never yields the same id twice.
//! - Generators do not guarantee uniqueness against persisted ids; the store
//!   re-draws on collision.

use crate::model::task::TaskId;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Source of fresh task ids.
pub trait TaskIdGenerator {
    /// Returns the next id. `now` is the creation timestamp of the task.
    fn next_id(&mut self, now: DateTime<Utc>) -> TaskId;
}

impl<G: TaskIdGenerator + ?Sized> TaskIdGenerator for Box<G> {
    fn next_id(&mut self, now: DateTime<Utc>) -> TaskId {
        (**self).next_id(now)
    }
}

/// Epoch-millisecond ids, strictly increasing within one process.
///
/// Two tasks created in the same millisecond get consecutive values instead
/// of colliding.
#[derive(Debug, Default)]
pub struct TimestampIdGenerator {
    last_ms: Option<i64>,
}

impl TimestampIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TaskIdGenerator for TimestampIdGenerator {
    fn next_id(&mut self, now: DateTime<Utc>) -> TaskId {
        let candidate = now.timestamp_millis();
        let next = match self.last_ms {
            Some(last) if candidate <= last => last + 1,
            _ => candidate,
        };
        self.last_ms = Some(next);
        TaskId::new(next.to_string())
    }
}

/// Deterministic `prefix-N` ids.
#[derive(Debug)]
pub struct SequentialIdGenerator {
    prefix: String,
    next: u64,
}

impl SequentialIdGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: 1,
        }
    }
}

impl Default for SequentialIdGenerator {
    fn default() -> Self {
        Self::new("task")
    }
}

impl TaskIdGenerator for SequentialIdGenerator {
    fn next_id(&mut self, _now: DateTime<Utc>) -> TaskId {
        let id = TaskId::new(format!("{}-{}", self.prefix, self.next));
        self.next += 1;
        id
    }
}

/// Random v4 UUID ids.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidIdGenerator;

impl TaskIdGenerator for UuidIdGenerator {
    fn next_id(&mut self, _now: DateTime<Utc>) -> TaskId {
        TaskId::new(Uuid::new_v4().to_string())
    }
}
