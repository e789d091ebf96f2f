//! Task store configuration.
//!
//! The task-count ceiling is deliberately not part of this struct: it is the
//! fixed `MAX_TASKS` constant.

use chrono::Duration;

/// Hard ceiling on the number of tasks in the list.
pub const MAX_TASKS: usize = 10;

/// Slot key the task list is persisted under.
pub const DEFAULT_STORAGE_KEY: &str = "todo-tasks";

/// How long a removed task may be restored (matches the removal
/// notification lifetime).
pub const DEFAULT_UNDO_WINDOW_MS: i64 = 5_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub storage_key: String,
    pub undo_window: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            undo_window: Duration::milliseconds(DEFAULT_UNDO_WINDOW_MS),
        }
    }
}

impl StoreConfig {
    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    /// Negative windows are clamped to zero (restore only at the removal
    /// instant).
    pub fn with_undo_window(mut self, window: Duration) -> Self {
        self.undo_window = window.max(Duration::zero());
        self
    }
}
