//! Core domain logic for TaskFlow.
//! This crate is the single source of truth for task list invariants.

pub mod clock;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod service;
pub mod storage;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{StoreConfig, DEFAULT_STORAGE_KEY, MAX_TASKS};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::id::{SequentialIdGenerator, TaskIdGenerator, TimestampIdGenerator, UuidIdGenerator};
pub use model::task::{normalize_task_text, Task, TaskId, TaskTextError};
pub use service::task_store::{
    LoadOutcome, RestoreOutcome, StoreResult, TaskEvent, TaskStore, TaskStoreError,
};
pub use storage::{KeyValueStorage, MemoryStorage, SqliteStorage, StorageError, StorageResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
