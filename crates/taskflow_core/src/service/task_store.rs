//! Task list use-case service.
//!
//! # Responsibility
//! - Own the in-memory task list and mediate every mutation.
//! - Enforce the `MAX_TASKS` ceiling and text normalization.
//! - Mirror the full list into one storage slot after each mutation.
//! - Emit `TaskEvent`s for the presentation layer (notifications, undo).
//!
//! # Invariants
//! - The list never holds more than `MAX_TASKS` tasks.
//! - Task ids are unique within the list.
//! - In-memory state changes only after the storage write succeeded.
//! - Insertion order is the persisted order; newest-first is a derived view.

use crate::clock::Clock;
use crate::config::{StoreConfig, MAX_TASKS};
use crate::model::id::TaskIdGenerator;
use crate::model::task::{normalize_task_text, Task, TaskId};
use crate::storage::{KeyValueStorage, StorageError};
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde_json::error::Category;
use std::cmp::Reverse;
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

const ID_DRAW_ATTEMPTS: usize = 32;

pub type StoreResult<T> = Result<T, TaskStoreError>;

/// Failures that reach the caller. Blank text and a full list are reported
/// through `false` return values instead.
#[derive(Debug)]
pub enum TaskStoreError {
    Storage(StorageError),
    Encode(serde_json::Error),
    /// The id generator kept returning ids already in the list.
    IdExhausted { attempts: usize },
}

impl Display for TaskStoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Storage(err) => write!(f, "{err}"),
            Self::Encode(err) => write!(f, "failed to encode task list: {err}"),
            Self::IdExhausted { attempts } => {
                write!(f, "no unused task id after {attempts} attempts")
            }
        }
    }
}

impl Error for TaskStoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
            Self::Encode(err) => Some(err),
            Self::IdExhausted { .. } => None,
        }
    }
}

impl From<StorageError> for TaskStoreError {
    fn from(value: StorageError) -> Self {
        Self::Storage(value)
    }
}

impl From<serde_json::Error> for TaskStoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Encode(value)
    }
}

/// Notification emitted after a successful mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskEvent {
    Added {
        task: Task,
    },
    Edited {
        task: Task,
    },
    Toggled {
        task: Task,
    },
    /// `task` can be passed back through `restore(&task.id)` until
    /// `undoable_until` (inclusive).
    Removed {
        task: Task,
        undoable_until: DateTime<Utc>,
    },
    Restored {
        task: Task,
    },
}

impl TaskEvent {
    pub fn task(&self) -> &Task {
        match self {
            Self::Added { task }
            | Self::Edited { task }
            | Self::Toggled { task }
            | Self::Removed { task, .. }
            | Self::Restored { task } => task,
        }
    }
}

/// Result of reading the persisted slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Slot absent; list starts empty.
    Empty,
    /// Slot decoded into this many tasks.
    Loaded(usize),
    /// Slot present but unusable; list starts empty.
    Discarded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreOutcome {
    Restored,
    /// Undo window closed; the removal is now permanent.
    Expired,
    /// No pending removal for this id.
    NotPending,
    /// List is full; the removal stays pending until its window closes.
    AtLimit,
}

#[derive(Debug, Clone)]
struct PendingRemoval {
    task: Task,
    undoable_until: DateTime<Utc>,
}

/// In-memory task list synchronized with one key-value slot.
pub struct TaskStore<S, G, C> {
    storage: S,
    ids: G,
    clock: C,
    config: StoreConfig,
    tasks: Vec<Task>,
    pending_undo: Vec<PendingRemoval>,
    events: Vec<TaskEvent>,
}

impl<S, G, C> TaskStore<S, G, C>
where
    S: KeyValueStorage,
    G: TaskIdGenerator,
    C: Clock,
{
    /// Builds a store and loads the persisted list.
    ///
    /// # Errors
    /// - Storage read failures. Malformed data is not an error.
    pub fn open(storage: S, config: StoreConfig, ids: G, clock: C) -> StoreResult<Self> {
        let mut store = Self {
            storage,
            ids,
            clock,
            config,
            tasks: Vec::new(),
            pending_undo: Vec::new(),
            events: Vec::new(),
        };
        store.load()?;
        Ok(store)
    }

    /// Replaces in-memory state with the persisted list.
    ///
    /// Malformed payloads are dropped with a warning and the list starts
    /// empty; the slot itself is left as-is until the next mutation.
    /// Pending removals and undelivered events are discarded.
    pub fn load(&mut self) -> StoreResult<LoadOutcome> {
        self.pending_undo.clear();
        self.events.clear();
        let raw = self.storage.get(&self.config.storage_key)?;

        let outcome = match raw {
            None => {
                self.tasks.clear();
                LoadOutcome::Empty
            }
            Some(raw) => match decode_tasks(&raw) {
                Ok(tasks) => {
                    let count = tasks.len();
                    self.tasks = tasks;
                    LoadOutcome::Loaded(count)
                }
                Err(reason) => {
                    warn!(
                        "event=task_load module=store status=discarded key={} reason={}",
                        self.config.storage_key, reason
                    );
                    self.tasks.clear();
                    LoadOutcome::Discarded
                }
            },
        };

        info!(
            "event=task_load module=store status=ok key={} count={}",
            self.config.storage_key,
            self.tasks.len()
        );
        Ok(outcome)
    }

    /// Appends a new task built from `text`.
    ///
    /// Returns `Ok(false)` without touching state when `text` is blank or
    /// the list is full.
    pub fn add(&mut self, text: &str) -> StoreResult<bool> {
        self.expire_undo();
        let Ok(text) = normalize_task_text(text) else {
            debug!("event=task_add module=store status=rejected reason=blank");
            return Ok(false);
        };
        if self.is_at_limit() {
            debug!(
                "event=task_add module=store status=rejected reason=limit count={}",
                self.tasks.len()
            );
            return Ok(false);
        }

        let now = self.clock.now();
        let id = self.fresh_id(now)?;
        let task = Task {
            id,
            text,
            completed: false,
            created_at: now,
        };

        let mut next = self.tasks.clone();
        next.push(task.clone());
        self.commit(next)?;

        info!(
            "event=task_add module=store status=ok id={} count={}",
            task.id,
            self.tasks.len()
        );
        self.events.push(TaskEvent::Added { task });
        Ok(true)
    }

    /// Removes the task with `id` and opens its undo window.
    ///
    /// Unknown ids are a silent no-op.
    pub fn remove(&mut self, id: &TaskId) -> StoreResult<()> {
        self.expire_undo();
        let Some(index) = self.position(id) else {
            return Ok(());
        };

        let mut next = self.tasks.clone();
        let task = next.remove(index);
        self.commit(next)?;

        let undoable_until = self.clock.now() + self.config.undo_window;
        self.pending_undo.retain(|pending| pending.task.id != task.id);
        self.pending_undo.push(PendingRemoval {
            task: task.clone(),
            undoable_until,
        });

        info!(
            "event=task_remove module=store status=ok id={} count={}",
            task.id,
            self.tasks.len()
        );
        self.events.push(TaskEvent::Removed {
            task,
            undoable_until,
        });
        Ok(())
    }

    /// Re-appends a removed task exactly as it was, if its undo window is
    /// still open.
    pub fn restore(&mut self, id: &TaskId) -> StoreResult<RestoreOutcome> {
        let now = self.clock.now();
        let Some(index) = self
            .pending_undo
            .iter()
            .position(|pending| &pending.task.id == id)
        else {
            return Ok(RestoreOutcome::NotPending);
        };

        if self.pending_undo[index].undoable_until < now {
            self.pending_undo.remove(index);
            debug!("event=task_restore module=store status=expired id={id}");
            return Ok(RestoreOutcome::Expired);
        }
        if self.is_at_limit() {
            debug!("event=task_restore module=store status=rejected reason=limit id={id}");
            return Ok(RestoreOutcome::AtLimit);
        }

        let task = self.pending_undo[index].task.clone();
        let mut next = self.tasks.clone();
        next.push(task.clone());
        self.commit(next)?;
        self.pending_undo.remove(index);

        info!(
            "event=task_restore module=store status=ok id={} count={}",
            task.id,
            self.tasks.len()
        );
        self.events.push(TaskEvent::Restored { task });
        Ok(RestoreOutcome::Restored)
    }

    /// Flips `completed` on the task with `id`. Unknown ids are a no-op.
    pub fn toggle(&mut self, id: &TaskId) -> StoreResult<()> {
        self.expire_undo();
        let Some(index) = self.position(id) else {
            return Ok(());
        };

        let mut next = self.tasks.clone();
        next[index].toggle();
        let task = next[index].clone();
        self.commit(next)?;

        info!(
            "event=task_toggle module=store status=ok id={} completed={}",
            task.id, task.completed
        );
        self.events.push(TaskEvent::Toggled { task });
        Ok(())
    }

    /// Replaces the text of the task with `id`.
    ///
    /// Returns `Ok(false)` without touching state when `text` is blank or
    /// no task has `id`.
    pub fn edit(&mut self, id: &TaskId, text: &str) -> StoreResult<bool> {
        self.expire_undo();
        let Some(index) = self.position(id) else {
            warn!("event=task_edit module=store status=rejected reason=not_found id={id}");
            return Ok(false);
        };

        let mut next = self.tasks.clone();
        if next[index].rename(text).is_err() {
            debug!("event=task_edit module=store status=rejected reason=blank id={id}");
            return Ok(false);
        }
        let task = next[index].clone();
        self.commit(next)?;

        info!("event=task_edit module=store status=ok id={}", task.id);
        self.events.push(TaskEvent::Edited { task });
        Ok(true)
    }

    /// Drops pending removals whose undo window has closed.
    pub fn expire_undo(&mut self) {
        let now = self.clock.now();
        self.pending_undo.retain(|pending| pending.undoable_until >= now);
    }

    /// Most recent removal that can still be restored, with its deadline.
    pub fn latest_undoable(&self) -> Option<(&Task, DateTime<Utc>)> {
        let now = self.clock.now();
        self.pending_undo
            .iter()
            .rev()
            .find(|pending| pending.undoable_until >= now)
            .map(|pending| (&pending.task, pending.undoable_until))
    }

    /// Drains notifications accumulated since the last call.
    pub fn take_events(&mut self) -> Vec<TaskEvent> {
        std::mem::take(&mut self.events)
    }

    /// Tasks in insertion (persisted) order.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Tasks ordered newest-created first; ties keep the later insertion
    /// first.
    pub fn tasks_newest_first(&self) -> Vec<&Task> {
        let mut view: Vec<&Task> = self.tasks.iter().rev().collect();
        view.sort_by_key(|task| Reverse(task.created_at));
        view
    }

    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| &task.id == id)
    }

    pub fn count(&self) -> usize {
        self.tasks.len()
    }

    pub fn max(&self) -> usize {
        MAX_TASKS
    }

    pub fn is_at_limit(&self) -> bool {
        self.tasks.len() >= MAX_TASKS
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    fn position(&self, id: &TaskId) -> Option<usize> {
        self.tasks.iter().position(|task| &task.id == id)
    }

    fn fresh_id(&mut self, now: DateTime<Utc>) -> StoreResult<TaskId> {
        for _ in 0..ID_DRAW_ATTEMPTS {
            let id = self.ids.next_id(now);
            let taken = self.tasks.iter().any(|task| task.id == id)
                || self.pending_undo.iter().any(|pending| pending.task.id == id);
            if !taken {
                return Ok(id);
            }
            debug!("event=task_id_draw module=store status=collision id={id}");
        }
        Err(TaskStoreError::IdExhausted {
            attempts: ID_DRAW_ATTEMPTS,
        })
    }

    /// Writes `next` to the slot, then adopts it as current state.
    fn commit(&mut self, next: Vec<Task>) -> StoreResult<()> {
        let payload = serde_json::to_string(&next)?;
        self.storage.set(&self.config.storage_key, &payload)?;
        self.tasks = next;
        Ok(())
    }
}

/// Decodes and validates a persisted task array.
///
/// Returns a short reason on failure, suitable for logs.
fn decode_tasks(raw: &str) -> Result<Vec<Task>, String> {
    let tasks: Vec<Task> = serde_json::from_str(raw)
        .map_err(|err| format!("invalid_json:{}", json_error_label(&err)))?;

    if tasks.len() > MAX_TASKS {
        return Err(format!("too_many_tasks:{}", tasks.len()));
    }

    let mut seen = HashSet::with_capacity(tasks.len());
    for task in &tasks {
        if task.validate().is_err() {
            return Err("blank_text".to_string());
        }
        if !seen.insert(&task.id) {
            return Err("duplicate_id".to_string());
        }
    }
    Ok(tasks)
}

fn json_error_label(err: &serde_json::Error) -> &'static str {
    match err.classify() {
        Category::Io => "io",
        Category::Syntax => "syntax",
        Category::Data => "data",
        Category::Eof => "eof",
    }
}
