//! Task domain model.
//!
//! # Responsibility
//! - Define the canonical to-do record persisted in the task slot.
//! - Own text normalization (trim + first-character capitalization).
//!
//! # Invariants
//! - `id` is stable and never reassigned after creation.
//! - `text` is never empty or whitespace-only once normalized.
//! - `created_at` is captured once and never mutated.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Opaque, unique task identity.
///
/// Serialized transparently as a plain JSON string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for TaskId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for TaskId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Text validation failure for add/edit inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskTextError {
    /// Input was empty or whitespace-only after trimming.
    Blank,
}

impl Display for TaskTextError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Blank => write!(f, "task text cannot be blank"),
        }
    }
}

impl Error for TaskTextError {}

/// Single to-do item.
///
/// Wire shape: `{"id", "text", "completed", "createdAt"}` with `createdAt`
/// encoded as an RFC 3339 / ISO-8601 string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub text: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Creates an open task from raw user input.
    ///
    /// # Errors
    /// - Returns `TaskTextError::Blank` when `text` trims to nothing.
    pub fn new(
        id: TaskId,
        text: &str,
        created_at: DateTime<Utc>,
    ) -> Result<Self, TaskTextError> {
        Ok(Self {
            id,
            text: normalize_task_text(text)?,
            completed: false,
            created_at,
        })
    }

    /// Replaces the text with the normalized form of `text`.
    ///
    /// Leaves the task untouched on error.
    pub fn rename(&mut self, text: &str) -> Result<(), TaskTextError> {
        self.text = normalize_task_text(text)?;
        Ok(())
    }

    /// Flips completion state in place.
    pub fn toggle(&mut self) {
        self.completed = !self.completed;
    }

    /// Checks invariants that deserialization alone cannot enforce.
    pub fn validate(&self) -> Result<(), TaskTextError> {
        if self.text.trim().is_empty() {
            return Err(TaskTextError::Blank);
        }
        Ok(())
    }
}

/// Trims `raw` and upper-cases its first character.
///
/// Upper-casing is Unicode-aware, so one input character can expand into
/// several (`ß` -> `SS`). The remainder is kept verbatim.
pub fn normalize_task_text(raw: &str) -> Result<String, TaskTextError> {
    let trimmed = raw.trim();
    let mut chars = trimmed.chars();
    let Some(first) = chars.next() else {
        return Err(TaskTextError::Blank);
    };

    let mut normalized = String::with_capacity(trimmed.len());
    normalized.extend(first.to_uppercase());
    normalized.push_str(chars.as_str());
    Ok(normalized)
}
