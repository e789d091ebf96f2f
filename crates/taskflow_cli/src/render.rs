//! Plain-text rendering of the task list and store notifications.
//!
//! Rendering is pure: every function takes state and returns lines, so the
//! shell can write them anywhere.

use chrono::{DateTime, Utc};
use taskflow_core::{Task, TaskEvent};

const TITLE: &str = "TaskFlow";
const EMPTY_HINT: &str = "  No tasks yet. Add one with `add <text>`.";
const LIMIT_BADGE: &str = "Limit reached!";

/// Where output is shown. Only a live shell keeps the store around long
/// enough for `undo`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    OneShot,
    Shell,
}

/// Renders header, counter line and one row per task (already ordered).
pub fn render_list(tasks: &[&Task], count: usize, max: usize) -> Vec<String> {
    let mut lines = vec![TITLE.to_string(), render_counter(count, max)];
    if tasks.is_empty() {
        lines.push(EMPTY_HINT.to_string());
        return lines;
    }
    lines.extend(
        tasks
            .iter()
            .enumerate()
            .map(|(index, task)| render_row(index + 1, task)),
    );
    lines
}

/// `count/max tasks`, suffixed with the limit badge when full.
pub fn render_counter(count: usize, max: usize) -> String {
    if count >= max {
        format!("{count}/{max} tasks  [{LIMIT_BADGE}]")
    } else {
        format!("{count}/{max} tasks")
    }
}

fn render_row(row: usize, task: &Task) -> String {
    let mark = if task.completed { 'x' } else { ' ' };
    format!("{row:>3}. [{mark}] {}", task.text)
}

/// One-line notification for `event`, or `None` when the event is silent.
pub fn render_event(event: &TaskEvent, now: DateTime<Utc>, surface: Surface) -> Option<String> {
    match event {
        TaskEvent::Added { task } => Some(format!("Task added: {}", task.text)),
        TaskEvent::Edited { task } => Some(format!("Task edited: {}", task.text)),
        TaskEvent::Restored { task } => Some(format!("Task restored: {}", task.text)),
        TaskEvent::Removed {
            task,
            undoable_until,
        } => match surface {
            Surface::Shell => {
                let seconds = remaining_seconds(now, *undoable_until);
                Some(format!(
                    "Task removed: {} (undo available for {seconds}s)",
                    task.text
                ))
            }
            Surface::OneShot => Some(format!("Task removed: {}", task.text)),
        },
        TaskEvent::Toggled { .. } => None,
    }
}

/// Whole seconds left until `deadline`, rounded up, never negative.
fn remaining_seconds(now: DateTime<Utc>, deadline: DateTime<Utc>) -> i64 {
    let millis = (deadline - now).num_milliseconds().max(0);
    (millis + 999) / 1000
}
