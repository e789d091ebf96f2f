//! User intents and their dispatch onto the task store.
//!
//! Both the one-shot subcommands and the interactive shell funnel through
//! `apply`, so the two surfaces cannot drift apart.

use crate::args::Command;
use crate::render::{render_event, render_list, Surface};
use std::io::Write;
use taskflow_core::{Clock, KeyValueStorage, RestoreOutcome, TaskId, TaskIdGenerator, TaskStore};

pub const HELP: &str = "\
Commands:
  list                 show tasks (newest first)
  add <text>           add a task
  toggle <row>         mark done / reopen
  edit <row> <text>    replace a task's text
  remove <row>         delete a task
  undo                 restore the last removed task while undo is open
  help                 show this help
  quit                 leave the shell";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    List,
    Add(String),
    Toggle(usize),
    Edit(usize, String),
    Remove(usize),
    Undo,
    Help,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

impl From<Command> for Action {
    fn from(value: Command) -> Self {
        match value {
            Command::List | Command::Shell => Self::List,
            Command::Add { text } => Self::Add(text.join(" ")),
            Command::Toggle { row } => Self::Toggle(row),
            Command::Edit { row, text } => Self::Edit(row, text.join(" ")),
            Command::Remove { row } => Self::Remove(row),
        }
    }
}

/// Parses one shell line. Returns `Ok(None)` for blank lines.
pub fn parse_line(line: &str) -> Result<Option<Action>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (verb, rest) = line
        .split_once(char::is_whitespace)
        .map_or((line, ""), |(verb, rest)| (verb, rest.trim()));

    let action = match verb.to_ascii_lowercase().as_str() {
        "list" | "ls" => Action::List,
        "add" | "a" => Action::Add(rest.to_string()),
        "toggle" | "t" | "done" => Action::Toggle(parse_row(rest)?),
        "edit" | "e" => {
            let (row, text) = rest
                .split_once(char::is_whitespace)
                .ok_or_else(|| "usage: edit <row> <text>".to_string())?;
            Action::Edit(parse_row(row)?, text.trim().to_string())
        }
        "remove" | "rm" | "delete" => Action::Remove(parse_row(rest)?),
        "undo" | "u" => Action::Undo,
        "help" | "?" => Action::Help,
        "quit" | "exit" | "q" => Action::Quit,
        other => return Err(format!("unknown command `{other}`; type `help`")),
    };
    Ok(Some(action))
}

fn parse_row(value: &str) -> Result<usize, String> {
    match value.trim().parse::<usize>() {
        Ok(row) if row > 0 => Ok(row),
        _ => Err(format!("expected a row number, got `{}`", value.trim())),
    }
}

/// Runs `action` against `store` and writes notices plus the refreshed list.
pub fn apply<S, G, C, W>(
    store: &mut TaskStore<S, G, C>,
    action: Action,
    surface: Surface,
    out: &mut W,
) -> anyhow::Result<Flow>
where
    S: KeyValueStorage,
    G: TaskIdGenerator,
    C: Clock,
    W: Write,
{
    match action {
        Action::Quit => return Ok(Flow::Quit),
        Action::Help => {
            writeln!(out, "{HELP}")?;
            return Ok(Flow::Continue);
        }
        Action::List => {}
        Action::Add(text) => {
            if !store.add(&text)? {
                if text.trim().is_empty() {
                    writeln!(out, "Task text cannot be blank.")?;
                } else {
                    writeln!(out, "Limit reached! Remove a task before adding another.")?;
                }
            }
        }
        Action::Toggle(row) => match resolve_row(store, row) {
            Some(id) => store.toggle(&id)?,
            None => writeln!(out, "No task at row {row}.")?,
        },
        Action::Edit(row, text) => match resolve_row(store, row) {
            Some(id) if store.get(&id).is_some_and(|task| task.completed) => {
                writeln!(out, "Reopen the task before editing it.")?;
            }
            Some(id) => {
                if !store.edit(&id, &text)? {
                    writeln!(out, "Task text cannot be blank.")?;
                }
            }
            None => writeln!(out, "No task at row {row}.")?,
        },
        Action::Remove(row) => match resolve_row(store, row) {
            Some(id) => store.remove(&id)?,
            None => writeln!(out, "No task at row {row}.")?,
        },
        Action::Undo => undo_latest(store, out)?,
    }

    let now = store.clock().now();
    for event in store.take_events() {
        if let Some(line) = render_event(&event, now, surface) {
            writeln!(out, "* {line}")?;
        }
    }
    for line in render_list(&store.tasks_newest_first(), store.count(), store.max()) {
        writeln!(out, "{line}")?;
    }
    Ok(Flow::Continue)
}

fn undo_latest<S, G, C, W>(store: &mut TaskStore<S, G, C>, out: &mut W) -> anyhow::Result<()>
where
    S: KeyValueStorage,
    G: TaskIdGenerator,
    C: Clock,
    W: Write,
{
    let Some(id) = store.latest_undoable().map(|(task, _)| task.id.clone()) else {
        writeln!(out, "Nothing to undo.")?;
        return Ok(());
    };
    match store.restore(&id)? {
        RestoreOutcome::Restored => {}
        RestoreOutcome::AtLimit => {
            writeln!(out, "Limit reached! Remove a task before restoring.")?;
        }
        RestoreOutcome::Expired | RestoreOutcome::NotPending => {
            writeln!(out, "Nothing to undo.")?;
        }
    }
    Ok(())
}

fn resolve_row<S, G, C>(store: &TaskStore<S, G, C>, row: usize) -> Option<TaskId>
where
    S: KeyValueStorage,
    G: TaskIdGenerator,
    C: Clock,
{
    store
        .tasks_newest_first()
        .get(row.checked_sub(1)?)
        .map(|task| task.id.clone())
}
