//! Line-oriented interactive session.
//!
//! The session keeps one `TaskStore` alive, which is what makes `undo`
//! possible: pending removals live in memory only.

use crate::commands::{apply, parse_line, Action, Flow, HELP};
use crate::render::Surface;
use std::io::{BufRead, Write};
use taskflow_core::{Clock, KeyValueStorage, TaskIdGenerator, TaskStore};

const PROMPT: &str = "taskflow> ";

pub fn run_shell<S, G, C, R, W>(
    store: &mut TaskStore<S, G, C>,
    input: R,
    out: &mut W,
) -> anyhow::Result<()>
where
    S: KeyValueStorage,
    G: TaskIdGenerator,
    C: Clock,
    R: BufRead,
    W: Write,
{
    writeln!(out, "{HELP}")?;
    apply(store, Action::List, Surface::Shell, out)?;

    let mut lines = input.lines();
    loop {
        write!(out, "{PROMPT}")?;
        out.flush()?;

        let Some(line) = lines.next() else {
            writeln!(out)?;
            break;
        };
        match parse_line(&line?) {
            Ok(None) => {}
            Ok(Some(action)) => {
                if apply(store, action, Surface::Shell, out)? == Flow::Quit {
                    break;
                }
            }
            Err(message) => writeln!(out, "{message}")?,
        }
    }

    log::debug!("event=shell_exit module=cli status=ok count={}", store.count());
    Ok(())
}
