//! Command-line surface.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "taskflow")]
#[command(version)]
#[command(about = "A ten-slot to-do list that lives in your terminal")]
pub struct Args {
    /// SQLite file holding the task list
    #[arg(long, env = "TASKFLOW_DB", global = true)]
    pub db: Option<PathBuf>,

    /// trace|debug|info|warn|error (defaults by build mode)
    #[arg(long, env = "TASKFLOW_LOG_LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Absolute directory for rolling log files; logging is off when unset
    #[arg(long, env = "TASKFLOW_LOG_DIR", global = true)]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Rows are 1-based positions in the newest-first listing.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Show the task list
    List,
    /// Add a task
    Add {
        #[arg(required = true, num_args = 1.., allow_hyphen_values = true)]
        text: Vec<String>,
    },
    /// Mark a task done, or reopen it
    Toggle { row: usize },
    /// Replace a task's text
    Edit {
        row: usize,
        #[arg(required = true, num_args = 1.., allow_hyphen_values = true)]
        text: Vec<String>,
    },
    /// Delete a task (undo is only offered inside `shell`)
    Remove { row: usize },
    /// Interactive session (default)
    Shell,
}
