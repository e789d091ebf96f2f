//! `taskflow` binary.
//!
//! # Responsibility
//! - Resolve configuration from flags and environment.
//! - Open the durable slot storage and hand it to the task store.
//! - Dispatch one-shot subcommands or run the interactive shell.

mod args;
mod commands;
mod render;
mod shell;

use anyhow::{anyhow, Context};
use args::{Args, Command};
use clap::Parser;
use commands::{apply, Action};
use render::Surface;
use std::path::PathBuf;
use std::process::ExitCode;
use taskflow_core::db::open_db;
use taskflow_core::{
    default_log_level, init_logging, SqliteStorage, StoreConfig, SystemClock, TaskStore,
    TimestampIdGenerator,
};

const DB_DIR_NAME: &str = "taskflow";
const DB_FILE_NAME: &str = "taskflow.sqlite3";

fn main() -> ExitCode {
    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("taskflow: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    if let Some(log_dir) = &args.log_dir {
        let level = args.log_level.as_deref().unwrap_or(default_log_level());
        let log_dir = log_dir
            .to_str()
            .ok_or_else(|| anyhow!("log directory must be valid UTF-8"))?;
        init_logging(level, log_dir).map_err(|err| anyhow!("{err}"))?;
    }

    let db_path = match args.db {
        Some(path) => path,
        None => default_db_path()?,
    };
    let conn = open_db(&db_path)
        .with_context(|| format!("failed to open task database `{}`", db_path.display()))?;

    let mut store = TaskStore::open(
        SqliteStorage::new(&conn),
        StoreConfig::default(),
        TimestampIdGenerator::new(),
        SystemClock,
    )?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match args.command.unwrap_or(Command::Shell) {
        Command::Shell => {
            let stdin = std::io::stdin();
            shell::run_shell(&mut store, stdin.lock(), &mut out)
        }
        command => apply(&mut store, Action::from(command), Surface::OneShot, &mut out).map(|_| ()),
    }
}

fn default_db_path() -> anyhow::Result<PathBuf> {
    let data_dir = dirs::data_dir()
        .ok_or_else(|| anyhow!("cannot resolve a data directory; pass --db <path>"))?;
    Ok(data_dir.join(DB_DIR_NAME).join(DB_FILE_NAME))
}
