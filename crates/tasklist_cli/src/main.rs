//! Command-line front end for the task list core.
//!
//! # Responsibility
//! - Drive `TaskStore` against the same SQLite file the app uses.
//! - Keep output line-oriented and deterministic for scripting.

use clap::{Parser, Subcommand, ValueEnum};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tasklist_core::reminder::sqlite_scheduler::now_epoch_ms;
use tasklist_core::{
    default_log_level, init_logging, Priority, SqliteKeyValueStore, SqliteReminderScheduler, Task,
    TaskId, TaskStore,
};

/// Task list CLI
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to database file
    #[arg(long, env = "TASKLIST_DB_PATH", default_value = "tasklist.sqlite3", global = true)]
    db: PathBuf,

    /// Absolute directory for rolling log files (logging is off when unset)
    #[arg(long, global = true)]
    log_dir: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PriorityArg {
    Low,
    Medium,
    High,
}

impl From<PriorityArg> for Priority {
    fn from(value: PriorityArg) -> Self {
        match value {
            PriorityArg::Low => Priority::Low,
            PriorityArg::Medium => Priority::Medium,
            PriorityArg::High => Priority::High,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print every task in display order
    List,
    /// Add a task
    Add { text: String },
    /// Replace the text of a task
    Edit { id: TaskId, text: String },
    /// Set the priority of a task
    Priority {
        id: TaskId,
        #[arg(value_enum)]
        level: PriorityArg,
    },
    /// Advance priority low -> medium -> high -> low
    Cycle { id: TaskId },
    /// Flip completion of a task
    Toggle { id: TaskId },
    /// Delete a task
    Remove { id: TaskId },
    /// Print and drain reminders whose delay has elapsed
    Due,
    /// Linkage probe
    Ping,
}

type CliStore = TaskStore<SqliteKeyValueStore, SqliteReminderScheduler>;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Some(log_dir) = cli.log_dir.as_deref() {
        if let Err(err) = init_logging(default_log_level(), log_dir) {
            eprintln!("warning: {err}");
        }
    }

    if matches!(cli.command, Command::Ping) {
        println!("tasklist_core ping={}", tasklist_core::ping());
        println!("tasklist_core version={}", tasklist_core::core_version());
        return ExitCode::SUCCESS;
    }

    let mut store = match open_store(&cli.db) {
        Ok(store) => store,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };
    if let Some(warning) = store.startup_warning() {
        eprintln!("warning: {warning}");
    }

    let mut stdout = io::stdout().lock();
    match run(&mut store, cli.command, &mut stdout) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn open_store(db: &Path) -> Result<CliStore, String> {
    let storage = SqliteKeyValueStore::open(db).map_err(|err| err.to_string())?;
    let scheduler = SqliteReminderScheduler::open(db).map_err(|err| err.to_string())?;
    let mut store = TaskStore::new(storage, scheduler);
    store.load();
    Ok(store)
}

fn run(store: &mut CliStore, command: Command, out: &mut impl Write) -> Result<(), String> {
    match command {
        Command::List | Command::Ping => {}
        Command::Add { text } => {
            store.add(&text).ok_or("task text is empty")?;
        }
        Command::Edit { id, text } => {
            if !store.commit_edit(id, &text) {
                return Err(format!("cannot edit {id}: unknown id or empty text"));
            }
        }
        Command::Priority { id, level } => {
            if !store.set_priority(id, level.into()) {
                return Err(not_found(id));
            }
        }
        Command::Cycle { id } => {
            store.cycle_priority(id).ok_or_else(|| not_found(id))?;
        }
        Command::Toggle { id } => {
            store.toggle_completed(id).ok_or_else(|| not_found(id))?;
        }
        Command::Remove { id } => {
            store.remove(id).ok_or_else(|| not_found(id))?;
        }
        Command::Due => {
            let due = store
                .take_due_reminders(now_epoch_ms())
                .map_err(|err| err.to_string())?;
            for reminder in due {
                writeln!(out, "{}: {}", reminder.title, reminder.body).map_err(write_error)?;
            }
            return Ok(());
        }
    }

    for task in store.tasks() {
        writeln!(out, "{}", format_task(task)).map_err(write_error)?;
    }
    Ok(())
}

fn format_task(task: &Task) -> String {
    format!(
        "[{}] {} ({}) {}",
        if task.completed { 'x' } else { ' ' },
        task.id,
        task.priority,
        task.text
    )
}

fn not_found(id: TaskId) -> String {
    format!("task not found: {id}")
}

fn write_error(err: io::Error) -> String {
    format!("failed to write output: {err}")
}
