//! DueTrack command-line entry point.
//!
//! # Responsibility
//! - Expose task management over the local SQLite store.
//! - Run the reminder poller in the foreground (`watch`).

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use duetrack_core::db::open_db;
use duetrack_core::{
    format_due_at, now_epoch_ms, parse_due_at, ConsoleNotifier, Countdown, NewTask, Poller,
    ReminderConfig, SqliteTaskRepository, SqliteTaskSource, TaskCategory, TaskListQuery,
    TaskService,
};
use log::info;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "duetrack", version, about = "Task tracking with due-date reminders")]
struct Cli {
    /// SQLite database file.
    #[arg(long, global = true, default_value = "duetrack.db")]
    db: PathBuf,

    /// Directory for rolling log files (defaults to ./logs).
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Add a task.
    Add(AddArgs),
    /// List open tasks with countdowns.
    List {
        /// Include completed tasks.
        #[arg(long)]
        all: bool,
        #[arg(long)]
        client: Option<String>,
    },
    /// Set or move a due date (RFC 3339, epoch ms, or +1h30m).
    Due {
        id: Uuid,
        when: String,
        #[arg(long)]
        tz: Option<String>,
    },
    /// Remove a due date.
    ClearDue { id: Uuid },
    /// Mark a task completed.
    Done { id: Uuid },
    /// Reopen a completed task.
    Reopen { id: Uuid },
    /// Delete a task.
    Rm { id: Uuid },
    /// Write all tasks as JSON to stdout or a file.
    Export {
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Upsert tasks from an export file.
    Import { file: PathBuf },
    /// Run reminders until stdin closes or `q` is entered.
    Watch {
        /// JSON reminder config (poll interval, thresholds, far cutoff).
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Args)]
struct AddArgs {
    title: String,
    #[arg(long)]
    due: Option<String>,
    #[arg(long)]
    tz: Option<String>,
    #[arg(long)]
    client: Option<String>,
    #[arg(long)]
    business: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_cli_logging(&cli)?;

    match cli.command {
        Command::Watch { config } => watch(&cli.db, config),
        command => run_task_command(&cli.db, command),
    }
}

fn init_cli_logging(cli: &Cli) -> Result<()> {
    let log_dir = match &cli.log_dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir()?.join("logs"),
    };
    let log_dir = std::path::absolute(&log_dir).context("resolving log directory")?;
    let level = cli
        .log_level
        .as_deref()
        .unwrap_or_else(|| duetrack_core::default_log_level());
    duetrack_core::init_logging(level, &log_dir.to_string_lossy())?;
    Ok(())
}

fn run_task_command(db: &Path, command: Command) -> Result<()> {
    let conn = open_db(db).with_context(|| format!("opening {}", db.display()))?;
    let service = TaskService::new(SqliteTaskRepository::new(&conn));
    let now = now_epoch_ms();

    match command {
        Command::Add(args) => {
            let due_at = args
                .due
                .as_deref()
                .map(|when| parse_due_at(when, now))
                .transpose()?;
            let id = service.add_task(NewTask {
                title: args.title,
                due_at,
                due_timezone: args.tz,
                client: args.client,
                category: if args.business {
                    TaskCategory::Business
                } else {
                    TaskCategory::Personal
                },
            })?;
            println!("{id}");
        }
        Command::List { all, client } => {
            let tasks = service.list(&TaskListQuery {
                include_completed: all,
                client,
                ..TaskListQuery::default()
            })?;
            for task in tasks {
                let due = match task.due_at {
                    Some(due_at) => format!(
                        "{} ({})",
                        format_due_at(due_at),
                        Countdown::between(now, due_at)
                    ),
                    None => "no due date".to_string(),
                };
                let mark = if task.completed { "x" } else { " " };
                let client = task
                    .client
                    .as_deref()
                    .map(|c| format!(" [{c}]"))
                    .unwrap_or_default();
                println!(
                    "[{mark}] {} {}{} - {} - {}",
                    task.id,
                    task.title,
                    client,
                    task.category.as_str(),
                    due
                );
            }
        }
        Command::Due { id, when, tz } => {
            let due_at = parse_due_at(&when, now)?;
            let task = service.set_due(id, due_at, tz)?;
            println!("{} due {}", task.id, format_due_at(due_at));
        }
        Command::ClearDue { id } => {
            service.clear_due(id)?;
        }
        Command::Done { id } => {
            service.complete(id)?;
        }
        Command::Reopen { id } => {
            service.reopen(id)?;
        }
        Command::Rm { id } => service.delete(id)?,
        Command::Export { out } => {
            let json = service.export_json()?;
            match out {
                Some(path) => std::fs::write(&path, json)
                    .with_context(|| format!("writing {}", path.display()))?,
                None => println!("{json}"),
            }
        }
        Command::Import { file } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let summary = service.import_json(&text)?;
            println!("created={} updated={}", summary.created, summary.updated);
        }
        Command::Watch { .. } => bail!("watch is handled separately"),
    }

    Ok(())
}

fn watch(db: &Path, config: Option<PathBuf>) -> Result<()> {
    let config = match config {
        Some(path) => ReminderConfig::load_json(&path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => ReminderConfig::default().validate()?,
    };
    let conn = open_db(db).with_context(|| format!("opening {}", db.display()))?;

    println!(
        "watching {} every {}s; `forget <id>` / `restore <id>` adjust reminders, `q` stops",
        db.display(),
        config.poll_interval().as_secs()
    );
    let handle = Poller::spawn(config, SqliteTaskSource::new(conn), ConsoleNotifier, |_| {})?;

    for line in std::io::stdin().lock().lines() {
        let line = line?;
        let mut words = line.split_whitespace();
        match (words.next(), words.next()) {
            (Some("q"), None) => break,
            (Some("forget"), Some(id)) => match Uuid::parse_str(id) {
                Ok(id) => handle.remove_task(id),
                Err(err) => eprintln!("invalid task id {id}: {err}"),
            },
            (Some("restore"), Some(id)) => match Uuid::parse_str(id) {
                Ok(id) => handle.restore_task(id),
                Err(err) => eprintln!("invalid task id {id}: {err}"),
            },
            (None, _) => {}
            _ => eprintln!("commands: forget <id>, restore <id>, q"),
        }
    }

    handle.stop();
    info!("event=watch_stop module=cli status=ok");
    Ok(())
}
