//! Background polling loop for reminders.
//!
//! # Responsibility
//! - Drive `ReminderEngine::tick` on a fixed interval from one thread.
//! - Relay ledger invalidations from the owner to the engine.
//!
//! # Invariants
//! - Ticks never overlap: the loop thread runs them one after another.
//! - Ticks start at a fixed rate of `poll_interval_ms`; tick duration does
//!   not stretch the period.
//! - Stopping (explicitly or by dropping the handle) joins the thread.
//! - A failing snapshot read skips that tick; the loop keeps running.

use super::config::ReminderConfig;
use super::engine::{ReminderEngine, TickReport};
use super::notify::{Notifier, Permission};
use crate::model::due::now_epoch_ms;
use crate::model::task::{Task, TaskId};
use crate::repo::task_repo::{RepoResult, SqliteTaskRepository, TaskRepository};
use log::{error, info, warn};
use rusqlite::Connection;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Instant;

/// Supplies the task snapshot for each tick.
pub trait TaskSource {
    fn reminder_snapshot(&mut self) -> RepoResult<Vec<Task>>;
}

/// Reads snapshots from an owned SQLite connection.
pub struct SqliteTaskSource {
    conn: Connection,
}

impl SqliteTaskSource {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }
}

impl TaskSource for SqliteTaskSource {
    fn reminder_snapshot(&mut self) -> RepoResult<Vec<Task>> {
        SqliteTaskRepository::new(&self.conn).list_reminder_candidates()
    }
}

enum Command {
    RemoveTask(TaskId),
    RestoreTask(TaskId),
    Stop,
}

/// Handle to a running poller. Dropping it stops the loop.
pub struct PollerHandle {
    commands: Sender<Command>,
    thread: Option<JoinHandle<()>>,
}

impl PollerHandle {
    /// Tells the engine a task was deleted or completed.
    pub fn remove_task(&self, task_id: TaskId) {
        let _ = self.commands.send(Command::RemoveTask(task_id));
    }

    /// Re-admits a task previously removed.
    pub fn restore_task(&self, task_id: TaskId) {
        let _ = self.commands.send(Command::RestoreTask(task_id));
    }

    /// Stops the loop and waits for the current tick to finish.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        let _ = self.commands.send(Command::Stop);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("event=poller_stop module=reminder status=error reason=tick_panicked");
            }
        }
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Spawns the polling loop.
pub struct Poller;

impl Poller {
    /// Starts ticking immediately, then once per `config.poll_interval()`.
    /// The config is normalized by `ReminderEngine::new`.
    ///
    /// `on_tick` observes every report; pass `|_| {}` when not needed.
    ///
    /// # Errors
    /// - Returns the OS error when the thread cannot be spawned.
    pub fn spawn<S, N, F>(
        config: ReminderConfig,
        source: S,
        notifier: N,
        on_tick: F,
    ) -> std::io::Result<PollerHandle>
    where
        S: TaskSource + Send + 'static,
        N: Notifier + Send + 'static,
        F: FnMut(&TickReport) + Send + 'static,
    {
        let (commands, inbox) = mpsc::channel();
        let thread = thread::Builder::new()
            .name("duetrack-reminders".to_string())
            .spawn(move || {
                let engine = ReminderEngine::new(config);
                run_loop(engine, source, notifier, inbox, on_tick)
            })?;

        Ok(PollerHandle {
            commands,
            thread: Some(thread),
        })
    }
}

fn run_loop<S, N, F>(
    mut engine: ReminderEngine,
    mut source: S,
    mut notifier: N,
    inbox: Receiver<Command>,
    mut on_tick: F,
) where
    S: TaskSource,
    N: Notifier,
    F: FnMut(&TickReport),
{
    let interval = engine.config().poll_interval();
    info!(
        "event=poller_start module=reminder status=ok interval_ms={} thresholds={}",
        interval.as_millis(),
        engine.config().thresholds.len()
    );

    if notifier.permission() == Permission::Undecided {
        let granted = notifier.request_permission();
        info!("event=notify_permission module=reminder status=ok permission={granted:?}");
    }

    let mut next_tick = Instant::now();
    loop {
        let wait = next_tick.saturating_duration_since(Instant::now());
        match inbox.recv_timeout(wait) {
            Ok(Command::RemoveTask(task_id)) => engine.remove_task(task_id),
            Ok(Command::RestoreTask(task_id)) => {
                engine.restore_task(task_id);
            }
            Ok(Command::Stop) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {
                match source.reminder_snapshot() {
                    Ok(snapshot) => {
                        let report = engine.tick(&snapshot, now_epoch_ms(), &mut notifier);
                        on_tick(&report);
                    }
                    Err(err) => warn!(
                        "event=reminder_tick module=reminder status=error error_code=snapshot_failed error={}",
                        err
                    ),
                }
                // Fixed rate; a tick that overran restarts the schedule
                // instead of bursting to catch up.
                next_tick += interval;
                let now = Instant::now();
                if next_tick < now {
                    next_tick = now;
                }
            }
        }
    }

    info!("event=poller_stop module=reminder status=ok");
}
