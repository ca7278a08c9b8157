//! Reminder tick algorithm.
//!
//! # Responsibility
//! - Evaluate every reminder candidate against the thresholds.
//! - Route fresh `(task, window)` pairs to the notifier and record them.
//!
//! # Invariants
//! - Per task, pruning happens before any firing check in the same tick.
//! - Thresholds are checked in descending window order.
//! - A pair is recorded once dispatch was attempted, even if it failed.
//! - Without granted permission the tick leaves the ledger untouched.
//! - A tick is synchronous; dispatch never suspends it.

use super::config::ReminderConfig;
use super::ledger::DedupLedger;
use super::notify::{dedup_tag, NotificationRequest, Notifier, Permission};
use super::threshold::{minutes_remaining, thresholds_in_window};
use crate::model::due::format_due_at;
use crate::model::task::{Task, TaskId};
use log::{debug, info, warn};
use std::collections::HashSet;

/// One reminder dispatched during a tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FiredReminder {
    pub task_id: TaskId,
    pub window_minutes: u32,
    pub delivered: bool,
}

/// Outcome summary of a single tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub evaluated: usize,
    pub fired: Vec<FiredReminder>,
    pub pruned: Vec<TaskId>,
    pub failed_dispatches: usize,
    pub skipped_no_permission: bool,
}

/// Owns the dedup ledger and applies the tick protocol.
#[derive(Debug)]
pub struct ReminderEngine {
    config: ReminderConfig,
    ledger: DedupLedger,
}

impl ReminderEngine {
    /// Thresholds are re-sorted descending, so an unvalidated config still
    /// fires in the right order.
    pub fn new(config: ReminderConfig) -> Self {
        Self {
            config: config.normalized(),
            ledger: DedupLedger::new(),
        }
    }

    pub fn config(&self) -> &ReminderConfig {
        &self.config
    }

    pub fn ledger(&self) -> &DedupLedger {
        &self.ledger
    }

    /// Invalidates a deleted or completed task.
    pub fn remove_task(&mut self, task_id: TaskId) {
        self.ledger.remove_task(task_id);
    }

    /// Re-admits a task previously passed to `remove_task`.
    pub fn restore_task(&mut self, task_id: TaskId) -> bool {
        self.ledger.restore_task(task_id)
    }

    /// Runs one tick over `snapshot` at `now_ms`.
    ///
    /// Tasks that are completed or undated are ignored. After evaluation,
    /// ledger entries for tasks missing from the snapshot are dropped.
    pub fn tick<N: Notifier + ?Sized>(
        &mut self,
        snapshot: &[Task],
        now_ms: i64,
        notifier: &mut N,
    ) -> TickReport {
        let mut report = TickReport::default();

        let permission = notifier.permission();
        if permission != Permission::Granted {
            debug!(
                "event=reminder_tick module=reminder status=skipped reason=permission permission={:?}",
                permission
            );
            report.skipped_no_permission = true;
            return report;
        }

        let far_cutoff = self.config.far_cutoff_minutes();
        let mut active = HashSet::with_capacity(snapshot.len());

        for task in snapshot.iter().filter(|task| task.is_reminder_candidate()) {
            let Some(due_at) = task.due_at else {
                continue;
            };
            active.insert(task.id);
            report.evaluated += 1;

            let remaining = minutes_remaining(now_ms, due_at);
            if remaining > i64::from(far_cutoff) {
                if self.ledger.prune(task.id, remaining, far_cutoff) {
                    report.pruned.push(task.id);
                }
                continue;
            }

            for threshold in thresholds_in_window(&self.config.thresholds, now_ms, task.due_at) {
                if !self.ledger.should_fire(task.id, threshold.window_minutes) {
                    continue;
                }

                let request =
                    build_request(task, due_at, &threshold.label, threshold.window_minutes);
                let delivered = match notifier.notify(&request) {
                    Ok(()) => true,
                    Err(err) => {
                        warn!(
                            "event=notify module=reminder status=error task_id={} window_minutes={} error={}",
                            task.id, threshold.window_minutes, err
                        );
                        report.failed_dispatches += 1;
                        false
                    }
                };
                self.ledger.record(task.id, threshold.window_minutes);
                report.fired.push(FiredReminder {
                    task_id: task.id,
                    window_minutes: threshold.window_minutes,
                    delivered,
                });
            }
        }

        let dropped = self.ledger.retain_tasks(|task_id| active.contains(task_id));

        if !report.fired.is_empty() || !report.pruned.is_empty() || dropped > 0 {
            info!(
                "event=reminder_tick module=reminder status=ok evaluated={} fired={} failed={} pruned={} dropped={}",
                report.evaluated,
                report.fired.len(),
                report.failed_dispatches,
                report.pruned.len(),
                dropped
            );
        }

        report
    }
}

fn build_request(
    task: &Task,
    due_at: i64,
    label: &str,
    window_minutes: u32,
) -> NotificationRequest {
    let mut body = format!("{} is due at {}", task.title, format_due_at(due_at));
    if let Some(client) = task.client.as_deref() {
        body.push_str(&format!(" (client: {client})"));
    }
    NotificationRequest {
        title: format!("Task due in {label}"),
        body,
        dedup_tag: dedup_tag(task.id, window_minutes),
    }
}
