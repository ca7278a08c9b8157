//! Dedup ledger.
//!
//! # Responsibility
//! - Remember which `(task, window)` reminders already fired.
//! - Forget them when a task moves past the far cutoff or leaves the
//!   active set.
//!
//! # Invariants
//! - A present pair blocks `should_fire` for that pair.
//! - A task removed via `remove_task` never fires again in this process
//!   unless `restore_task` is called for it.
//! - State is in-memory only; a fresh ledger starts empty.

use crate::model::task::TaskId;
use log::debug;
use std::collections::{HashMap, HashSet};

/// Set of reminder pairs that already fired, grouped by task.
#[derive(Debug, Default)]
pub struct DedupLedger {
    fired: HashMap<TaskId, HashSet<u32>>,
    removed: HashSet<TaskId>,
}

impl DedupLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// True iff the pair has not fired and the task was not removed.
    pub fn should_fire(&self, task_id: TaskId, window_minutes: u32) -> bool {
        if self.removed.contains(&task_id) {
            return false;
        }
        !self
            .fired
            .get(&task_id)
            .is_some_and(|windows| windows.contains(&window_minutes))
    }

    /// Marks the pair as fired. Idempotent.
    pub fn record(&mut self, task_id: TaskId, window_minutes: u32) {
        self.fired.entry(task_id).or_default().insert(window_minutes);
    }

    /// Drops every entry of `task_id` when it is further out than
    /// `far_cutoff_minutes`. Returns whether anything was removed.
    pub fn prune(
        &mut self,
        task_id: TaskId,
        minutes_remaining: i64,
        far_cutoff_minutes: u32,
    ) -> bool {
        if minutes_remaining <= i64::from(far_cutoff_minutes) {
            return false;
        }
        let pruned = self.fired.remove(&task_id).is_some();
        if pruned {
            debug!(
                "event=ledger_prune module=reminder status=ok task_id={} minutes_remaining={}",
                task_id, minutes_remaining
            );
        }
        pruned
    }

    /// Forgets a deleted or completed task and blocks it from firing again.
    pub fn remove_task(&mut self, task_id: TaskId) {
        self.fired.remove(&task_id);
        self.removed.insert(task_id);
    }

    /// Lifts a `remove_task` block (e.g. a completed task was reopened).
    pub fn restore_task(&mut self, task_id: TaskId) -> bool {
        self.removed.remove(&task_id)
    }

    /// Keeps fired entries only for tasks `keep` accepts. Removal blocks are
    /// left alone. Returns the number of tasks dropped.
    pub fn retain_tasks(&mut self, mut keep: impl FnMut(&TaskId) -> bool) -> usize {
        let before = self.fired.len();
        self.fired.retain(|task_id, _| keep(task_id));
        before - self.fired.len()
    }

    /// Number of fired `(task, window)` pairs.
    pub fn len(&self) -> usize {
        self.fired.values().map(HashSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.fired.is_empty()
    }

    pub fn is_removed(&self, task_id: TaskId) -> bool {
        self.removed.contains(&task_id)
    }
}

#[cfg(test)]
mod tests {
    use super::DedupLedger;
    use uuid::Uuid;

    #[test]
    fn record_blocks_only_the_recorded_pair() {
        let mut ledger = DedupLedger::new();
        let task = Uuid::new_v4();

        assert!(ledger.should_fire(task, 60));
        ledger.record(task, 60);
        ledger.record(task, 60);

        assert!(!ledger.should_fire(task, 60));
        assert!(ledger.should_fire(task, 30));
        assert!(ledger.should_fire(Uuid::new_v4(), 60));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn prune_clears_all_windows_only_beyond_cutoff() {
        let mut ledger = DedupLedger::new();
        let task = Uuid::new_v4();
        ledger.record(task, 30);
        ledger.record(task, 10);

        assert!(!ledger.prune(task, 300, 300));
        assert_eq!(ledger.len(), 2);

        assert!(ledger.prune(task, 301, 300));
        assert!(ledger.is_empty());
        assert!(ledger.should_fire(task, 30));
        assert!(ledger.should_fire(task, 10));
    }

    #[test]
    fn removed_task_stays_blocked_until_restored() {
        let mut ledger = DedupLedger::new();
        let task = Uuid::new_v4();
        ledger.record(task, 120);

        ledger.remove_task(task);
        assert!(ledger.is_empty());
        assert!(!ledger.should_fire(task, 120));
        assert!(!ledger.should_fire(task, 10));

        assert!(ledger.restore_task(task));
        assert!(ledger.should_fire(task, 120));
    }

    #[test]
    fn retain_tasks_drops_entries_but_keeps_removal_blocks() {
        let mut ledger = DedupLedger::new();
        let kept = Uuid::new_v4();
        let gone = Uuid::new_v4();
        let removed = Uuid::new_v4();
        ledger.record(kept, 60);
        ledger.record(gone, 60);
        ledger.remove_task(removed);

        let dropped = ledger.retain_tasks(|id| *id == kept);

        assert_eq!(dropped, 1);
        assert!(!ledger.should_fire(kept, 60));
        assert!(ledger.should_fire(gone, 60));
        assert!(ledger.is_removed(removed));
    }
}
