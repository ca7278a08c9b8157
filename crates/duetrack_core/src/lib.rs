//! Core domain logic for DueTrack.
//! This crate is the single source of truth for task and reminder invariants.

pub mod countdown;
pub mod db;
pub mod logging;
pub mod model;
pub mod reminder;
pub mod repo;
pub mod service;

pub use countdown::Countdown;
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::due::{format_due_at, now_epoch_ms, parse_due_at, DueParseError};
pub use model::task::{Task, TaskCategory, TaskId, TaskValidationError};
pub use reminder::config::{ConfigError, FarCutoff, ReminderConfig};
pub use reminder::engine::{FiredReminder, ReminderEngine, TickReport};
pub use reminder::ledger::DedupLedger;
pub use reminder::notify::{
    ConsoleNotifier, NotificationRequest, Notifier, NotifyError, Permission,
};
pub use reminder::poller::{Poller, PollerHandle, SqliteTaskSource, TaskSource};
pub use reminder::threshold::{default_thresholds, Threshold};
pub use repo::task_repo::{
    RepoError, RepoResult, SqliteTaskRepository, TaskListQuery, TaskRepository,
};
pub use service::task_service::{ImportSummary, NewTask, TaskService, TaskServiceError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
