//! Notification capability seam.
//!
//! # Responsibility
//! - Describe one reminder dispatch (`NotificationRequest`).
//! - Abstract the platform channel behind the `Notifier` trait.
//!
//! # Invariants
//! - `dedup_tag` is `task-{id}-{window_minutes}` so platforms that collapse
//!   by tag drop duplicates too.
//! - Dispatch is fire-and-forget; callers never retry within a tick.

use crate::model::task::TaskId;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Permission state of the notification channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Granted,
    Denied,
    /// Never asked yet.
    Undecided,
}

/// One reminder to display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationRequest {
    pub title: String,
    pub body: String,
    pub dedup_tag: String,
}

/// Builds the platform collapse tag for a reminder pair.
pub fn dedup_tag(task_id: TaskId, window_minutes: u32) -> String {
    format!("task-{task_id}-{window_minutes}")
}

/// Delivery failure reported by a notifier.
#[derive(Debug)]
pub enum NotifyError {
    PermissionRevoked,
    Platform(String),
}

impl Display for NotifyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PermissionRevoked => write!(f, "notification permission revoked"),
            Self::Platform(message) => write!(f, "notification platform error: {message}"),
        }
    }
}

impl Error for NotifyError {}

/// Notification channel used by the reminder engine.
pub trait Notifier {
    fn permission(&self) -> Permission;
    /// Asks the user for permission and returns the resulting state.
    fn request_permission(&mut self) -> Permission;
    fn notify(&mut self, request: &NotificationRequest) -> Result<(), NotifyError>;
}

impl<N: Notifier + ?Sized> Notifier for Box<N> {
    fn permission(&self) -> Permission {
        (**self).permission()
    }

    fn request_permission(&mut self) -> Permission {
        (**self).request_permission()
    }

    fn notify(&mut self, request: &NotificationRequest) -> Result<(), NotifyError> {
        (**self).notify(request)
    }
}

/// Writes reminders to stdout. Always granted.
#[derive(Debug, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn permission(&self) -> Permission {
        Permission::Granted
    }

    fn request_permission(&mut self) -> Permission {
        Permission::Granted
    }

    fn notify(&mut self, request: &NotificationRequest) -> Result<(), NotifyError> {
        println!("[reminder] {} - {}", request.title, request.body);
        info!(
            "event=notify module=reminder status=ok channel=console tag={}",
            request.dedup_tag
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::dedup_tag;
    use uuid::Uuid;

    #[test]
    fn dedup_tag_is_deterministic() {
        let id = Uuid::parse_str("11111111-2222-4333-8444-555555555555").unwrap();
        assert_eq!(
            dedup_tag(id, 120),
            "task-11111111-2222-4333-8444-555555555555-120"
        );
        assert_eq!(dedup_tag(id, 120), dedup_tag(id, 120));
    }
}
