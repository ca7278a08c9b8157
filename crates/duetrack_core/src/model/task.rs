//! Task domain model.
//!
//! # Responsibility
//! - Define the canonical task record shared by storage, reminders and CLI.
//! - Validate task fields before they cross a persistence or import boundary.
//!
//! # Invariants
//! - `id` is stable and never reused for another task.
//! - `due_at` is UTC epoch milliseconds; absence means no reminder applies.
//! - `title` is never blank.
//!
//! # See also
//! - crate::reminder for how `due_at` drives notifications.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for a task.
pub type TaskId = Uuid;

/// Coarse grouping used by list filters and exports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskCategory {
    #[default]
    Personal,
    Business,
}

impl TaskCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Personal => "personal",
            Self::Business => "business",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "personal" => Some(Self::Personal),
            "business" => Some(Self::Business),
            _ => None,
        }
    }
}

/// Validation failures for task records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskValidationError {
    NilId,
    BlankTitle,
    NegativeDueAt(i64),
    BlankClient,
    BlankTimezone,
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilId => write!(f, "task id must not be nil"),
            Self::BlankTitle => write!(f, "task title must not be blank"),
            Self::NegativeDueAt(value) => write!(f, "due_at ({value}) must be >= 0"),
            Self::BlankClient => write!(f, "client must be omitted rather than blank"),
            Self::BlankTimezone => write!(f, "due_timezone must be omitted rather than blank"),
        }
    }
}

impl Error for TaskValidationError {}

/// Canonical task record.
///
/// Deserialization goes through [`Task::validate`], so imported payloads
/// cannot smuggle an invalid task past the boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TaskWire")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    /// UTC epoch milliseconds.
    pub due_at: Option<i64>,
    /// Display-only zone label recorded alongside the due date.
    pub due_timezone: Option<String>,
    pub client: Option<String>,
    pub category: TaskCategory,
    pub completed: bool,
}

#[derive(Deserialize)]
struct TaskWire {
    id: TaskId,
    title: String,
    #[serde(default)]
    due_at: Option<i64>,
    #[serde(default)]
    due_timezone: Option<String>,
    #[serde(default)]
    client: Option<String>,
    #[serde(default)]
    category: TaskCategory,
    #[serde(default)]
    completed: bool,
}

impl TryFrom<TaskWire> for Task {
    type Error = TaskValidationError;

    fn try_from(wire: TaskWire) -> Result<Self, Self::Error> {
        let task = Self {
            id: wire.id,
            title: wire.title,
            due_at: wire.due_at,
            due_timezone: wire.due_timezone,
            client: wire.client,
            category: wire.category,
            completed: wire.completed,
        };
        task.validate()?;
        Ok(task)
    }
}

impl Task {
    /// Creates an incomplete personal task with a generated ID and no due date.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            due_at: None,
            due_timezone: None,
            client: None,
            category: TaskCategory::Personal,
            completed: false,
        }
    }

    /// Creates a task with a caller-provided ID (import paths).
    pub fn with_id(id: TaskId, title: impl Into<String>) -> Result<Self, TaskValidationError> {
        if id.is_nil() {
            return Err(TaskValidationError::NilId);
        }
        let mut task = Self::new(title);
        task.id = id;
        Ok(task)
    }

    /// Builder-style due date setter, mostly for tests and imports.
    pub fn due(mut self, due_at: i64) -> Self {
        self.due_at = Some(due_at);
        self
    }

    /// Checks field-level invariants.
    ///
    /// # Errors
    /// - Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        if self.id.is_nil() {
            return Err(TaskValidationError::NilId);
        }
        if self.title.trim().is_empty() {
            return Err(TaskValidationError::BlankTitle);
        }
        if let Some(due_at) = self.due_at {
            if due_at < 0 {
                return Err(TaskValidationError::NegativeDueAt(due_at));
            }
        }
        if self.client.as_deref().is_some_and(|c| c.trim().is_empty()) {
            return Err(TaskValidationError::BlankClient);
        }
        if self
            .due_timezone
            .as_deref()
            .is_some_and(|tz| tz.trim().is_empty())
        {
            return Err(TaskValidationError::BlankTimezone);
        }
        Ok(())
    }

    /// Whether the reminder engine should look at this task at all.
    pub fn is_reminder_candidate(&self) -> bool {
        !self.completed && self.due_at.is_some()
    }
}
