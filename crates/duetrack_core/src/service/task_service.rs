//! Task use-case service.
//!
//! # Responsibility
//! - Provide task entry points for the CLI and embedders.
//! - Own JSON export/import framing.
//!
//! # Invariants
//! - Service APIs never bypass repository validation.
//! - Import validates every record before writing any of them, and a
//!   failed write leaves the store as it was.

use crate::model::task::{Task, TaskCategory, TaskId};
use crate::repo::task_repo::{RepoError, TaskListQuery, TaskRepository};
use log::info;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

const EXPORT_FORMAT_VERSION: u32 = 1;

/// Service error for task use-cases.
#[derive(Debug)]
pub enum TaskServiceError {
    TaskNotFound(TaskId),
    Repo(RepoError),
    Import(serde_json::Error),
    UnsupportedExportVersion(u32),
    Export(serde_json::Error),
}

impl Display for TaskServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TaskNotFound(id) => write!(f, "task not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Import(err) => write!(f, "invalid import payload: {err}"),
            Self::UnsupportedExportVersion(version) => {
                write!(f, "unsupported export version {version}")
            }
            Self::Export(err) => write!(f, "failed to serialize tasks: {err}"),
        }
    }
}

impl Error for TaskServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Import(err) | Self::Export(err) => Some(err),
            Self::TaskNotFound(_) | Self::UnsupportedExportVersion(_) => None,
        }
    }
}

impl From<RepoError> for TaskServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::TaskNotFound(id),
            other => Self::Repo(other),
        }
    }
}

pub type ServiceResult<T> = Result<T, TaskServiceError>;

/// Input for creating a task.
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: String,
    pub due_at: Option<i64>,
    pub due_timezone: Option<String>,
    pub client: Option<String>,
    pub category: TaskCategory,
}

/// Counts from an import run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub created: usize,
    pub updated: usize,
}

#[derive(Serialize, Deserialize)]
struct ExportDocument {
    version: u32,
    tasks: Vec<Task>,
}

/// Use-case service wrapper over a task repository.
pub struct TaskService<R: TaskRepository> {
    repo: R,
}

impl<R: TaskRepository> TaskService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates and persists a task, returning its new ID.
    pub fn add_task(&self, input: NewTask) -> ServiceResult<TaskId> {
        let mut task = Task::new(input.title);
        task.due_at = input.due_at;
        task.due_timezone = input.due_timezone;
        task.client = input.client;
        task.category = input.category;
        let id = self.repo.create_task(&task)?;
        info!(
            "event=task_add module=service status=ok task_id={} has_due={}",
            id,
            task.due_at.is_some()
        );
        Ok(id)
    }

    pub fn get(&self, id: TaskId) -> ServiceResult<Task> {
        self.repo
            .get_task(id)?
            .ok_or(TaskServiceError::TaskNotFound(id))
    }

    pub fn list(&self, query: &TaskListQuery) -> ServiceResult<Vec<Task>> {
        Ok(self.repo.list_tasks(query)?)
    }

    /// Sets or moves the due date. Reminder state follows on the next tick.
    pub fn set_due(&self, id: TaskId, due_at: i64, timezone: Option<String>) -> ServiceResult<Task> {
        self.modify(id, |task| {
            task.due_at = Some(due_at);
            task.due_timezone = timezone;
        })
    }

    pub fn clear_due(&self, id: TaskId) -> ServiceResult<Task> {
        self.modify(id, |task| {
            task.due_at = None;
            task.due_timezone = None;
        })
    }

    pub fn complete(&self, id: TaskId) -> ServiceResult<Task> {
        self.modify(id, |task| task.completed = true)
    }

    pub fn reopen(&self, id: TaskId) -> ServiceResult<Task> {
        self.modify(id, |task| task.completed = false)
    }

    pub fn delete(&self, id: TaskId) -> ServiceResult<()> {
        self.repo.delete_task(id)?;
        info!("event=task_delete module=service status=ok task_id={id}");
        Ok(())
    }

    /// Incomplete tasks with a due date, ready for a reminder tick.
    pub fn reminder_snapshot(&self) -> ServiceResult<Vec<Task>> {
        Ok(self.repo.list_reminder_candidates()?)
    }

    /// Serializes all tasks, completed included, as pretty JSON.
    pub fn export_json(&self) -> ServiceResult<String> {
        let tasks = self.repo.list_tasks(&TaskListQuery {
            include_completed: true,
            ..TaskListQuery::default()
        })?;
        let document = ExportDocument {
            version: EXPORT_FORMAT_VERSION,
            tasks,
        };
        serde_json::to_string_pretty(&document).map_err(TaskServiceError::Export)
    }

    /// Upserts tasks from an `export_json` document, matching by ID, in a
    /// single transaction.
    pub fn import_json(&self, text: &str) -> ServiceResult<ImportSummary> {
        let document: ExportDocument =
            serde_json::from_str(text).map_err(TaskServiceError::Import)?;
        if document.version != EXPORT_FORMAT_VERSION {
            return Err(TaskServiceError::UnsupportedExportVersion(document.version));
        }

        let (created, updated) = self.repo.upsert_tasks(&document.tasks)?;
        let summary = ImportSummary { created, updated };

        info!(
            "event=task_import module=service status=ok created={} updated={}",
            summary.created, summary.updated
        );
        Ok(summary)
    }

    fn modify(&self, id: TaskId, change: impl FnOnce(&mut Task)) -> ServiceResult<Task> {
        let mut task = self.get(id)?;
        change(&mut task);
        self.repo.update_task(&task)?;
        Ok(task)
    }
}
