//! Task repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide stable CRUD APIs over the `tasks` table.
//! - Produce the reminder snapshot (incomplete, due-dated tasks).
//!
//! # Invariants
//! - Write paths call `Task::validate()` before SQL mutations.
//! - Read paths reject invalid persisted state instead of masking it.
//! - Reminder snapshots are ordered by `due_at ASC, id ASC`.
//! - `upsert_tasks` writes all records or none.

use crate::db::DbError;
use crate::model::task::{Task, TaskCategory, TaskId, TaskValidationError};
use rusqlite::types::Value;
use rusqlite::{
    params, params_from_iter, Connection, OptionalExtension, Row, Transaction, TransactionBehavior,
};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const TASK_SELECT_SQL: &str = "SELECT
    id,
    title,
    due_at,
    due_timezone,
    client,
    category,
    completed
FROM tasks";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for task persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(TaskValidationError),
    Db(DbError),
    NotFound(TaskId),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "task not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted task data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<TaskValidationError> for RepoError {
    fn from(value: TaskValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Filter options for listing tasks.
#[derive(Debug, Clone, Default)]
pub struct TaskListQuery {
    pub include_completed: bool,
    pub category: Option<TaskCategory>,
    pub client: Option<String>,
    pub limit: Option<u32>,
}

/// Repository interface for task persistence.
pub trait TaskRepository {
    fn create_task(&self, task: &Task) -> RepoResult<TaskId>;
    fn update_task(&self, task: &Task) -> RepoResult<()>;
    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>>;
    fn list_tasks(&self, query: &TaskListQuery) -> RepoResult<Vec<Task>>;
    fn delete_task(&self, id: TaskId) -> RepoResult<()>;
    /// Incomplete tasks that carry a due date.
    fn list_reminder_candidates(&self) -> RepoResult<Vec<Task>>;
    /// Inserts or replaces each task by ID in one unit. Returns
    /// `(created, updated)`.
    fn upsert_tasks(&self, tasks: &[Task]) -> RepoResult<(usize, usize)>;
}

/// SQLite-backed task repository.
pub struct SqliteTaskRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTaskRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl TaskRepository for SqliteTaskRepository<'_> {
    fn create_task(&self, task: &Task) -> RepoResult<TaskId> {
        task.validate()?;
        insert_row(self.conn, task)?;
        Ok(task.id)
    }

    fn update_task(&self, task: &Task) -> RepoResult<()> {
        task.validate()?;

        if update_row(self.conn, task)? == 0 {
            return Err(RepoError::NotFound(task.id));
        }

        Ok(())
    }

    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TASK_SELECT_SQL} WHERE id = ?1;"))?;
        let row = stmt
            .query_row([id.to_string()], |row| Ok(parse_task_row(row)))
            .optional()?;
        row.transpose()
    }

    fn list_tasks(&self, query: &TaskListQuery) -> RepoResult<Vec<Task>> {
        let mut sql = format!("{TASK_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if !query.include_completed {
            sql.push_str(" AND completed = 0");
        }
        if let Some(category) = query.category {
            sql.push_str(" AND category = ?");
            bind_values.push(Value::Text(category.as_str().to_string()));
        }
        if let Some(client) = query.client.as_deref() {
            sql.push_str(" AND client = ?");
            bind_values.push(Value::Text(client.to_string()));
        }

        // Undated tasks sort last.
        sql.push_str(" ORDER BY due_at IS NULL, due_at ASC, created_at ASC, id ASC");

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
        }

        self.collect_tasks(&sql, bind_values)
    }

    fn delete_task(&self, id: TaskId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM tasks WHERE id = ?1;", [id.to_string()])?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }

    fn list_reminder_candidates(&self) -> RepoResult<Vec<Task>> {
        let sql = format!(
            "{TASK_SELECT_SQL}
             WHERE completed = 0 AND due_at IS NOT NULL
             ORDER BY due_at ASC, id ASC"
        );
        self.collect_tasks(&sql, Vec::new())
    }

    fn upsert_tasks(&self, tasks: &[Task]) -> RepoResult<(usize, usize)> {
        for task in tasks {
            task.validate()?;
        }

        // Immediate: the write lock is held for the whole batch.
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let mut created = 0;
        let mut updated = 0;
        for task in tasks {
            if update_row(&tx, task)? > 0 {
                updated += 1;
            } else {
                insert_row(&tx, task)?;
                created += 1;
            }
        }
        tx.commit()?;

        Ok((created, updated))
    }
}

impl SqliteTaskRepository<'_> {
    fn collect_tasks(&self, sql: &str, bind_values: Vec<Value>) -> RepoResult<Vec<Task>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut tasks = Vec::new();

        while let Some(row) = rows.next()? {
            tasks.push(parse_task_row(row)?);
        }

        Ok(tasks)
    }
}

fn parse_task_row(row: &Row<'_>) -> RepoResult<Task> {
    let id_text: String = row.get("id")?;
    let id = Uuid::parse_str(&id_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{id_text}` in tasks.id"))
    })?;

    let category_text: String = row.get("category")?;
    let category = TaskCategory::parse(&category_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid category `{category_text}` in tasks.category"
        ))
    })?;

    let completed = match row.get::<_, i64>("completed")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid completed value `{other}` in tasks.completed"
            )));
        }
    };

    let task = Task {
        id,
        title: row.get("title")?,
        due_at: row.get("due_at")?,
        due_timezone: row.get("due_timezone")?,
        client: row.get("client")?,
        category,
        completed,
    };
    task.validate()?;
    Ok(task)
}

fn insert_row(conn: &Connection, task: &Task) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO tasks (
            id,
            title,
            due_at,
            due_timezone,
            client,
            category,
            completed
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
        params![
            task.id.to_string(),
            task.title.as_str(),
            task.due_at,
            task.due_timezone.as_deref(),
            task.client.as_deref(),
            task.category.as_str(),
            bool_to_int(task.completed),
        ],
    )?;
    Ok(())
}

/// Returns the number of rows changed (0 when the ID is unknown).
fn update_row(conn: &Connection, task: &Task) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE tasks
         SET
            title = ?1,
            due_at = ?2,
            due_timezone = ?3,
            client = ?4,
            category = ?5,
            completed = ?6,
            updated_at = (strftime('%s', 'now') * 1000)
         WHERE id = ?7;",
        params![
            task.title.as_str(),
            task.due_at,
            task.due_timezone.as_deref(),
            task.client.as_deref(),
            task.category.as_str(),
            bool_to_int(task.completed),
            task.id.to_string(),
        ],
    )
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
