//! Task store bootstrap.
//!
//! `open_db` / `open_db_in_memory` hand back a connection whose `tasks`
//! schema is current; every repository and reminder source starts there.
//!
//! # Invariants
//! - The schema generation lives in `PRAGMA user_version` (0 = empty file).
//! - A file stamped with a newer generation is refused, never downgraded.
//! - Foreign keys and the busy timeout are set before any task row is read.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Error opening or querying the task database.
#[derive(Debug)]
pub enum DbError {
    /// Raised by SQLite itself, including constraint and trigger aborts.
    Sqlite(rusqlite::Error),
    /// `user_version` is ahead of the last known schema step.
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "task database schema v{db_version} is newer than this build supports (v{latest_supported})"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
