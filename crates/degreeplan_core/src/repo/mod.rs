//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define data access contracts for the course catalog and persisted
//!   semester assignments.
//! - Isolate SQLite query details from engine and session orchestration.
//!
//! # Invariants
//! - Repositories only accept connections migrated to the latest schema.
//! - Repository APIs return semantic errors (`NotFound`, `EmptyAssignment`)
//!   in addition to DB transport errors.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::course::CourseValidationError;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub mod assignment_repo;
pub mod course_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error shared by catalog and assignment storage.
#[derive(Debug)]
pub enum RepoError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// No stored record for this user and semester.
    NotFound { user_id: Uuid, semester_index: usize },
    /// Create/update was asked to store an empty course sequence.
    EmptyAssignment { user_id: Uuid, semester_index: usize },
    /// Course record failed validation before write.
    Validation(CourseValidationError),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Persisted data cannot be converted to a valid read model.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound {
                user_id,
                semester_index,
            } => write!(
                f,
                "semester assignment not found: user {user_id} semester {semester_index}"
            ),
            Self::EmptyAssignment {
                user_id,
                semester_index,
            } => write!(
                f,
                "semester assignment must not be empty: user {user_id} semester {semester_index}"
            ),
            Self::Validation(err) => write!(f, "{err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "repository requires table `{table}`")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Validation(err) => Some(err),
            _ => None,
        }
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

impl From<CourseValidationError> for RepoError {
    fn from(value: CourseValidationError) -> Self {
        Self::Validation(value)
    }
}

fn ensure_connection_ready(conn: &Connection, table: &'static str) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    if exists != 1 {
        return Err(RepoError::MissingRequiredTable(table));
    }
    Ok(())
}
