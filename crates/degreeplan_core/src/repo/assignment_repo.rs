//! Semester assignment repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Store one ordered course sequence per `(user_id, semester_index)`.
//! - Serve the rows the session loader reconstructs a plan from.
//!
//! # Invariants
//! - Stored sequences are never empty; an emptied semester is deleted.
//! - `course_ids` is a JSON array of strings in member order.
//! - Rows are listed by `semester_index ASC`.
//! - `create` on an existing key replaces its sequence.

use super::{ensure_connection_ready, RepoError, RepoResult};
use crate::model::course::CourseId;
use crate::persist::command::UserId;
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

/// One persisted semester row.
///
/// Course ids are kept raw: they may reference courses that no longer exist
/// in the catalog and are filtered by the session loader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemesterAssignment {
    pub user_id: UserId,
    pub semester_index: usize,
    pub course_ids: Vec<String>,
    /// Epoch ms update timestamp.
    pub updated_at: i64,
}

/// Remote store contract for semester assignments.
pub trait AssignmentRepository {
    /// Stores the first member sequence for a semester, replacing any stale row.
    fn create_assignment(
        &self,
        user_id: UserId,
        semester_index: usize,
        course_ids: &[CourseId],
    ) -> RepoResult<()>;
    /// Replaces the member sequence of an existing record.
    fn update_assignment(
        &self,
        user_id: UserId,
        semester_index: usize,
        course_ids: &[CourseId],
    ) -> RepoResult<()>;
    /// Removes the record of a semester that became empty.
    fn delete_assignment(&self, user_id: UserId, semester_index: usize) -> RepoResult<()>;
    /// Lists every stored semester for one user.
    fn list_assignments(&self, user_id: UserId) -> RepoResult<Vec<SemesterAssignment>>;
}

/// SQLite-backed assignment repository.
pub struct SqliteAssignmentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAssignmentRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, "semester_assignments")?;
        Ok(Self { conn })
    }
}

impl AssignmentRepository for SqliteAssignmentRepository<'_> {
    fn create_assignment(
        &self,
        user_id: UserId,
        semester_index: usize,
        course_ids: &[CourseId],
    ) -> RepoResult<()> {
        let encoded = encode_course_ids(user_id, semester_index, course_ids)?;
        // A row left behind with only filtered references is overwritten.
        self.conn.execute(
            "INSERT INTO semester_assignments (
                user_id,
                semester_index,
                course_ids
            ) VALUES (?1, ?2, ?3)
            ON CONFLICT(user_id, semester_index) DO UPDATE SET
                course_ids = excluded.course_ids,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![user_id.to_string(), semester_index as i64, encoded],
        )?;
        Ok(())
    }

    fn update_assignment(
        &self,
        user_id: UserId,
        semester_index: usize,
        course_ids: &[CourseId],
    ) -> RepoResult<()> {
        let encoded = encode_course_ids(user_id, semester_index, course_ids)?;
        let changed = self.conn.execute(
            "UPDATE semester_assignments
             SET course_ids = ?3,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE user_id = ?1
               AND semester_index = ?2;",
            params![user_id.to_string(), semester_index as i64, encoded],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                user_id,
                semester_index,
            });
        }
        Ok(())
    }

    fn delete_assignment(&self, user_id: UserId, semester_index: usize) -> RepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM semester_assignments
             WHERE user_id = ?1
               AND semester_index = ?2;",
            params![user_id.to_string(), semester_index as i64],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                user_id,
                semester_index,
            });
        }
        Ok(())
    }

    fn list_assignments(&self, user_id: UserId) -> RepoResult<Vec<SemesterAssignment>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                user_id,
                semester_index,
                course_ids,
                updated_at
             FROM semester_assignments
             WHERE user_id = ?1
             ORDER BY semester_index ASC;",
        )?;
        let mut rows = stmt.query([user_id.to_string()])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_assignment_row(row)?);
        }
        Ok(items)
    }
}

fn encode_course_ids(
    user_id: UserId,
    semester_index: usize,
    course_ids: &[CourseId],
) -> RepoResult<String> {
    if course_ids.is_empty() {
        return Err(RepoError::EmptyAssignment {
            user_id,
            semester_index,
        });
    }
    serde_json::to_string(course_ids)
        .map_err(|err| RepoError::InvalidData(format!("cannot encode course ids: {err}")))
}

fn parse_assignment_row(row: &Row<'_>) -> RepoResult<SemesterAssignment> {
    let user_id_text: String = row.get("user_id")?;
    let user_id = Uuid::parse_str(&user_id_text).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid uuid `{user_id_text}` in semester_assignments.user_id"
        ))
    })?;

    let semester_index = match row.get::<_, i64>("semester_index")? {
        value if value >= 0 => value as usize,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid semester_index `{other}` in semester_assignments.semester_index"
            )));
        }
    };

    let course_ids_text: String = row.get("course_ids")?;
    let course_ids: Vec<String> = serde_json::from_str(&course_ids_text).map_err(|err| {
        RepoError::InvalidData(format!(
            "invalid json in semester_assignments.course_ids: {err}"
        ))
    })?;

    Ok(SemesterAssignment {
        user_id,
        semester_index,
        course_ids,
        updated_at: row.get("updated_at")?,
    })
}
