//! Course catalog repository contracts and SQLite implementation.
//!
//! # Invariants
//! - Catalog listing is deterministic: `sort_order ASC, course_id ASC`.
//! - Writes validate every course before any row changes.

use super::{ensure_connection_ready, RepoError, RepoResult};
use crate::model::course::{Course, CourseCategories, CourseId};
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};

/// Repository interface for the static course catalog.
pub trait CourseRepository {
    /// Inserts or replaces courses; input order becomes catalog order.
    fn upsert_courses(&self, courses: &[Course]) -> RepoResult<usize>;
    /// Lists the full catalog in catalog order.
    fn list_courses(&self) -> RepoResult<Vec<Course>>;
}

/// SQLite-backed course repository.
pub struct SqliteCourseRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCourseRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, "courses")?;
        Ok(Self { conn })
    }
}

impl CourseRepository for SqliteCourseRepository<'_> {
    fn upsert_courses(&self, courses: &[Course]) -> RepoResult<usize> {
        for course in courses {
            course.validate()?;
        }

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        for (sort_order, course) in courses.iter().enumerate() {
            let flags = &course.categories;
            tx.execute(
                "INSERT INTO courses (
                    course_id,
                    name,
                    course_unit,
                    major_required,
                    general_education,
                    writing_intensive,
                    quantitative,
                    elective,
                    sort_order
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                ON CONFLICT(course_id) DO UPDATE SET
                    name = excluded.name,
                    course_unit = excluded.course_unit,
                    major_required = excluded.major_required,
                    general_education = excluded.general_education,
                    writing_intensive = excluded.writing_intensive,
                    quantitative = excluded.quantitative,
                    elective = excluded.elective,
                    sort_order = excluded.sort_order;",
                params![
                    course.id.as_str(),
                    course.name.trim(),
                    course.course_unit,
                    flags.major_required,
                    flags.general_education,
                    flags.writing_intensive,
                    flags.quantitative,
                    flags.elective,
                    sort_order as i64,
                ],
            )?;
        }
        tx.commit()?;
        Ok(courses.len())
    }

    fn list_courses(&self) -> RepoResult<Vec<Course>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                course_id,
                name,
                course_unit,
                major_required,
                general_education,
                writing_intensive,
                quantitative,
                elective
             FROM courses
             ORDER BY sort_order ASC, course_id ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_course_row(row)?);
        }
        Ok(items)
    }
}

fn parse_course_row(row: &Row<'_>) -> RepoResult<Course> {
    let id_text: String = row.get("course_id")?;
    let id = CourseId::parse(&id_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid course id `{id_text}` in courses.course_id"))
    })?;

    Ok(Course {
        id,
        name: row.get("name")?,
        course_unit: row.get("course_unit")?,
        categories: CourseCategories {
            major_required: row.get("major_required")?,
            general_education: row.get("general_education")?,
            writing_intensive: row.get("writing_intensive")?,
            quantitative: row.get("quantitative")?,
            elective: row.get("elective")?,
        },
    })
}
