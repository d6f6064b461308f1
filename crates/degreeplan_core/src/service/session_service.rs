//! Planning session bootstrap.
//!
//! # Responsibility
//! - Load the catalog and persisted semester rows through repositories.
//! - Reconstruct the initial plan and hand it to a fresh engine.
//!
//! # Invariants
//! - Plans always have at least `MIN_SEMESTERS` and at most
//!   `MAX_SEMESTERS` semesters, rounded up to whole year groups.
//! - Persisted references that cannot be honoured (unknown course, index
//!   past the cap, duplicate assignment) are dropped and reported, never
//!   passed to the engine.

use crate::engine::reconcile::PlanEngine;
use crate::model::catalog::{Catalog, CatalogError};
use crate::model::course::{Course, CourseId};
use crate::model::plan::{Plan, MAX_SEMESTERS};
use crate::model::semester::SEMESTERS_PER_YEAR;
use crate::persist::command::{PersistQueue, UserId};
use crate::repo::assignment_repo::{AssignmentRepository, SemesterAssignment};
use crate::repo::course_repo::CourseRepository;
use crate::repo::RepoError;
use log::{info, warn};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Why a persisted reference was left out of the plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    SemesterOutOfRange,
    InvalidCourseId,
    UnknownCourse,
    DuplicateAssignment,
}

impl DropReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SemesterOutOfRange => "semester_out_of_range",
            Self::InvalidCourseId => "invalid_course_id",
            Self::UnknownCourse => "unknown_course",
            Self::DuplicateAssignment => "duplicate_assignment",
        }
    }
}

/// One persisted reference excluded from the reconstructed plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedReference {
    pub semester_index: usize,
    /// Raw id as stored; `None` when the whole row was dropped.
    pub course_id: Option<String>,
    pub reason: DropReason,
}

/// Initial plan plus the references that had to be filtered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconstructedPlan {
    pub plan: Plan,
    pub dropped: Vec<DroppedReference>,
}

/// Rebuilds a plan from persisted semester rows.
pub fn reconstruct_plan(
    catalog: &Catalog,
    start_year: i32,
    rows: &[SemesterAssignment],
) -> ReconstructedPlan {
    let mut dropped = Vec::new();
    let (in_range, out_of_range): (Vec<&SemesterAssignment>, Vec<&SemesterAssignment>) = rows
        .iter()
        .partition(|row| row.semester_index < MAX_SEMESTERS);
    for row in out_of_range {
        dropped.push(DroppedReference {
            semester_index: row.semester_index,
            course_id: None,
            reason: DropReason::SemesterOutOfRange,
        });
    }

    let year_groups = in_range
        .iter()
        .map(|row| row.semester_index / SEMESTERS_PER_YEAR + 1)
        .max()
        .unwrap_or(0);
    let mut plan = Plan::new(start_year, year_groups);

    let mut seen: HashSet<CourseId> = HashSet::new();
    for row in in_range {
        for raw in &row.course_ids {
            let reason = match CourseId::parse(raw) {
                Err(_) => Some(DropReason::InvalidCourseId),
                Ok(id) if !catalog.contains(&id) => Some(DropReason::UnknownCourse),
                Ok(id) if !seen.insert(id.clone()) => Some(DropReason::DuplicateAssignment),
                Ok(id) => {
                    if let Some(semester) = plan.semester_mut(row.semester_index) {
                        let len = semester.len();
                        semester.insert_member(len, id);
                    }
                    None
                }
            };
            if let Some(reason) = reason {
                dropped.push(DroppedReference {
                    semester_index: row.semester_index,
                    course_id: Some(raw.clone()),
                    reason,
                });
            }
        }
    }

    for reference in &dropped {
        warn!(
            "event=plan_reconstruct module=session status=warn semester_index={} course_id={} reason={}",
            reference.semester_index,
            reference.course_id.as_deref().unwrap_or("-"),
            reference.reason.as_str()
        );
    }
    ReconstructedPlan { plan, dropped }
}

/// Errors from session bootstrap.
#[derive(Debug)]
pub enum SessionError {
    Repo(RepoError),
    Catalog(CatalogError),
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::Catalog(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Catalog(err) => Some(err),
        }
    }
}

impl From<RepoError> for SessionError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<CatalogError> for SessionError {
    fn from(value: CatalogError) -> Self {
        Self::Catalog(value)
    }
}

/// Session bootstrap facade over catalog and assignment storage.
pub struct PlanSessionService<C: CourseRepository, A: AssignmentRepository> {
    courses: C,
    assignments: A,
}

impl<C: CourseRepository, A: AssignmentRepository> PlanSessionService<C, A> {
    pub fn new(courses: C, assignments: A) -> Self {
        Self {
            courses,
            assignments,
        }
    }

    /// Validates the whole batch, then upserts it into the catalog store.
    pub fn import_catalog(&self, courses: Vec<Course>) -> Result<usize, SessionError> {
        let catalog = Catalog::new(courses)?;
        let imported = self.courses.upsert_courses(catalog.courses())?;
        info!(
            "event=catalog_import module=session status=ok courses={}",
            imported
        );
        Ok(imported)
    }

    pub fn load_catalog(&self) -> Result<Catalog, SessionError> {
        Ok(Catalog::new(self.courses.list_courses()?)?)
    }

    /// Loads catalog and persisted rows and returns a ready engine.
    pub fn open_session(
        &self,
        user_id: UserId,
        start_year: i32,
        queue: PersistQueue,
        target_units: f64,
    ) -> Result<PlanEngine, SessionError> {
        let catalog = self.load_catalog()?;
        let rows = self.assignments.list_assignments(user_id)?;
        let ReconstructedPlan { plan, dropped } = reconstruct_plan(&catalog, start_year, &rows);
        info!(
            "event=session_open module=session status=ok semesters={} rows={} dropped={}",
            plan.len(),
            rows.len(),
            dropped.len()
        );
        Ok(PlanEngine::new(user_id, catalog, plan, queue, target_units))
    }
}
