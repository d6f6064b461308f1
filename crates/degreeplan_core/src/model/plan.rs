//! Plan model: the ordered semesters of one planning session.
//!
//! # Responsibility
//! - Own the semester buckets and their member sequences.
//! - Compute read-only aggregates (unit totals, year grouping).
//!
//! # Invariants
//! - Semesters are indexed `0..len` with `semesters[i].index == i`.
//! - Semesters are appended one year group at a time and never removed.
//! - Plan length stays within `MIN_SEMESTERS..=MAX_SEMESTERS`.

use crate::model::catalog::Catalog;
use crate::model::course::CourseId;
use crate::model::semester::{Semester, SEMESTERS_PER_YEAR};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Year groups always present in a plan.
pub const MIN_YEAR_GROUPS: usize = 3;
/// Hard cap on year groups.
pub const MAX_YEAR_GROUPS: usize = 7;
pub const MIN_SEMESTERS: usize = MIN_YEAR_GROUPS * SEMESTERS_PER_YEAR;
pub const MAX_SEMESTERS: usize = MAX_YEAR_GROUPS * SEMESTERS_PER_YEAR;

const UNIT_EPSILON: f64 = 1e-9;

/// Errors from plan shape changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanError {
    /// Appending would exceed `MAX_SEMESTERS`.
    SemesterCapReached { max_semesters: usize },
}

impl Display for PlanError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SemesterCapReached { max_semesters } => {
                write!(f, "plan already has the maximum of {max_semesters} semesters")
            }
        }
    }
}

impl Error for PlanError {}

/// Aggregate view used for display and completion checks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlanSummary {
    pub total_units: f64,
    pub target_units: f64,
    pub assigned_courses: usize,
    /// Observational only; the engine never enforces it.
    pub is_complete: bool,
}

/// Semesters sharing one year group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearGroup<'a> {
    pub year_group: usize,
    pub semesters: Vec<&'a Semester>,
}

/// Ordered semester collection for one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    start_year: i32,
    semesters: Vec<Semester>,
}

impl Plan {
    /// Creates a plan with `year_groups` empty year groups, clamped to the
    /// supported range.
    pub fn new(start_year: i32, year_groups: usize) -> Self {
        let year_groups = year_groups.clamp(MIN_YEAR_GROUPS, MAX_YEAR_GROUPS);
        let semesters = (0..year_groups * SEMESTERS_PER_YEAR)
            .map(|index| Semester::empty(index, start_year))
            .collect();
        Self {
            start_year,
            semesters,
        }
    }

    pub fn start_year(&self) -> i32 {
        self.start_year
    }

    pub fn semesters(&self) -> &[Semester] {
        &self.semesters
    }

    pub fn semester(&self, index: usize) -> Option<&Semester> {
        self.semesters.get(index)
    }

    pub fn semester_mut(&mut self, index: usize) -> Option<&mut Semester> {
        self.semesters.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.semesters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.semesters.is_empty()
    }

    pub fn year_group_count(&self) -> usize {
        self.semesters.len() / SEMESTERS_PER_YEAR
    }

    /// Appends one empty year group and returns the new semester indexes.
    pub fn append_year_group(&mut self) -> Result<std::ops::Range<usize>, PlanError> {
        let first = self.semesters.len();
        if first + SEMESTERS_PER_YEAR > MAX_SEMESTERS {
            return Err(PlanError::SemesterCapReached {
                max_semesters: MAX_SEMESTERS,
            });
        }
        for index in first..first + SEMESTERS_PER_YEAR {
            self.semesters.push(Semester::empty(index, self.start_year));
        }
        Ok(first..self.semesters.len())
    }

    /// Total number of course references across all semesters.
    pub fn assigned_count(&self) -> usize {
        self.semesters.iter().map(Semester::len).sum()
    }

    /// Iterates `(semester_index, course_id)` for every member.
    pub fn assignments(&self) -> impl Iterator<Item = (usize, &CourseId)> + '_ {
        self.semesters
            .iter()
            .flat_map(|semester| semester.members.iter().map(move |id| (semester.index, id)))
    }

    /// Sum of `course_unit` over every assigned course.
    pub fn total_units(&self, catalog: &Catalog) -> f64 {
        self.assignments().map(|(_, id)| catalog.unit_of(id)).sum()
    }

    pub fn summary(&self, catalog: &Catalog, target_units: f64) -> PlanSummary {
        let total_units = self.total_units(catalog);
        PlanSummary {
            total_units,
            target_units,
            assigned_courses: self.assigned_count(),
            is_complete: (total_units - target_units).abs() < UNIT_EPSILON,
        }
    }

    /// Groups semesters by year group, in plan order.
    pub fn year_groups(&self) -> Vec<YearGroup<'_>> {
        self.semesters
            .chunks(SEMESTERS_PER_YEAR)
            .enumerate()
            .map(|(year_group, chunk)| YearGroup {
                year_group,
                semesters: chunk.iter().collect(),
            })
            .collect()
    }

    /// First course id found in more than one member slot, if any.
    pub fn find_duplicate_assignment(&self) -> Option<&CourseId> {
        let mut seen = HashSet::new();
        self.assignments()
            .map(|(_, id)| id)
            .find(|id| !seen.insert(*id))
    }
}
