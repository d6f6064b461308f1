//! Course catalog and the unassigned working-set.
//!
//! # Responsibility
//! - Hold the immutable, ordered course list for one planning session.
//! - Track which catalog courses are not placed in any semester.
//!
//! # Invariants
//! - Course ids are unique within a catalog.
//! - `UnassignedPool` always iterates in catalog order, regardless of the
//!   order in which courses were taken out or restored.

use crate::model::course::{Course, CourseCategories, CourseId, CourseValidationError};
use std::collections::{BTreeSet, HashMap};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from catalog construction.
#[derive(Debug)]
pub enum CatalogError {
    /// Two catalog entries share one id.
    DuplicateCourse(CourseId),
    /// One entry failed record validation.
    InvalidCourse(CourseValidationError),
    /// JSON import payload could not be decoded.
    Decode(serde_json::Error),
}

impl Display for CatalogError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateCourse(id) => write!(f, "duplicate course in catalog: {id}"),
            Self::InvalidCourse(err) => write!(f, "{err}"),
            Self::Decode(err) => write!(f, "invalid catalog payload: {err}"),
        }
    }
}

impl Error for CatalogError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::DuplicateCourse(_) => None,
            Self::InvalidCourse(err) => Some(err),
            Self::Decode(err) => Some(err),
        }
    }
}

impl From<CourseValidationError> for CatalogError {
    fn from(value: CourseValidationError) -> Self {
        Self::InvalidCourse(value)
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(value: serde_json::Error) -> Self {
        Self::Decode(value)
    }
}

/// Immutable ordered course catalog.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    courses: Vec<Course>,
    ordinals: HashMap<CourseId, usize>,
}

impl Catalog {
    /// Builds a catalog, validating every course and rejecting duplicates.
    pub fn new(courses: Vec<Course>) -> Result<Self, CatalogError> {
        let mut ordinals = HashMap::with_capacity(courses.len());
        for (ordinal, course) in courses.iter().enumerate() {
            course.validate()?;
            if ordinals.insert(course.id.clone(), ordinal).is_some() {
                return Err(CatalogError::DuplicateCourse(course.id.clone()));
            }
        }
        Ok(Self { courses, ordinals })
    }

    /// Decodes a JSON array of courses.
    pub fn from_json_str(payload: &str) -> Result<Self, CatalogError> {
        let courses: Vec<Course> = serde_json::from_str(payload)?;
        Self::new(courses)
    }

    pub fn len(&self) -> usize {
        self.courses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
    }

    pub fn courses(&self) -> &[Course] {
        &self.courses
    }

    pub fn get(&self, id: &CourseId) -> Option<&Course> {
        self.ordinal_of(id).map(|ordinal| &self.courses[ordinal])
    }

    pub fn contains(&self, id: &CourseId) -> bool {
        self.ordinals.contains_key(id)
    }

    /// Catalog position of one course.
    pub fn ordinal_of(&self, id: &CourseId) -> Option<usize> {
        self.ordinals.get(id).copied()
    }

    /// Unit weight of one course, `0.0` for ids outside the catalog.
    pub fn unit_of(&self, id: &CourseId) -> f64 {
        self.get(id).map_or(0.0, |course| course.course_unit)
    }

    /// Courses whose category flags include every flag in `required`.
    pub fn filter(&self, required: &CourseCategories) -> Vec<&Course> {
        self.courses
            .iter()
            .filter(|course| course.categories.satisfies(required))
            .collect()
    }
}

/// Catalog courses not assigned to any semester.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnassignedPool {
    ordinals: BTreeSet<usize>,
}

impl UnassignedPool {
    /// Pool containing every catalog course.
    pub fn full(catalog: &Catalog) -> Self {
        Self {
            ordinals: (0..catalog.len()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.ordinals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordinals.is_empty()
    }

    pub fn contains(&self, catalog: &Catalog, id: &CourseId) -> bool {
        catalog
            .ordinal_of(id)
            .is_some_and(|ordinal| self.ordinals.contains(&ordinal))
    }

    /// Removes one course. Returns `false` when it was not in the pool.
    pub fn take(&mut self, catalog: &Catalog, id: &CourseId) -> bool {
        match catalog.ordinal_of(id) {
            Some(ordinal) => self.ordinals.remove(&ordinal),
            None => false,
        }
    }

    /// Puts one course back at its catalog position.
    pub fn restore(&mut self, catalog: &Catalog, id: &CourseId) -> bool {
        match catalog.ordinal_of(id) {
            Some(ordinal) => self.ordinals.insert(ordinal),
            None => false,
        }
    }

    /// Iterates pool courses in catalog order.
    pub fn iter<'a>(&'a self, catalog: &'a Catalog) -> impl Iterator<Item = &'a Course> + 'a {
        self.ordinals
            .iter()
            .filter_map(move |ordinal| catalog.courses().get(*ordinal))
    }
}
