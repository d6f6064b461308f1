//! Course domain model.
//!
//! # Responsibility
//! - Define the immutable catalog record that semesters reference.
//! - Normalize course identifiers so lookups are stable across inputs.
//!
//! # Invariants
//! - `CourseId` is never empty and has normalized whitespace and case.
//! - `course_unit` is finite and non-negative.
//! - Category flags are filter metadata only; no plan invariant reads them.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

static INNER_WHITESPACE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Stable course identifier such as `CIS 1200`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CourseId(String);

impl CourseId {
    /// Parses and normalizes a raw identifier.
    ///
    /// Trims, collapses inner whitespace to one space and uppercases.
    pub fn parse(raw: &str) -> Result<Self, CourseValidationError> {
        let collapsed = INNER_WHITESPACE_RE.replace_all(raw.trim(), " ");
        if collapsed.is_empty() {
            return Err(CourseValidationError::EmptyId);
        }
        Ok(Self(collapsed.to_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for CourseId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for CourseId {
    type Error = CourseValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CourseId> for String {
    fn from(value: CourseId) -> Self {
        value.0
    }
}

/// Validation failures for course records.
#[derive(Debug, Clone, PartialEq)]
pub enum CourseValidationError {
    /// Identifier is blank after normalization.
    EmptyId,
    /// Display name is blank after trim.
    EmptyName(CourseId),
    /// Unit weight is negative, NaN or infinite.
    InvalidUnit { id: CourseId, value: f64 },
}

impl Display for CourseValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyId => write!(f, "course id must not be blank"),
            Self::EmptyName(id) => write!(f, "course name must not be blank: {id}"),
            Self::InvalidUnit { id, value } => {
                write!(f, "course unit must be finite and >= 0 for {id}, got {value}")
            }
        }
    }
}

impl Error for CourseValidationError {}

/// Boolean category flags used by catalog filtering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CourseCategories {
    pub major_required: bool,
    pub general_education: bool,
    pub writing_intensive: bool,
    pub quantitative: bool,
    pub elective: bool,
}

impl CourseCategories {
    /// Returns whether every flag set in `required` is also set here.
    pub fn satisfies(&self, required: &CourseCategories) -> bool {
        (!required.major_required || self.major_required)
            && (!required.general_education || self.general_education)
            && (!required.writing_intensive || self.writing_intensive)
            && (!required.quantitative || self.quantitative)
            && (!required.elective || self.elective)
    }
}

/// Plannable catalog course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: CourseId,
    pub name: String,
    /// Credit weight counted toward the plan total.
    pub course_unit: f64,
    #[serde(default)]
    pub categories: CourseCategories,
}

impl Course {
    pub fn new(id: CourseId, name: impl Into<String>, course_unit: f64) -> Self {
        Self {
            id,
            name: name.into(),
            course_unit,
            categories: CourseCategories::default(),
        }
    }

    /// Checks record-level invariants before the course enters a catalog.
    pub fn validate(&self) -> Result<(), CourseValidationError> {
        if self.name.trim().is_empty() {
            return Err(CourseValidationError::EmptyName(self.id.clone()));
        }
        if !self.course_unit.is_finite() || self.course_unit < 0.0 {
            return Err(CourseValidationError::InvalidUnit {
                id: self.id.clone(),
                value: self.course_unit,
            });
        }
        Ok(())
    }
}
