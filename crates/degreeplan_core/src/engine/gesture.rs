//! Drag gesture vocabulary shared by the engine and its callers.

use crate::model::course::{CourseId, CourseValidationError};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt::{Display, Formatter};

/// Prefix UI drop zones use to name a semester container.
pub const SEMESTER_TARGET_PREFIX: &str = "semester-";

static SEMESTER_TARGET_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^semester-(\d+)$").expect("valid semester target regex"));

/// Element under the pointer: a planned course or a semester container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetRef {
    Course(CourseId),
    Semester(usize),
}

impl TargetRef {
    /// Parses a UI drop-zone id. `semester-<n>` names a semester, anything
    /// else is read as a course id.
    pub fn parse(raw: &str) -> Result<Self, CourseValidationError> {
        let trimmed = raw.trim();
        if let Some(index) = SEMESTER_TARGET_RE
            .captures(trimmed)
            .and_then(|captures| captures[1].parse::<usize>().ok())
        {
            return Ok(Self::Semester(index));
        }
        CourseId::parse(trimmed).map(Self::Course)
    }
}

impl Display for TargetRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Course(id) => write!(f, "{id}"),
            Self::Semester(index) => write!(f, "{SEMESTER_TARGET_PREFIX}{index}"),
        }
    }
}

/// Vertical pointer direction relative to the hovered element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerOffset {
    Above,
    Level,
    Below,
}

impl PointerOffset {
    pub fn from_sign(sign: i32) -> Self {
        match sign.signum() {
            1 => Self::Below,
            -1 => Self::Above,
            _ => Self::Level,
        }
    }
}

/// Where a course currently lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    Catalog,
    Semester(usize),
}

impl Display for Location {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Catalog => f.write_str("catalog"),
            Self::Semester(index) => write!(f, "{index}"),
        }
    }
}

/// Bookkeeping for the gesture in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveGesture {
    pub course_id: CourseId,
    pub origin: Location,
    /// Position inside the origin semester; `0` for catalog origins.
    pub origin_position: usize,
    /// Origin semester members before the gesture began.
    pub origin_members: Vec<CourseId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum GestureState {
    #[default]
    Idle,
    Dragging(ActiveGesture),
}

/// Why an event left the plan untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    UnknownCourse,
    NoActiveGesture,
    CourseMismatch,
    UnresolvedTarget,
    GestureInProgress,
    NotPlanned,
    StaleMembership,
}

impl IgnoreReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnknownCourse => "unknown_course",
            Self::NoActiveGesture => "no_active_gesture",
            Self::CourseMismatch => "course_mismatch",
            Self::UnresolvedTarget => "unresolved_target",
            Self::GestureInProgress => "gesture_in_progress",
            Self::NotPlanned => "not_planned",
            Self::StaleMembership => "stale_membership",
        }
    }
}

/// Result of one engine event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureOutcome {
    Started,
    /// Hover moved the course into another semester without persisting.
    Speculated { semester_index: usize, position: usize },
    /// Event was valid but nothing changed.
    Unchanged,
    Reordered { semester_index: usize },
    /// First placement of a catalog course.
    Assigned { semester_index: usize },
    Moved { from: usize, to: usize },
    Unassigned { semester_index: usize },
    /// Drop outside a valid zone; speculative moves were undone.
    Cancelled,
    Ignored(IgnoreReason),
}

impl GestureOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Started => "started",
            Self::Speculated { .. } => "speculated",
            Self::Unchanged => "unchanged",
            Self::Reordered { .. } => "reordered",
            Self::Assigned { .. } => "assigned",
            Self::Moved { .. } => "moved",
            Self::Unassigned { .. } => "unassigned",
            Self::Cancelled => "cancelled",
            Self::Ignored(_) => "ignored",
        }
    }
}
