//! Course-to-semester membership index.
//!
//! Derived data: the plan is the source of truth and this index is either
//! rebuilt from it or patched alongside each plan mutation.

use crate::model::course::CourseId;
use crate::model::plan::Plan;
use std::collections::HashMap;

/// Lookup from course id to the semester index containing it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembershipIndex {
    by_course: HashMap<CourseId, usize>,
}

impl MembershipIndex {
    /// Pure projection of `plan`.
    pub fn rebuild(plan: &Plan) -> Self {
        let by_course = plan
            .assignments()
            .map(|(index, id)| (id.clone(), index))
            .collect();
        Self { by_course }
    }

    pub fn semester_of(&self, id: &CourseId) -> Option<usize> {
        self.by_course.get(id).copied()
    }

    pub fn assign(&mut self, id: CourseId, semester_index: usize) {
        self.by_course.insert(id, semester_index);
    }

    pub fn unassign(&mut self, id: &CourseId) -> Option<usize> {
        self.by_course.remove(id)
    }

    pub fn len(&self) -> usize {
        self.by_course.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_course.is_empty()
    }

    /// Whether this index equals a fresh projection of `plan`.
    pub fn matches(&self, plan: &Plan) -> bool {
        *self == Self::rebuild(plan)
    }
}
