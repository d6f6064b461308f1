//! Semester bucket model.
//!
//! # Invariants
//! - `index` is stable for the lifetime of a plan.
//! - `members` order is user-controlled; every operation here is a stable
//!   edit that leaves unrelated members in their relative order.

use crate::model::course::CourseId;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Number of semesters in one year group.
pub const SEMESTERS_PER_YEAR: usize = 3;

/// Term within one academic year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Season {
    Fall,
    Spring,
    Summer,
}

impl Season {
    const ORDER: [Season; SEMESTERS_PER_YEAR] = [Season::Fall, Season::Spring, Season::Summer];

    /// Season for a semester position within the plan.
    pub fn for_index(index: usize) -> Self {
        Self::ORDER[index % SEMESTERS_PER_YEAR]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fall => "Fall",
            Self::Spring => "Spring",
            Self::Summer => "Summer",
        }
    }
}

impl Display for Season {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One ordered semester bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Semester {
    pub index: usize,
    pub season: Season,
    /// Calendar year shown in the label.
    pub year: i32,
    pub year_group: usize,
    pub members: Vec<CourseId>,
}

impl Semester {
    /// Creates an empty semester at `index` for a plan starting in
    /// `start_year` (Fall of the start year is index 0).
    pub fn empty(index: usize, start_year: i32) -> Self {
        let year_group = index / SEMESTERS_PER_YEAR;
        let season = Season::for_index(index);
        let offset = match season {
            Season::Fall => 0,
            Season::Spring | Season::Summer => 1,
        };
        Self {
            index,
            season,
            year: start_year + year_group as i32 + offset,
            year_group,
            members: Vec::new(),
        }
    }

    /// Display label such as `Fall 2024`.
    pub fn label(&self) -> String {
        format!("{} {}", self.season, self.year)
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn contains(&self, id: &CourseId) -> bool {
        self.members.contains(id)
    }

    pub fn position_of(&self, id: &CourseId) -> Option<usize> {
        self.members.iter().position(|member| member == id)
    }

    /// Removes one member, returning its former position.
    ///
    /// Absent members are a no-op.
    pub fn remove_member(&mut self, id: &CourseId) -> Option<usize> {
        let position = self.position_of(id)?;
        self.members.remove(position);
        Some(position)
    }

    /// Inserts one member, clamping `position` to the end of the sequence.
    pub fn insert_member(&mut self, position: usize, id: CourseId) -> usize {
        let position = position.min(self.members.len());
        self.members.insert(position, id);
        position
    }

    /// Moves one member to `to`, shifting the members in between by one.
    ///
    /// Returns `false` when the member is absent or already at `to`.
    pub fn move_member(&mut self, id: &CourseId, to: usize) -> bool {
        let Some(from) = self.position_of(id) else {
            return false;
        };
        let to = to.min(self.members.len() - 1);
        if from == to {
            return false;
        }
        let member = self.members.remove(from);
        self.members.insert(to, member);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::{Season, Semester};
    use crate::model::course::CourseId;

    fn id(raw: &str) -> CourseId {
        CourseId::parse(raw).unwrap()
    }

    #[test]
    fn empty_semesters_follow_academic_calendar() {
        let fall = Semester::empty(0, 2024);
        let spring = Semester::empty(1, 2024);
        let summer = Semester::empty(2, 2024);
        let next_fall = Semester::empty(3, 2024);

        assert_eq!(fall.label(), "Fall 2024");
        assert_eq!(spring.label(), "Spring 2025");
        assert_eq!(summer.label(), "Summer 2025");
        assert_eq!(next_fall.label(), "Fall 2025");
        assert_eq!(next_fall.year_group, 1);
        assert_eq!(Season::for_index(5), Season::Summer);
    }

    #[test]
    fn move_member_is_stable_not_swap() {
        let mut semester = Semester::empty(0, 2024);
        for raw in ["A 1", "B 1", "C 1", "D 1"] {
            let len = semester.len();
            semester.insert_member(len, id(raw));
        }

        assert!(semester.move_member(&id("A 1"), 2));
        assert_eq!(semester.members, vec![id("B 1"), id("C 1"), id("A 1"), id("D 1")]);

        assert!(semester.move_member(&id("D 1"), 0));
        assert_eq!(semester.members, vec![id("D 1"), id("B 1"), id("C 1"), id("A 1")]);

        assert!(!semester.move_member(&id("B 1"), 1));
        assert!(!semester.move_member(&id("Z 9"), 0));
    }

    #[test]
    fn insert_clamps_and_remove_of_absent_member_is_noop() {
        let mut semester = Semester::empty(4, 2024);
        assert_eq!(semester.insert_member(10, id("A 1")), 0);
        assert_eq!(semester.remove_member(&id("B 1")), None);
        assert_eq!(semester.remove_member(&id("A 1")), Some(0));
        assert!(semester.is_empty());
    }
}
