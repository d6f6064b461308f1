//! Drag-and-drop plan reconciliation.
//!
//! # Responsibility
//! - Apply gesture events to the plan, unassigned pool and membership index.
//! - Emit the persistence commands that bring the remote store in line with
//!   the final state of a gesture.
//!
//! # Invariants
//! - A course id appears in at most one semester.
//! - Pool size plus all semester members equals the catalog size.
//! - The membership index matches the plan after every event.
//! - Hover events never persist; only drops and unassignment do.
//! - Gesture events never panic or return errors. Inconsistent input is
//!   logged and ignored.

use crate::engine::gesture::{
    ActiveGesture, GestureOutcome, GestureState, IgnoreReason, Location, PointerOffset, TargetRef,
};
use crate::model::catalog::{Catalog, UnassignedPool};
use crate::model::course::CourseId;
use crate::model::membership::MembershipIndex;
use crate::model::plan::{Plan, PlanError, PlanSummary};
use crate::persist::command::{PersistCommand, PersistQueue, UserId};
use log::{debug, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::ops::Range;

/// Broken plan invariant reported by [`PlanEngine::verify_invariants`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    DuplicateAssignment(CourseId),
    Conservation {
        catalog: usize,
        unassigned: usize,
        assigned: usize,
    },
    StaleMembership,
}

impl Display for InvariantViolation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateAssignment(id) => write!(f, "course assigned twice: {id}"),
            Self::Conservation {
                catalog,
                unassigned,
                assigned,
            } => write!(
                f,
                "unassigned ({unassigned}) + assigned ({assigned}) != catalog ({catalog})"
            ),
            Self::StaleMembership => write!(f, "membership index does not match plan"),
        }
    }
}

impl Error for InvariantViolation {}

/// Single-writer owner of one session's plan state.
pub struct PlanEngine {
    user_id: UserId,
    catalog: Catalog,
    pool: UnassignedPool,
    plan: Plan,
    membership: MembershipIndex,
    queue: PersistQueue,
    target_units: f64,
    state: GestureState,
}

impl PlanEngine {
    /// Builds an engine over an already reconstructed plan.
    ///
    /// The pool is derived as every catalog course not present in `plan`.
    pub fn new(
        user_id: UserId,
        catalog: Catalog,
        plan: Plan,
        queue: PersistQueue,
        target_units: f64,
    ) -> Self {
        let mut pool = UnassignedPool::full(&catalog);
        for (semester_index, id) in plan.assignments() {
            if !pool.take(&catalog, id) {
                warn!(
                    "event=engine_init module=engine status=warn course_id={} semester_index={} error_code=unpooled_member",
                    id, semester_index
                );
            }
        }
        let membership = MembershipIndex::rebuild(&plan);
        info!(
            "event=engine_init module=engine status=ok semesters={} catalog={} assigned={}",
            plan.len(),
            catalog.len(),
            membership.len()
        );
        Self {
            user_id,
            catalog,
            pool,
            plan,
            membership,
            queue,
            target_units,
            state: GestureState::Idle,
        }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn plan(&self) -> &Plan {
        &self.plan
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn unassigned(&self) -> &UnassignedPool {
        &self.pool
    }

    pub fn membership(&self) -> &MembershipIndex {
        &self.membership
    }

    pub fn state(&self) -> &GestureState {
        &self.state
    }

    pub fn summary(&self) -> PlanSummary {
        self.plan.summary(&self.catalog, self.target_units)
    }

    /// Current location of one course, `None` when it is not in the catalog.
    pub fn locate(&self, course_id: &CourseId) -> Option<Location> {
        if let Some(index) = self.membership.semester_of(course_id) {
            return Some(Location::Semester(index));
        }
        if self.pool.contains(&self.catalog, course_id) {
            return Some(Location::Catalog);
        }
        None
    }

    /// Records the course being dragged. Does not mutate the plan.
    pub fn gesture_start(&mut self, course_id: &CourseId) -> GestureOutcome {
        let Some(origin) = self.locate(course_id) else {
            return self.ignore("gesture_start", course_id, IgnoreReason::UnknownCourse);
        };

        if let GestureState::Dragging(stale) = std::mem::take(&mut self.state) {
            warn!(
                "event=gesture_start module=engine status=warn course_id={} stale_course_id={} action=revert",
                course_id, stale.course_id
            );
            self.revert(&stale);
        }

        // Revert may have moved the course back; locate again.
        let origin = self.locate(course_id).unwrap_or(origin);
        let (origin_position, origin_members) = match origin {
            Location::Catalog => (0, Vec::new()),
            Location::Semester(index) => {
                let members = self
                    .plan
                    .semester(index)
                    .map(|semester| semester.members.clone())
                    .unwrap_or_default();
                let position = members
                    .iter()
                    .position(|member| member == course_id)
                    .unwrap_or(members.len());
                (position, members)
            }
        };

        self.state = GestureState::Dragging(ActiveGesture {
            course_id: course_id.clone(),
            origin,
            origin_position,
            origin_members,
        });
        debug!(
            "event=gesture_start module=engine status=ok course_id={} origin={}",
            course_id, origin
        );
        GestureOutcome::Started
    }

    /// Speculatively moves the dragged course into the hovered semester.
    ///
    /// Same-semester hovers are no-ops; reordering waits for the drop.
    pub fn gesture_hover(
        &mut self,
        course_id: &CourseId,
        target: &TargetRef,
        offset: PointerOffset,
    ) -> GestureOutcome {
        match &self.state {
            GestureState::Idle => {
                return self.ignore("gesture_hover", course_id, IgnoreReason::NoActiveGesture)
            }
            GestureState::Dragging(active) if active.course_id != *course_id => {
                return self.ignore("gesture_hover", course_id, IgnoreReason::CourseMismatch)
            }
            GestureState::Dragging(_) => {}
        }

        let Some(current) = self.locate(course_id) else {
            return self.ignore("gesture_hover", course_id, IgnoreReason::UnknownCourse);
        };
        let Some(target_index) = self.resolve_target(target) else {
            return self.ignore("gesture_hover", course_id, IgnoreReason::UnresolvedTarget);
        };
        if current == Location::Semester(target_index) {
            return GestureOutcome::Unchanged;
        }

        let position = self.hover_position(target_index, target, offset);
        match self.relocate(course_id, target_index, position) {
            Some(position) => {
                debug!(
                    "event=gesture_hover module=engine status=ok course_id={} from={} to={} position={}",
                    course_id, current, target_index, position
                );
                GestureOutcome::Speculated {
                    semester_index: target_index,
                    position,
                }
            }
            None => self.ignore("gesture_hover", course_id, IgnoreReason::StaleMembership),
        }
    }

    /// Finalizes the gesture and enqueues the persistence it requires.
    ///
    /// A `None` target, or one that resolves to no semester, cancels the
    /// gesture: hover placements are undone so the course is back at its
    /// origin position, and nothing is persisted.
    ///
    /// A course dragged out of the catalog is appended to the end of the
    /// target semester. A course moved between semesters keeps the position
    /// its last hover gave it.
    pub fn gesture_end(
        &mut self,
        course_id: &CourseId,
        target: Option<&TargetRef>,
    ) -> GestureOutcome {
        let active = match std::mem::take(&mut self.state) {
            GestureState::Idle => {
                return self.ignore("gesture_end", course_id, IgnoreReason::NoActiveGesture)
            }
            GestureState::Dragging(active) => active,
        };
        if active.course_id != *course_id {
            self.revert(&active);
            return self.ignore("gesture_end", course_id, IgnoreReason::CourseMismatch);
        }

        let Some(target_index) = target.and_then(|target| self.resolve_target(target)) else {
            self.revert(&active);
            info!(
                "event=gesture_end module=engine status=ok outcome=cancelled course_id={}",
                course_id
            );
            return GestureOutcome::Cancelled;
        };

        let outcome = match active.origin {
            Location::Semester(origin_index) if origin_index == target_index => {
                self.finish_reorder(&active, target_index, target)
            }
            Location::Semester(origin_index) => {
                self.finish_transfer(&active, Some(origin_index), target_index)
            }
            Location::Catalog => self.finish_transfer(&active, None, target_index),
        };
        info!(
            "event=gesture_end module=engine status=ok outcome={} course_id={} target={}",
            outcome.as_str(),
            course_id,
            target_index
        );
        outcome
    }

    /// Returns a planned course to the catalog pool.
    pub fn unassign(&mut self, course_id: &CourseId) -> GestureOutcome {
        if matches!(self.state, GestureState::Dragging(_)) {
            return self.ignore("unassign", course_id, IgnoreReason::GestureInProgress);
        }
        let Some(semester_index) = self.membership.semester_of(course_id) else {
            return self.ignore("unassign", course_id, IgnoreReason::NotPlanned);
        };
        if !self.detach(course_id) {
            return self.ignore("unassign", course_id, IgnoreReason::StaleMembership);
        }
        self.pool.restore(&self.catalog, course_id);
        self.persist_semester(semester_index, false);
        info!(
            "event=unassign module=engine status=ok course_id={} semester_index={}",
            course_id, semester_index
        );
        GestureOutcome::Unassigned { semester_index }
    }

    /// Appends one empty year group. Nothing is persisted for empty semesters.
    pub fn add_year_group(&mut self) -> Result<Range<usize>, PlanError> {
        match self.plan.append_year_group() {
            Ok(range) => {
                info!(
                    "event=add_year_group module=engine status=ok first_index={} semesters={}",
                    range.start,
                    self.plan.len()
                );
                Ok(range)
            }
            Err(err) => {
                warn!(
                    "event=add_year_group module=engine status=error error_code=semester_cap error={}",
                    err
                );
                Err(err)
            }
        }
    }

    /// Checks no-duplication, conservation and index consistency.
    pub fn verify_invariants(&self) -> Result<(), InvariantViolation> {
        if let Some(id) = self.plan.find_duplicate_assignment() {
            return Err(InvariantViolation::DuplicateAssignment(id.clone()));
        }
        let assigned = self.plan.assigned_count();
        if self.pool.len() + assigned != self.catalog.len() {
            return Err(InvariantViolation::Conservation {
                catalog: self.catalog.len(),
                unassigned: self.pool.len(),
                assigned,
            });
        }
        if !self.membership.matches(&self.plan) {
            return Err(InvariantViolation::StaleMembership);
        }
        Ok(())
    }

    fn finish_reorder(
        &mut self,
        active: &ActiveGesture,
        semester_index: usize,
        target: Option<&TargetRef>,
    ) -> GestureOutcome {
        let course_id = &active.course_id;
        if self.membership.semester_of(course_id) != Some(semester_index)
            && self.relocate(course_id, semester_index, None).is_none()
        {
            self.revert(active);
            return GestureOutcome::Ignored(IgnoreReason::StaleMembership);
        }

        let Some(semester) = self.plan.semester_mut(semester_index) else {
            return GestureOutcome::Ignored(IgnoreReason::UnresolvedTarget);
        };
        let destination = match target {
            Some(TargetRef::Course(target_id)) if target_id != course_id => {
                semester.position_of(target_id)
            }
            Some(TargetRef::Semester(_)) => Some(semester.len().saturating_sub(1)),
            _ => None,
        };
        if let Some(destination) = destination {
            semester.move_member(course_id, destination);
        }

        if semester.members == active.origin_members {
            return GestureOutcome::Unchanged;
        }
        self.persist_semester(semester_index, false);
        GestureOutcome::Reordered { semester_index }
    }

    fn finish_transfer(
        &mut self,
        active: &ActiveGesture,
        origin_index: Option<usize>,
        target_index: usize,
    ) -> GestureOutcome {
        let course_id = &active.course_id;
        if self.membership.semester_of(course_id) != Some(target_index)
            && self.relocate(course_id, target_index, None).is_none()
        {
            self.revert(active);
            return GestureOutcome::Ignored(IgnoreReason::StaleMembership);
        }

        let target_was_empty = self
            .plan
            .semester(target_index)
            .is_some_and(|semester| semester.members.iter().all(|member| member == course_id));

        match origin_index {
            Some(origin_index) => {
                self.persist_semester(origin_index, false);
                self.persist_semester(target_index, target_was_empty);
                GestureOutcome::Moved {
                    from: origin_index,
                    to: target_index,
                }
            }
            None => {
                // First placement always lands at the end, whatever the hover chose.
                if let Some(semester) = self.plan.semester_mut(target_index) {
                    semester.move_member(course_id, usize::MAX);
                }
                self.persist_semester(target_index, target_was_empty);
                GestureOutcome::Assigned {
                    semester_index: target_index,
                }
            }
        }
    }

    /// Puts the course back where the gesture found it.
    fn revert(&mut self, active: &ActiveGesture) {
        let course_id = &active.course_id;
        match active.origin {
            Location::Catalog => {
                if self.membership.semester_of(course_id).is_some() && self.detach(course_id) {
                    self.pool.restore(&self.catalog, course_id);
                }
            }
            Location::Semester(origin_index) => {
                self.relocate(course_id, origin_index, Some(active.origin_position));
            }
        }
        debug!(
            "event=gesture_revert module=engine status=ok course_id={} origin={}",
            course_id, active.origin
        );
    }

    /// Moves the course from wherever it is into `semester_index`.
    ///
    /// `position` of `None` appends. Returns the final position, or `None`
    /// when the course could not be found where the index says it is.
    fn relocate(
        &mut self,
        course_id: &CourseId,
        semester_index: usize,
        position: Option<usize>,
    ) -> Option<usize> {
        if semester_index >= self.plan.len() {
            return None;
        }
        match self.locate(course_id)? {
            Location::Catalog => {
                self.pool.take(&self.catalog, course_id);
            }
            Location::Semester(_) => {
                if !self.detach(course_id) {
                    return None;
                }
            }
        }

        let semester = self.plan.semester_mut(semester_index)?;
        let position = semester.insert_member(position.unwrap_or(usize::MAX), course_id.clone());
        self.membership.assign(course_id.clone(), semester_index);
        Some(position)
    }

    /// Removes the course from its indexed semester and drops the index
    /// entry. A stale entry triggers an index rebuild and returns `false`.
    fn detach(&mut self, course_id: &CourseId) -> bool {
        let Some(semester_index) = self.membership.semester_of(course_id) else {
            return false;
        };
        let removed = self
            .plan
            .semester_mut(semester_index)
            .and_then(|semester| semester.remove_member(course_id));
        if removed.is_none() {
            warn!(
                "event=membership_stale module=engine status=warn course_id={} semester_index={} action=rebuild",
                course_id, semester_index
            );
            self.membership = MembershipIndex::rebuild(&self.plan);
            return false;
        }
        self.membership.unassign(course_id);
        true
    }

    fn resolve_target(&self, target: &TargetRef) -> Option<usize> {
        match target {
            TargetRef::Semester(index) if *index < self.plan.len() => Some(*index),
            TargetRef::Semester(_) => None,
            TargetRef::Course(id) => self.membership.semester_of(id),
        }
    }

    fn hover_position(
        &self,
        semester_index: usize,
        target: &TargetRef,
        offset: PointerOffset,
    ) -> Option<usize> {
        let TargetRef::Course(target_id) = target else {
            return None;
        };
        let semester = self.plan.semester(semester_index)?;
        let position = semester.position_of(target_id)?;
        let past_last = position + 1 == semester.len() && offset == PointerOffset::Below;
        Some(if past_last { position + 1 } else { position })
    }

    /// Enqueues the write that mirrors one semester's current members.
    fn persist_semester(&self, semester_index: usize, was_empty: bool) {
        let Some(semester) = self.plan.semester(semester_index) else {
            return;
        };
        let command = match (semester.is_empty(), was_empty) {
            (true, true) => return,
            (true, false) => PersistCommand::Delete {
                user_id: self.user_id,
                semester_index,
            },
            (false, true) => PersistCommand::Create {
                user_id: self.user_id,
                semester_index,
                course_ids: semester.members.clone(),
            },
            (false, false) => PersistCommand::Update {
                user_id: self.user_id,
                semester_index,
                course_ids: semester.members.clone(),
            },
        };
        self.queue.enqueue(command);
    }

    fn ignore(&self, event: &str, course_id: &CourseId, reason: IgnoreReason) -> GestureOutcome {
        debug!(
            "event={} module=engine status=ignored course_id={} reason={}",
            event,
            course_id,
            reason.as_str()
        );
        GestureOutcome::Ignored(reason)
    }
}
