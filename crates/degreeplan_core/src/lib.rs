//! Core domain logic for the degree planner.
//! This crate is the single source of truth for plan invariants.

pub mod config;
pub mod db;
pub mod engine;
pub mod logging;
pub mod model;
pub mod persist;
pub mod repo;
pub mod service;

pub use config::{ConfigError, PlannerConfig};
pub use engine::gesture::{
    GestureOutcome, GestureState, IgnoreReason, Location, PointerOffset, TargetRef,
};
pub use engine::reconcile::{InvariantViolation, PlanEngine};
pub use logging::{default_log_level, init_logging, init_logging_from_config, logging_status};
pub use model::catalog::{Catalog, CatalogError, UnassignedPool};
pub use model::course::{Course, CourseCategories, CourseId, CourseValidationError};
pub use model::membership::MembershipIndex;
pub use model::plan::{Plan, PlanError, PlanSummary, YearGroup, MAX_SEMESTERS, MIN_SEMESTERS};
pub use model::semester::{Season, Semester, SEMESTERS_PER_YEAR};
pub use persist::command::{persist_channel, PersistCommand, PersistQueue, UserId};
pub use persist::worker::{apply_command, drain_commands, PersistStats, PersistWorker};
pub use repo::assignment_repo::{
    AssignmentRepository, SemesterAssignment, SqliteAssignmentRepository,
};
pub use repo::course_repo::{CourseRepository, SqliteCourseRepository};
pub use repo::{RepoError, RepoResult};
pub use service::session_service::{
    reconstruct_plan, DropReason, DroppedReference, PlanSessionService, ReconstructedPlan,
    SessionError,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
