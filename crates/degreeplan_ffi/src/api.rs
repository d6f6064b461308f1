//! FFI use-case API for the Flutter planner screen.
//!
//! # Responsibility
//! - Expose one planning session per process to Dart via FRB.
//! - Translate UI drop-zone ids and pointer offsets into engine events.
//! - Return a full plan snapshot after every mutating call so the UI can
//!   re-render without tracking state of its own.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Gesture calls never fail because of the gesture itself; `ok=false`
//!   reports a missing session, unparsable input or the semester cap.
//! - Closing a session waits for queued writes to drain.

use degreeplan_core::db::open_db;
use degreeplan_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, persist_channel,
    ping as ping_inner, Catalog, CourseId, GestureOutcome, PersistWorker, PlanEngine,
    PlanSessionService, PlannerConfig, PointerOffset, SqliteAssignmentRepository,
    SqliteCourseRepository, TargetRef,
};
use log::{info, warn};
use std::sync::{Mutex, MutexGuard, OnceLock};
use uuid::Uuid;

static PLANNER_CONFIG: OnceLock<PlannerConfig> = OnceLock::new();
static ACTIVE_SESSION: Mutex<Option<ActiveSession>> = Mutex::new(None);

struct ActiveSession {
    engine: PlanEngine,
    worker: PersistWorker,
}

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Course row as shown in the catalog list or a semester card.
#[derive(Debug, Clone, PartialEq)]
pub struct CourseView {
    pub course_id: String,
    pub name: String,
    pub course_unit: f64,
}

/// One semester container.
#[derive(Debug, Clone, PartialEq)]
pub struct SemesterView {
    pub index: u32,
    /// Drop-zone id the UI must report back for this container.
    pub target_id: String,
    /// Display label such as `Fall 2024`.
    pub label: String,
    pub year_group: u32,
    pub courses: Vec<CourseView>,
}

/// Full render state of the planner screen.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanSnapshot {
    pub semesters: Vec<SemesterView>,
    /// Unassigned catalog courses in catalog order.
    pub unassigned: Vec<CourseView>,
    pub total_units: f64,
    pub target_units: f64,
    pub is_complete: bool,
}

/// Response envelope shared by every session call.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannerResponse {
    /// Whether the call reached an open session with valid input.
    pub ok: bool,
    /// Engine outcome label (`started|speculated|moved|...`), empty on failure.
    pub outcome: String,
    /// Human-readable response message for diagnostics.
    pub message: String,
    /// Plan state after the call; `None` when no session is open.
    pub snapshot: Option<PlanSnapshot>,
}

impl PlannerResponse {
    fn success(
        outcome: impl Into<String>,
        message: impl Into<String>,
        engine: &PlanEngine,
    ) -> Self {
        Self {
            ok: true,
            outcome: outcome.into(),
            message: message.into(),
            snapshot: Some(snapshot_of(engine)),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            outcome: String::new(),
            message: message.into(),
            snapshot: None,
        }
    }
}

/// Validates and stores a JSON array of catalog courses.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - All-or-nothing: one invalid course rejects the batch.
/// - Does not touch an open session; reopen to see new courses.
#[flutter_rust_bridge::frb(sync)]
pub fn planner_import_catalog_json(payload: String) -> PlannerResponse {
    let catalog = match Catalog::from_json_str(&payload) {
        Ok(catalog) => catalog,
        Err(err) => return PlannerResponse::failure(format!("catalog import failed: {err}")),
    };
    let db_path = &planner_config().db_path;
    let conn = match open_db(db_path) {
        Ok(conn) => conn,
        Err(err) => return PlannerResponse::failure(format!("planner DB open failed: {err}")),
    };
    let imported = SqliteCourseRepository::try_new(&conn).and_then(|courses| {
        SqliteAssignmentRepository::try_new(&conn)
            .map(|assignments| PlanSessionService::new(courses, assignments))
    });
    let result = match imported {
        Ok(service) => service
            .import_catalog(catalog.courses().to_vec())
            .map_err(|err| err.to_string()),
        Err(err) => Err(err.to_string()),
    };
    match result {
        Ok(count) => PlannerResponse {
            ok: true,
            outcome: "imported".to_string(),
            message: format!("Imported {count} course(s)."),
            snapshot: None,
        },
        Err(err) => PlannerResponse::failure(format!("catalog import failed: {err}")),
    }
}

/// Opens the planning session for one user, replacing any open session.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - `user_id` must be a UUID string.
/// - Starts the background persistence worker for the session.
#[flutter_rust_bridge::frb(sync)]
pub fn planner_open_session(user_id: String, start_year: i32) -> PlannerResponse {
    let user_id = match Uuid::parse_str(user_id.trim()) {
        Ok(user_id) => user_id,
        Err(err) => return PlannerResponse::failure(format!("invalid user_id: {err}")),
    };

    let mut slot = lock_session();
    if let Some(previous) = slot.take() {
        close(previous);
    }

    let config = planner_config();
    let session = match open_session(config, user_id, start_year) {
        Ok(session) => session,
        Err(err) => return PlannerResponse::failure(format!("open session failed: {err}")),
    };
    let response = PlannerResponse::success("opened", "Session opened.", &session.engine);
    *slot = Some(session);
    response
}

/// Begins dragging one course.
#[flutter_rust_bridge::frb(sync)]
pub fn planner_gesture_start(course_id: String) -> PlannerResponse {
    with_course(&course_id, |engine, course_id| engine.gesture_start(course_id))
}

/// Reports the element under the pointer while dragging.
///
/// Input semantics:
/// - `target_id`: `semester-<n>` for a container, otherwise a course id.
/// - `offset_sign`: sign of pointer y minus target center y.
#[flutter_rust_bridge::frb(sync)]
pub fn planner_gesture_hover(
    course_id: String,
    target_id: String,
    offset_sign: i32,
) -> PlannerResponse {
    let target = match TargetRef::parse(&target_id) {
        Ok(target) => target,
        Err(err) => return PlannerResponse::failure(format!("invalid target_id: {err}")),
    };
    let offset = PointerOffset::from_sign(offset_sign);
    with_course(&course_id, |engine, course_id| {
        engine.gesture_hover(course_id, &target, offset)
    })
}

/// Finishes the drag. `None` or an unparsable target cancels it.
#[flutter_rust_bridge::frb(sync)]
pub fn planner_gesture_end(course_id: String, target_id: Option<String>) -> PlannerResponse {
    let target = target_id.and_then(|raw| TargetRef::parse(&raw).ok());
    with_course(&course_id, |engine, course_id| {
        engine.gesture_end(course_id, target.as_ref())
    })
}

/// Returns one planned course to the catalog list.
#[flutter_rust_bridge::frb(sync)]
pub fn planner_unassign(course_id: String) -> PlannerResponse {
    with_course(&course_id, |engine, course_id| engine.unassign(course_id))
}

/// Appends one empty year group of three semesters.
#[flutter_rust_bridge::frb(sync)]
pub fn planner_add_year() -> PlannerResponse {
    let mut slot = lock_session();
    let Some(session) = slot.as_mut() else {
        return PlannerResponse::failure("no open planning session");
    };
    match session.engine.add_year_group() {
        Ok(range) => PlannerResponse::success(
            "year_added",
            format!("Added semesters {}..{}.", range.start, range.end),
            &session.engine,
        ),
        Err(err) => PlannerResponse {
            ok: false,
            outcome: "cap_reached".to_string(),
            message: err.to_string(),
            snapshot: Some(snapshot_of(&session.engine)),
        },
    }
}

/// Current plan state without mutating it.
#[flutter_rust_bridge::frb(sync)]
pub fn planner_snapshot() -> PlannerResponse {
    let slot = lock_session();
    match slot.as_ref() {
        Some(session) => PlannerResponse::success("snapshot", "", &session.engine),
        None => PlannerResponse::failure("no open planning session"),
    }
}

/// Closes the session and waits for pending writes.
#[flutter_rust_bridge::frb(sync)]
pub fn planner_close_session() -> PlannerResponse {
    let mut slot = lock_session();
    match slot.take() {
        Some(session) => {
            let (applied, failed) = close(session);
            PlannerResponse {
                ok: true,
                outcome: "closed".to_string(),
                message: format!("Session closed: {applied} write(s) applied, {failed} failed."),
                snapshot: None,
            }
        }
        None => PlannerResponse::failure("no open planning session"),
    }
}

fn planner_config() -> &'static PlannerConfig {
    PLANNER_CONFIG.get_or_init(|| {
        PlannerConfig::from_env().unwrap_or_else(|err| {
            warn!(
                "event=config_load module=ffi status=warn action=use_defaults error={}",
                err
            );
            PlannerConfig::default()
        })
    })
}

fn lock_session() -> MutexGuard<'static, Option<ActiveSession>> {
    ACTIVE_SESSION
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn open_session(
    config: &PlannerConfig,
    user_id: Uuid,
    start_year: i32,
) -> Result<ActiveSession, String> {
    let conn = open_db(&config.db_path).map_err(|err| format!("planner DB open failed: {err}"))?;
    let courses = SqliteCourseRepository::try_new(&conn).map_err(|err| err.to_string())?;
    let assignments = SqliteAssignmentRepository::try_new(&conn).map_err(|err| err.to_string())?;
    let service = PlanSessionService::new(courses, assignments);

    let (queue, receiver) = persist_channel();
    let engine = service
        .open_session(user_id, start_year, queue, config.target_units)
        .map_err(|err| err.to_string())?;
    let worker = PersistWorker::spawn(config.db_path.clone(), receiver)
        .map_err(|err| format!("persistence worker spawn failed: {err}"))?;
    info!(
        "event=session_open module=ffi status=ok semesters={}",
        engine.plan().len()
    );
    Ok(ActiveSession { engine, worker })
}

fn close(session: ActiveSession) -> (usize, usize) {
    let ActiveSession { engine, worker } = session;
    // Dropping the engine drops the last queue sender so the worker can exit.
    drop(engine);
    let stats = worker.join();
    info!(
        "event=session_close module=ffi status=ok applied={} failed={}",
        stats.applied, stats.failed
    );
    (stats.applied, stats.failed)
}

fn with_course(
    raw_course_id: &str,
    event: impl FnOnce(&mut PlanEngine, &CourseId) -> GestureOutcome,
) -> PlannerResponse {
    let course_id = match CourseId::parse(raw_course_id) {
        Ok(course_id) => course_id,
        Err(err) => return PlannerResponse::failure(format!("invalid course_id: {err}")),
    };
    let mut slot = lock_session();
    let Some(session) = slot.as_mut() else {
        return PlannerResponse::failure("no open planning session");
    };
    let outcome = event(&mut session.engine, &course_id);
    let message = match outcome {
        GestureOutcome::Ignored(reason) => reason.as_str().to_string(),
        _ => String::new(),
    };
    PlannerResponse::success(outcome.as_str(), message, &session.engine)
}

fn snapshot_of(engine: &PlanEngine) -> PlanSnapshot {
    let catalog = engine.catalog();
    let view = |course_id: &CourseId| CourseView {
        course_id: course_id.to_string(),
        name: catalog
            .get(course_id)
            .map(|course| course.name.clone())
            .unwrap_or_default(),
        course_unit: catalog.unit_of(course_id),
    };
    let semesters = engine
        .plan()
        .semesters()
        .iter()
        .map(|semester| SemesterView {
            index: semester.index as u32,
            target_id: TargetRef::Semester(semester.index).to_string(),
            label: semester.label(),
            year_group: semester.year_group as u32,
            courses: semester.members.iter().map(view).collect(),
        })
        .collect();
    let unassigned = engine
        .unassigned()
        .iter(catalog)
        .map(|course| view(&course.id))
        .collect();
    let summary = engine.summary();
    PlanSnapshot {
        semesters,
        unassigned,
        total_units: summary.total_units,
        target_units: summary.target_units,
        is_complete: summary.is_complete,
    }
}
