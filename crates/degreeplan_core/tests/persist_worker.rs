use degreeplan_core::db::{open_db, open_db_in_memory};
use degreeplan_core::{
    apply_command, drain_commands, persist_channel, AssignmentRepository, Course, CourseId,
    PersistCommand, PersistStats, PersistWorker, PlanSessionService, PointerOffset, RepoError,
    SqliteAssignmentRepository, SqliteCourseRepository, TargetRef,
};
use std::path::Path;
use uuid::Uuid;

fn id(raw: &str) -> CourseId {
    CourseId::parse(raw).unwrap()
}

fn seed_catalog(path: &Path) {
    let conn = open_db(path).unwrap();
    let service = PlanSessionService::new(
        SqliteCourseRepository::try_new(&conn).unwrap(),
        SqliteAssignmentRepository::try_new(&conn).unwrap(),
    );
    service
        .import_catalog(
            ["A 1", "B 1", "C 1", "D 1"]
                .iter()
                .map(|raw| Course::new(id(raw), format!("Course {raw}"), 1.0))
                .collect(),
        )
        .unwrap();
}

#[test]
fn worker_persists_gestures_and_session_reopens_same_plan() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("planner.db");
    seed_catalog(&path);
    let user_id = Uuid::new_v4();

    let conn = open_db(&path).unwrap();
    let service = PlanSessionService::new(
        SqliteCourseRepository::try_new(&conn).unwrap(),
        SqliteAssignmentRepository::try_new(&conn).unwrap(),
    );

    let (queue, receiver) = persist_channel();
    let worker = PersistWorker::spawn(path.clone(), receiver).unwrap();
    let mut engine = service.open_session(user_id, 2024, queue, 4.0).unwrap();

    let drop_into = |engine: &mut degreeplan_core::PlanEngine, raw: &str, target: TargetRef| {
        let course = id(raw);
        engine.gesture_start(&course);
        engine.gesture_hover(&course, &target, PointerOffset::Below);
        engine.gesture_end(&course, Some(&target));
    };
    drop_into(&mut engine, "A 1", TargetRef::Semester(0));
    drop_into(&mut engine, "B 1", TargetRef::Semester(0));
    drop_into(&mut engine, "C 1", TargetRef::Semester(4));
    drop_into(&mut engine, "C 1", TargetRef::Course(id("A 1")));
    drop_into(&mut engine, "D 1", TargetRef::Semester(8));
    engine.unassign(&id("B 1"));
    let expected = engine.plan().clone();
    drop(engine);

    let stats = worker.join();
    assert_eq!(
        stats,
        PersistStats {
            applied: 7,
            failed: 0,
        }
    );

    let rows = SqliteAssignmentRepository::try_new(&conn)
        .unwrap()
        .list_assignments(user_id)
        .unwrap();
    let stored: Vec<(usize, Vec<String>)> = rows
        .into_iter()
        .map(|row| (row.semester_index, row.course_ids))
        .collect();
    assert_eq!(
        stored,
        vec![
            (0, vec!["C 1".to_string(), "A 1".to_string()]),
            (8, vec!["D 1".to_string()]),
        ]
    );

    let (queue, _receiver) = persist_channel();
    let reopened = service.open_session(user_id, 2024, queue, 4.0).unwrap();
    assert_eq!(reopened.plan(), &expected);
    reopened.verify_invariants().unwrap();
}

#[test]
fn worker_counts_failures_and_keeps_draining() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("planner.db");
    let user_id = Uuid::new_v4();

    let (queue, receiver) = persist_channel();
    let worker = PersistWorker::spawn(path.clone(), receiver).unwrap();
    queue.enqueue(PersistCommand::Update {
        user_id,
        semester_index: 3,
        course_ids: vec![id("A 1")],
    });
    queue.enqueue(PersistCommand::Create {
        user_id,
        semester_index: 3,
        course_ids: vec![id("A 1")],
    });
    queue.enqueue(PersistCommand::Delete {
        user_id,
        semester_index: 5,
    });
    drop(queue);

    assert_eq!(
        worker.join(),
        PersistStats {
            applied: 1,
            failed: 2,
        }
    );
    let conn = open_db(&path).unwrap();
    let rows = SqliteAssignmentRepository::try_new(&conn)
        .unwrap()
        .list_assignments(user_id)
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].semester_index, 3);
}

#[test]
fn worker_with_unusable_store_discards_every_command() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("planner.db");

    let (queue, receiver) = persist_channel();
    let worker = PersistWorker::spawn(path, receiver).unwrap();
    queue.enqueue(PersistCommand::Delete {
        user_id: Uuid::new_v4(),
        semester_index: 0,
    });
    drop(queue);

    assert_eq!(
        worker.join(),
        PersistStats {
            applied: 0,
            failed: 1,
        }
    );
}

#[test]
fn apply_command_surfaces_repository_errors() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteAssignmentRepository::try_new(&conn).unwrap();
    let user_id = Uuid::new_v4();

    let err = apply_command(
        &repo,
        &PersistCommand::Delete {
            user_id,
            semester_index: 1,
        },
    )
    .unwrap_err();
    assert!(matches!(err, RepoError::NotFound { .. }));

    apply_command(
        &repo,
        &PersistCommand::Create {
            user_id,
            semester_index: 1,
            course_ids: vec![id("A 1")],
        },
    )
    .unwrap();
    assert_eq!(repo.list_assignments(user_id).unwrap().len(), 1);
}

#[test]
fn drain_commands_runs_until_queue_disconnects() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteAssignmentRepository::try_new(&conn).unwrap();
    let user_id = Uuid::new_v4();
    let (queue, receiver) = persist_channel();

    queue.enqueue(PersistCommand::Create {
        user_id,
        semester_index: 0,
        course_ids: vec![id("A 1")],
    });
    queue.enqueue(PersistCommand::Update {
        user_id,
        semester_index: 0,
        course_ids: vec![id("B 1"), id("A 1")],
    });
    queue.enqueue(PersistCommand::Delete {
        user_id,
        semester_index: 6,
    });
    drop(queue);

    let stats = drain_commands(&repo, &receiver);
    assert_eq!(stats.applied, 2);
    assert_eq!(stats.failed, 1);
    assert_eq!(
        repo.list_assignments(user_id).unwrap()[0].course_ids,
        vec!["B 1", "A 1"]
    );
}

#[test]
fn first_drop_into_semester_with_only_unknown_rows_overwrites_them() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("planner.db");
    seed_catalog(&path);
    let user_id = Uuid::new_v4();

    let conn = open_db(&path).unwrap();
    SqliteAssignmentRepository::try_new(&conn)
        .unwrap()
        .create_assignment(user_id, 0, &[id("GONE 1")])
        .unwrap();
    let service = PlanSessionService::new(
        SqliteCourseRepository::try_new(&conn).unwrap(),
        SqliteAssignmentRepository::try_new(&conn).unwrap(),
    );

    let (queue, receiver) = persist_channel();
    let worker = PersistWorker::spawn(path.clone(), receiver).unwrap();
    let mut engine = service.open_session(user_id, 2024, queue, 4.0).unwrap();
    assert!(engine.plan().semester(0).unwrap().members.is_empty());

    let course = id("A 1");
    engine.gesture_start(&course);
    engine.gesture_end(&course, Some(&TargetRef::Semester(0)));
    drop(engine);

    assert_eq!(
        worker.join(),
        PersistStats {
            applied: 1,
            failed: 0,
        }
    );
    let (queue, _receiver) = persist_channel();
    let reopened = service.open_session(user_id, 2024, queue, 4.0).unwrap();
    assert_eq!(reopened.plan().semester(0).unwrap().members, vec![id("A 1")]);
}
