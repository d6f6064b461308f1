use degreeplan_core::db::open_db_in_memory;
use degreeplan_core::{
    persist_channel, AssignmentRepository, Catalog, CatalogError, Course, CourseCategories,
    CourseId, CourseRepository, GestureOutcome, PersistCommand, PlanSessionService, PointerOffset,
    SessionError, SqliteAssignmentRepository, SqliteCourseRepository, TargetRef,
};
use rusqlite::Connection;
use uuid::Uuid;

const CATALOG_JSON: &str = r#"[
    {"id": "CIS 1100", "name": "Intro to Programming", "course_unit": 1.0,
     "categories": {"major_required": true, "quantitative": true}},
    {"id": "cis 1200", "name": "Programming Languages", "course_unit": 1.0,
     "categories": {"major_required": true}},
    {"id": "WRIT 0020", "name": "Critical Writing", "course_unit": 1.0,
     "categories": {"writing_intensive": true, "general_education": true}},
    {"id": "MUSC 0050", "name": "Ensemble", "course_unit": 0.5,
     "categories": {"elective": true}}
]"#;

fn id(raw: &str) -> CourseId {
    CourseId::parse(raw).unwrap()
}

fn service(
    conn: &Connection,
) -> PlanSessionService<SqliteCourseRepository<'_>, SqliteAssignmentRepository<'_>> {
    PlanSessionService::new(
        SqliteCourseRepository::try_new(conn).unwrap(),
        SqliteAssignmentRepository::try_new(conn).unwrap(),
    )
}

fn import_fixture(conn: &Connection) {
    let catalog = Catalog::from_json_str(CATALOG_JSON).unwrap();
    let imported = service(conn)
        .import_catalog(catalog.courses().to_vec())
        .unwrap();
    assert_eq!(imported, 4);
}

#[test]
fn imported_catalog_lists_in_import_order_with_flags() {
    let conn = open_db_in_memory().unwrap();
    import_fixture(&conn);

    let catalog = service(&conn).load_catalog().unwrap();
    let order: Vec<&str> = catalog.courses().iter().map(|course| course.id.as_str()).collect();
    assert_eq!(order, vec!["CIS 1100", "CIS 1200", "WRIT 0020", "MUSC 0050"]);

    let writing = catalog.get(&id("WRIT 0020")).unwrap();
    assert!(writing.categories.writing_intensive);
    assert!(writing.categories.general_education);
    assert!(!writing.categories.major_required);

    let majors = catalog.filter(&CourseCategories {
        major_required: true,
        ..CourseCategories::default()
    });
    assert_eq!(majors.len(), 2);
    assert_eq!(catalog.unit_of(&id("MUSC 0050")), 0.5);
}

#[test]
fn reimport_updates_existing_courses_in_place() {
    let conn = open_db_in_memory().unwrap();
    import_fixture(&conn);

    let mut renamed = Course::new(id("CIS 1100"), "Programming I", 1.5);
    renamed.categories.major_required = true;
    service(&conn).import_catalog(vec![renamed]).unwrap();

    let courses = SqliteCourseRepository::try_new(&conn)
        .unwrap()
        .list_courses()
        .unwrap();
    assert_eq!(courses.len(), 4);
    let updated = courses.iter().find(|course| course.id == id("CIS 1100")).unwrap();
    assert_eq!(updated.name, "Programming I");
    assert_eq!(updated.course_unit, 1.5);
}

#[test]
fn import_rejects_whole_batch_on_invalid_course() {
    let conn = open_db_in_memory().unwrap();
    let batch = vec![
        Course::new(id("A 1"), "Valid", 1.0),
        Course::new(id("B 1"), "Negative", -1.0),
    ];

    let err = service(&conn).import_catalog(batch).unwrap_err();
    assert!(matches!(err, SessionError::Catalog(CatalogError::InvalidCourse(_))));
    assert!(service(&conn).load_catalog().unwrap().is_empty());
}

#[test]
fn open_session_reconstructs_plan_from_stored_rows() {
    let conn = open_db_in_memory().unwrap();
    import_fixture(&conn);
    let user_id = Uuid::new_v4();
    let assignments = SqliteAssignmentRepository::try_new(&conn).unwrap();
    assignments
        .create_assignment(user_id, 0, &[id("WRIT 0020"), id("CIS 1100")])
        .unwrap();
    assignments
        .create_assignment(user_id, 10, &[id("GONE 9999"), id("CIS 1200")])
        .unwrap();

    let (queue, receiver) = persist_channel();
    let engine = service(&conn)
        .open_session(user_id, 2025, queue, 4.0)
        .unwrap();

    assert_eq!(engine.plan().len(), 12);
    assert_eq!(
        engine.plan().semester(0).unwrap().members,
        vec![id("WRIT 0020"), id("CIS 1100")]
    );
    assert_eq!(engine.plan().semester(10).unwrap().members, vec![id("CIS 1200")]);
    assert_eq!(engine.plan().semester(0).unwrap().year, 2025);
    assert_eq!(engine.plan().semester(1).unwrap().year, 2026);

    let pool: Vec<&str> = engine
        .unassigned()
        .iter(engine.catalog())
        .map(|course| course.id.as_str())
        .collect();
    assert_eq!(pool, vec!["MUSC 0050"]);
    assert_eq!(engine.summary().total_units, 3.0);
    engine.verify_invariants().unwrap();
    assert!(receiver.try_recv().is_err(), "opening a session must not persist");
}

#[test]
fn open_session_for_new_user_starts_with_three_empty_years() {
    let conn = open_db_in_memory().unwrap();
    import_fixture(&conn);
    let (queue, receiver) = persist_channel();
    let user_id = Uuid::new_v4();

    let mut engine = service(&conn)
        .open_session(user_id, 2024, queue, 32.0)
        .unwrap();
    assert_eq!(engine.plan().len(), 9);
    assert_eq!(engine.plan().year_group_count(), 3);
    assert_eq!(engine.unassigned().len(), 4);

    let course = id("MUSC 0050");
    engine.gesture_start(&course);
    engine.gesture_hover(&course, &TargetRef::Semester(2), PointerOffset::Level);
    assert_eq!(
        engine.gesture_end(&course, Some(&TargetRef::Semester(2))),
        GestureOutcome::Assigned { semester_index: 2 }
    );
    assert_eq!(
        receiver.try_recv().unwrap(),
        PersistCommand::Create {
            user_id,
            semester_index: 2,
            course_ids: vec![course],
        }
    );
}
