use degreeplan_core::db::open_db_in_memory;
use degreeplan_core::{AssignmentRepository, CourseId, RepoError, SqliteAssignmentRepository};
use uuid::Uuid;

fn ids(raw: &[&str]) -> Vec<CourseId> {
    raw.iter().map(|value| CourseId::parse(value).unwrap()).collect()
}

#[test]
fn create_update_delete_round_trip() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteAssignmentRepository::try_new(&conn).unwrap();
    let user_id = Uuid::new_v4();

    repo.create_assignment(user_id, 4, &ids(&["CIS 1200"])).unwrap();
    repo.update_assignment(user_id, 4, &ids(&["CIS 1600", "CIS 1200"]))
        .unwrap();

    let rows = repo.list_assignments(user_id).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].user_id, user_id);
    assert_eq!(rows[0].semester_index, 4);
    assert_eq!(rows[0].course_ids, vec!["CIS 1600", "CIS 1200"]);
    assert!(rows[0].updated_at > 0);

    repo.delete_assignment(user_id, 4).unwrap();
    assert!(repo.list_assignments(user_id).unwrap().is_empty());
}

#[test]
fn create_over_existing_row_replaces_sequence() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteAssignmentRepository::try_new(&conn).unwrap();
    let user_id = Uuid::new_v4();

    repo.create_assignment(user_id, 0, &ids(&["A 1"])).unwrap();
    repo.create_assignment(user_id, 0, &ids(&["B 1", "C 1"])).unwrap();

    let rows = repo.list_assignments(user_id).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].course_ids, vec!["B 1", "C 1"]);
}

#[test]
fn update_and_delete_of_missing_row_report_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteAssignmentRepository::try_new(&conn).unwrap();
    let user_id = Uuid::new_v4();

    let err = repo.update_assignment(user_id, 2, &ids(&["A 1"])).unwrap_err();
    assert!(matches!(err, RepoError::NotFound { semester_index: 2, .. }));
    let err = repo.delete_assignment(user_id, 2).unwrap_err();
    assert!(matches!(err, RepoError::NotFound { semester_index: 2, .. }));
}

#[test]
fn empty_sequences_are_never_stored() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteAssignmentRepository::try_new(&conn).unwrap();
    let user_id = Uuid::new_v4();

    let err = repo.create_assignment(user_id, 1, &[]).unwrap_err();
    assert!(matches!(err, RepoError::EmptyAssignment { .. }));

    repo.create_assignment(user_id, 1, &ids(&["A 1"])).unwrap();
    let err = repo.update_assignment(user_id, 1, &[]).unwrap_err();
    assert!(matches!(err, RepoError::EmptyAssignment { .. }));
    assert_eq!(repo.list_assignments(user_id).unwrap()[0].course_ids, vec!["A 1"]);
}

#[test]
fn list_is_scoped_to_user_and_ordered_by_index() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteAssignmentRepository::try_new(&conn).unwrap();
    let user_id = Uuid::new_v4();
    let other_user = Uuid::new_v4();

    repo.create_assignment(user_id, 7, &ids(&["C 1"])).unwrap();
    repo.create_assignment(user_id, 0, &ids(&["A 1"])).unwrap();
    repo.create_assignment(other_user, 3, &ids(&["B 1"])).unwrap();

    let indexes: Vec<usize> = repo
        .list_assignments(user_id)
        .unwrap()
        .iter()
        .map(|row| row.semester_index)
        .collect();
    assert_eq!(indexes, vec![0, 7]);
    assert_eq!(repo.list_assignments(other_user).unwrap().len(), 1);
}

#[test]
fn corrupt_course_ids_column_is_invalid_data() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteAssignmentRepository::try_new(&conn).unwrap();
    let user_id = Uuid::new_v4();
    conn.execute(
        "INSERT INTO semester_assignments (user_id, semester_index, course_ids)
         VALUES (?1, 0, 'not json');",
        [user_id.to_string()],
    )
    .unwrap();

    let err = repo.list_assignments(user_id).unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(_)));
}
