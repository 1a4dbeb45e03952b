use chrono::{NaiveDate, NaiveTime};
use tempfile::TempDir;
use uni_timetable_bot::database::{
    connection::DatabaseManager,
    models::{timetable_entries, Faculty, Lesson, SingleLesson, StudentsGroup, Teacher, User},
};

/// Helper function to create a test database
async fn create_test_db() -> (DatabaseManager, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let db_path = temp_dir.path().join("test.db");
    let db_url = format!("sqlite://{}", db_path.display());

    let db = DatabaseManager::new(&db_url)
        .await
        .expect("Failed to create test database");

    sqlx::migrate!("./migrations")
        .run(&db.pool)
        .await
        .expect("Failed to run migrations");

    (db, temp_dir)
}

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 9, 2).expect("date")
}

fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).expect("time")
}

async fn create_test_group(db: &DatabaseManager) -> StudentsGroup {
    let faculty = Faculty::create(&db.pool, "Computer Science", "CS")
        .await
        .expect("faculty");
    StudentsGroup::create(&db.pool, "K-25", 2, faculty.id)
        .await
        .expect("group")
}

#[tokio::test]
async fn test_day_includes_unsplit_and_member_subgroup_only() {
    let (db, _temp_dir) = create_test_db().await;
    let group = create_test_group(&db).await;

    let unsplit = Lesson::create(&db.pool, "Calculus", group.id, None, 0)
        .await
        .expect("lesson");
    let mine = Lesson::create(&db.pool, "English", group.id, Some("1"), 2)
        .await
        .expect("lesson");
    let other = Lesson::create(&db.pool, "English", group.id, Some("2"), 2)
        .await
        .expect("lesson");

    for (lesson, start) in [(&unsplit, 8), (&mine, 10), (&other, 10)] {
        SingleLesson::create(&db.pool, lesson.id, date(), time(start as u32, 40), time(start as u32 + 2, 15))
            .await
            .expect("occurrence");
    }

    User::acquire(&db.pool, 100, "alice").await.expect("acquire");
    User::assign_group(&db.pool, 100, group.id, &[mine.id])
        .await
        .expect("assign");

    let occurrences = SingleLesson::for_user_on_date(&db.pool, 100, group.id, date())
        .await
        .expect("query");
    let lesson_ids: Vec<i64> = occurrences.iter().map(|o| o.lesson_id).collect();
    assert_eq!(lesson_ids, vec![unsplit.id, mine.id]);
}

#[tokio::test]
async fn test_day_is_ordered_by_start_time() {
    let (db, _temp_dir) = create_test_db().await;
    let group = create_test_group(&db).await;

    let first = Lesson::create(&db.pool, "Algebra", group.id, None, 0)
        .await
        .expect("lesson");
    let second = Lesson::create(&db.pool, "Physics", group.id, None, 0)
        .await
        .expect("lesson");

    // Inserted out of order on purpose.
    SingleLesson::create(&db.pool, second.id, date(), time(12, 20), time(13, 55))
        .await
        .expect("occurrence");
    SingleLesson::create(&db.pool, first.id, date(), time(8, 40), time(10, 15))
        .await
        .expect("occurrence");

    User::acquire(&db.pool, 100, "alice").await.expect("acquire");
    User::assign_group(&db.pool, 100, group.id, &[])
        .await
        .expect("assign");

    let occurrences = SingleLesson::for_user_on_date(&db.pool, 100, group.id, date())
        .await
        .expect("query");
    assert_eq!(
        occurrences.iter().map(|o| o.lesson_id).collect::<Vec<_>>(),
        vec![first.id, second.id]
    );
}

#[tokio::test]
async fn test_other_groups_days_are_invisible() {
    let (db, _temp_dir) = create_test_db().await;
    let faculty = Faculty::create(&db.pool, "Computer Science", "CS")
        .await
        .expect("faculty");
    let mine = StudentsGroup::create(&db.pool, "K-25", 2, faculty.id)
        .await
        .expect("group");
    let theirs = StudentsGroup::create(&db.pool, "K-26", 2, faculty.id)
        .await
        .expect("group");

    let lesson = Lesson::create(&db.pool, "Calculus", theirs.id, None, 0)
        .await
        .expect("lesson");
    SingleLesson::create(&db.pool, lesson.id, date(), time(8, 40), time(10, 15))
        .await
        .expect("occurrence");

    User::acquire(&db.pool, 100, "alice").await.expect("acquire");
    User::assign_group(&db.pool, 100, mine.id, &[])
        .await
        .expect("assign");

    let occurrences = SingleLesson::for_user_on_date(&db.pool, 100, mine.id, date())
        .await
        .expect("query");
    assert!(occurrences.is_empty());
}

#[tokio::test]
async fn test_timetable_entries_carry_lesson_and_teachers() {
    let (db, _temp_dir) = create_test_db().await;
    let group = create_test_group(&db).await;

    let lesson = Lesson::create(&db.pool, "Calculus", group.id, None, 0)
        .await
        .expect("lesson");
    let teacher = Teacher::create(&db.pool, "Anna", "Koval", "Petrivna")
        .await
        .expect("teacher");
    Lesson::add_teacher(&db.pool, lesson.id, teacher.id)
        .await
        .expect("link teacher");
    SingleLesson::create(&db.pool, lesson.id, date(), time(8, 40), time(10, 15))
        .await
        .expect("occurrence");

    User::acquire(&db.pool, 100, "alice").await.expect("acquire");
    User::assign_group(&db.pool, 100, group.id, &[])
        .await
        .expect("assign");

    let entries = timetable_entries(&db.pool, 100, group.id, date())
        .await
        .expect("query");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].lesson.name, "Calculus");
    assert_eq!(entries[0].teachers.len(), 1);
    assert_eq!(entries[0].teachers[0].short_name(), "Koval A. P.");
}

#[tokio::test]
async fn test_link_visibility_mirrors_timetable_visibility() {
    let (db, _temp_dir) = create_test_db().await;
    let group = create_test_group(&db).await;

    let mine = Lesson::create(&db.pool, "English", group.id, Some("1"), 2)
        .await
        .expect("lesson");
    let other = Lesson::create(&db.pool, "English", group.id, Some("2"), 2)
        .await
        .expect("lesson");

    User::acquire(&db.pool, 100, "alice").await.expect("acquire");
    User::assign_group(&db.pool, 100, group.id, &[mine.id])
        .await
        .expect("assign");

    assert!(Lesson::find_visible_to_user(&db.pool, mine.id, 100, group.id)
        .await
        .expect("query")
        .is_some());
    assert!(Lesson::find_visible_to_user(&db.pool, other.id, 100, group.id)
        .await
        .expect("query")
        .is_none());
}
