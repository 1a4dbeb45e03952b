use tempfile::TempDir;
use uni_timetable_bot::bot::moderation::{
    apply_resolution, create_request, Resolution, ResolveOutcome,
};
use uni_timetable_bot::bot::states::StateRegistry;
use uni_timetable_bot::database::{
    connection::DatabaseManager,
    models::{Faculty, Lesson, Request, RequestDraft, RequestMeta, StudentsGroup, User},
};
use uni_timetable_bot::error::BotError;

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

struct Fixture {
    group_id: i64,
    lesson: Lesson,
}

/// A group with an initiator (tg_id 100), optionally a moderator (tg_id
/// 200), and one lesson.
async fn fixture(db: &DatabaseManager, with_moderator: bool) -> Fixture {
    let faculty = Faculty::create(&db.pool, "Computer Science", "CS")
        .await
        .expect("faculty");
    let group = StudentsGroup::create(&db.pool, "K-25", 2, faculty.id)
        .await
        .expect("group");

    User::acquire(&db.pool, 100, "initiator").await.expect("acquire");
    User::assign_group(&db.pool, 100, group.id, &[])
        .await
        .expect("assign");
    if with_moderator {
        User::acquire(&db.pool, 200, "moderator").await.expect("acquire");
        User::assign_group(&db.pool, 200, group.id, &[])
            .await
            .expect("assign");
        User::set_moderator(&db.pool, 200, true)
            .await
            .expect("set moderator");
    }

    let lesson = Lesson::create(&db.pool, "Calculus", group.id, None, 0)
        .await
        .expect("lesson");
    Fixture {
        group_id: group.id,
        lesson,
    }
}

fn draft(f: &Fixture, link: &str) -> RequestDraft {
    RequestDraft {
        students_group_id: f.group_id,
        initiator_id: 100,
        message: "@initiator wants to set a new link".to_string(),
        meta: RequestMeta {
            lesson_id: f.lesson.id,
            link: link.to_string(),
        },
    }
}

async fn request_count(db: &DatabaseManager) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(1) FROM requests")
        .fetch_one(&db.pool)
        .await
        .expect("count")
}

#[tokio::test]
async fn test_no_moderator_persists_nothing() {
    let (db, _temp_dir) = create_test_db().await;
    let states = StateRegistry::new().expect("registry");
    let f = fixture(&db, false).await;

    let result = create_request(&db.pool, &states, &draft(&f, "https://meet.example/a")).await;
    assert!(matches!(result, Err(BotError::NoModerator)));
    assert_eq!(request_count(&db).await, 0);
}

#[tokio::test]
async fn test_submit_persists_tokens_embedding_id() {
    let (db, _temp_dir) = create_test_db().await;
    let states = StateRegistry::new().expect("registry");
    let f = fixture(&db, true).await;

    let request = create_request(&db.pool, &states, &draft(&f, "https://meet.example/a"))
        .await
        .expect("create");

    assert_eq!(request.moderator_id, 200);
    assert!(!request.is_resolved);
    assert!(!request.accept_callback.is_empty());
    assert!(!request.reject_callback.is_empty());

    let accept_args = states
        .moderator_accept_link
        .parse(&request.accept_callback)
        .expect("accept token must parse");
    assert_eq!(accept_args, vec![request.id.to_string()]);
    let reject_args = states
        .moderator_reject_link
        .parse(&request.reject_callback)
        .expect("reject token must parse");
    assert_eq!(reject_args, vec![request.id.to_string()]);
}

#[tokio::test]
async fn test_accept_applies_link_and_resolves() {
    let (db, _temp_dir) = create_test_db().await;
    let states = StateRegistry::new().expect("registry");
    let f = fixture(&db, true).await;

    let request = create_request(&db.pool, &states, &draft(&f, "https://meet.example/a"))
        .await
        .expect("create");
    let (resolved, resolution) = apply_resolution(&db.pool, request.id, ResolveOutcome::Accept)
        .await
        .expect("resolve");

    assert_eq!(resolution, Resolution::Accepted { link_applied: true });
    assert_eq!(resolved.id, request.id);

    let lesson = Lesson::find_by_id(&db.pool, f.lesson.id)
        .await
        .expect("query")
        .expect("lesson");
    assert_eq!(lesson.link.as_deref(), Some("https://meet.example/a"));

    let stored = Request::find_by_id(&db.pool, request.id)
        .await
        .expect("query")
        .expect("request");
    assert!(stored.is_resolved);
}

#[tokio::test]
async fn test_first_resolution_wins() {
    let (db, _temp_dir) = create_test_db().await;
    let states = StateRegistry::new().expect("registry");
    let f = fixture(&db, true).await;

    let request = create_request(&db.pool, &states, &draft(&f, "https://meet.example/a"))
        .await
        .expect("create");
    let (_, resolution) = apply_resolution(&db.pool, request.id, ResolveOutcome::Reject)
        .await
        .expect("first resolve");
    assert_eq!(resolution, Resolution::Rejected);

    // Accept after reject must not go through.
    let second = apply_resolution(&db.pool, request.id, ResolveOutcome::Accept).await;
    assert!(matches!(second, Err(BotError::AlreadyResolved)));

    let lesson = Lesson::find_by_id(&db.pool, f.lesson.id)
        .await
        .expect("query")
        .expect("lesson");
    assert_eq!(lesson.link, None);
}

#[tokio::test]
async fn test_accept_with_vanished_lesson_still_resolves() {
    let (db, _temp_dir) = create_test_db().await;
    let states = StateRegistry::new().expect("registry");
    let f = fixture(&db, true).await;

    let request = create_request(&db.pool, &states, &draft(&f, "https://meet.example/a"))
        .await
        .expect("create");

    sqlx::query("DELETE FROM lessons WHERE id = ?")
        .bind(f.lesson.id)
        .execute(&db.pool)
        .await
        .expect("delete lesson");

    let (_, resolution) = apply_resolution(&db.pool, request.id, ResolveOutcome::Accept)
        .await
        .expect("resolve");
    assert_eq!(resolution, Resolution::Accepted { link_applied: false });

    let stored = Request::find_by_id(&db.pool, request.id)
        .await
        .expect("query")
        .expect("request");
    assert!(stored.is_resolved);
}

#[tokio::test]
async fn test_resolving_unknown_request_fails() {
    let (db, _temp_dir) = create_test_db().await;

    let result = apply_resolution(&db.pool, 999, ResolveOutcome::Accept).await;
    assert!(matches!(result, Err(BotError::NotFound(_))));
}

#[tokio::test]
async fn test_resolved_requests_stay_as_audit_trail() {
    let (db, _temp_dir) = create_test_db().await;
    let states = StateRegistry::new().expect("registry");
    let f = fixture(&db, true).await;

    let request = create_request(&db.pool, &states, &draft(&f, "https://meet.example/a"))
        .await
        .expect("create");
    apply_resolution(&db.pool, request.id, ResolveOutcome::Reject)
        .await
        .expect("resolve");

    assert_eq!(request_count(&db).await, 1);
    let meta = Request::find_by_id(&db.pool, request.id)
        .await
        .expect("query")
        .expect("request")
        .parse_meta()
        .expect("meta");
    assert_eq!(meta.lesson_id, f.lesson.id);
    assert_eq!(meta.link, "https://meet.example/a");
}
