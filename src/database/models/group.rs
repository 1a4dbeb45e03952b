use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A students group within a faculty and course. Imported reference data.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct StudentsGroup {
    /// Primary key.
    pub id: i64,
    /// Group name, e.g. "K-25".
    pub name: String,
    /// Course (study year) number.
    pub course: i64,
    /// Owning faculty.
    pub faculty_id: i64,
}

impl StudentsGroup {
    /// Inserts a group. Exercised by the importer contract and tests.
    pub async fn create(
        pool: &sqlx::SqlitePool,
        name: &str,
        course: i64,
        faculty_id: i64,
    ) -> Result<Self, sqlx::Error> {
        let result =
            sqlx::query("INSERT INTO students_groups (name, course, faculty_id) VALUES (?, ?, ?)")
                .bind(name)
                .bind(course)
                .bind(faculty_id)
                .execute(pool)
                .await?;
        let id = result.last_insert_rowid();
        Self::find_by_id(pool, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    /// Looks a group up by id.
    pub async fn find_by_id(
        pool: &sqlx::SqlitePool,
        id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, StudentsGroup>(
            "SELECT id, name, course, faculty_id FROM students_groups WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Distinct course numbers across all groups, ascending.
    pub async fn distinct_courses(pool: &sqlx::SqlitePool) -> Result<Vec<i64>, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT DISTINCT course FROM students_groups ORDER BY course",
        )
        .fetch_all(pool)
        .await
    }

    /// Whether any group of this course exists; validates course callbacks.
    pub async fn course_exists(
        pool: &sqlx::SqlitePool,
        course: i64,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM students_groups WHERE course = ?)",
        )
        .bind(course)
        .fetch_one(pool)
        .await
    }

    /// Groups of one faculty and course, ordered by name.
    pub async fn by_faculty_and_course(
        pool: &sqlx::SqlitePool,
        faculty_id: i64,
        course: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, StudentsGroup>(
            "SELECT id, name, course, faculty_id
             FROM students_groups
             WHERE faculty_id = ? AND course = ?
             ORDER BY name",
        )
        .bind(faculty_id)
        .bind(course)
        .fetch_all(pool)
        .await
    }
}
