use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A university faculty. Imported reference data.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Faculty {
    /// Primary key.
    pub id: i64,
    /// Full faculty name.
    pub name: String,
    /// Short display name.
    pub shortcut: String,
}

impl Faculty {
    /// Inserts a faculty. Exercised by the importer contract and tests.
    pub async fn create(
        pool: &sqlx::SqlitePool,
        name: &str,
        shortcut: &str,
    ) -> Result<Self, sqlx::Error> {
        let result = sqlx::query("INSERT INTO faculties (name, shortcut) VALUES (?, ?)")
            .bind(name)
            .bind(shortcut)
            .execute(pool)
            .await?;
        let id = result.last_insert_rowid();
        Self::find_by_id(pool, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    /// Looks a faculty up by id.
    pub async fn find_by_id(
        pool: &sqlx::SqlitePool,
        id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Faculty>("SELECT id, name, shortcut FROM faculties WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Faculties that actually have groups of the given course, for the
    /// faculty-selection keyboard.
    pub async fn with_course(
        pool: &sqlx::SqlitePool,
        course: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Faculty>(
            "SELECT DISTINCT f.id, f.name, f.shortcut
             FROM faculties f
             JOIN students_groups g ON g.faculty_id = f.id
             WHERE g.course = ?
             ORDER BY f.id",
        )
        .bind(course)
        .fetch_all(pool)
        .await
    }
}
