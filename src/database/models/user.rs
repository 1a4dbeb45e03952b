use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A Telegram user known to the bot. Created on first interaction;
/// username and `last_active` are refreshed on every interaction.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    /// Telegram user id (primary key, not autoincrement).
    pub tg_id: i64,
    /// Telegram username at last interaction.
    pub tg_username: String,
    /// Assigned students group, if the user has picked one.
    pub students_group_id: Option<i64>,
    /// Administrator flag.
    pub is_admin: bool,
    /// Whether this user moderates their group's requests.
    pub is_group_moderator: bool,
    /// Timestamp of the last interaction.
    pub last_active: NaiveDateTime,
}

impl User {
    /// Fetch-or-create keyed by `tg_id`: creates the row on first contact,
    /// updates the stored username when it changed, and always refreshes
    /// `last_active`. Safe to call repeatedly within one interaction.
    pub async fn acquire(
        pool: &sqlx::SqlitePool,
        tg_id: i64,
        tg_username: &str,
    ) -> Result<Self, sqlx::Error> {
        let now = Utc::now().naive_utc();
        let existing = Self::find_by_id(pool, tg_id).await?;
        match existing {
            Some(_) => {
                sqlx::query("UPDATE users SET tg_username = ?, last_active = ? WHERE tg_id = ?")
                    .bind(tg_username)
                    .bind(now)
                    .bind(tg_id)
                    .execute(pool)
                    .await?;
            }
            None => {
                sqlx::query("INSERT INTO users (tg_id, tg_username, last_active) VALUES (?, ?, ?)")
                    .bind(tg_id)
                    .bind(tg_username)
                    .bind(now)
                    .execute(pool)
                    .await?;
            }
        }
        Self::find_by_id(pool, tg_id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    /// Looks a user up by Telegram id.
    pub async fn find_by_id(
        pool: &sqlx::SqlitePool,
        tg_id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            "SELECT tg_id, tg_username, students_group_id, is_admin, is_group_moderator, last_active
             FROM users WHERE tg_id = ?",
        )
        .bind(tg_id)
        .fetch_optional(pool)
        .await
    }

    /// The group's moderator. If several users were ever flagged, the pick
    /// is deterministic: lowest `tg_id` wins.
    pub async fn moderator_for_group(
        pool: &sqlx::SqlitePool,
        students_group_id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            "SELECT tg_id, tg_username, students_group_id, is_admin, is_group_moderator, last_active
             FROM users
             WHERE students_group_id = ? AND is_group_moderator = 1
             ORDER BY tg_id
             LIMIT 1",
        )
        .bind(students_group_id)
        .fetch_optional(pool)
        .await
    }

    /// Every user with an assigned group, for the daily broadcast.
    pub async fn with_group(pool: &sqlx::SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            "SELECT tg_id, tg_username, students_group_id, is_admin, is_group_moderator, last_active
             FROM users WHERE students_group_id IS NOT NULL ORDER BY tg_id",
        )
        .fetch_all(pool)
        .await
    }

    /// Commits a finished group selection in one transaction: assigns the
    /// group, revokes any moderator role held in the previous group, and
    /// replaces the user's subgroup memberships with `lesson_ids`.
    pub async fn assign_group(
        pool: &sqlx::SqlitePool,
        tg_id: i64,
        students_group_id: i64,
        lesson_ids: &[i64],
    ) -> Result<(), sqlx::Error> {
        let mut tx = pool.begin().await?;
        sqlx::query(
            "UPDATE users SET students_group_id = ?, is_group_moderator = 0 WHERE tg_id = ?",
        )
        .bind(students_group_id)
        .bind(tg_id)
        .execute(&mut tx)
        .await?;
        sqlx::query("DELETE FROM lessons_subgroups_members WHERE user_id = ?")
            .bind(tg_id)
            .execute(&mut tx)
            .await?;
        for lesson_id in lesson_ids {
            sqlx::query("INSERT INTO lessons_subgroups_members (lesson_id, user_id) VALUES (?, ?)")
                .bind(lesson_id)
                .bind(tg_id)
                .execute(&mut tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// Lesson ids of the user's current subgroup memberships.
    pub async fn subgroup_lesson_ids(
        pool: &sqlx::SqlitePool,
        tg_id: i64,
    ) -> Result<Vec<i64>, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT lesson_id FROM lessons_subgroups_members WHERE user_id = ? ORDER BY lesson_id",
        )
        .bind(tg_id)
        .fetch_all(pool)
        .await
    }

    /// Grants the group-moderator role. Used by operators and tests; the bot
    /// itself only ever clears the flag.
    pub async fn set_moderator(
        pool: &sqlx::SqlitePool,
        tg_id: i64,
        is_group_moderator: bool,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET is_group_moderator = ? WHERE tg_id = ?")
            .bind(is_group_moderator)
            .bind(tg_id)
            .execute(pool)
            .await?;
        Ok(())
    }
}
