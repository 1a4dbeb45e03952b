use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Structured payload of a lesson-link change request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RequestMeta {
    /// Lesson whose link should change.
    pub lesson_id: i64,
    /// The proposed link.
    pub link: String,
}

/// Everything a handler knows about a request before it is persisted. The
/// moderator is resolved and the callback tokens are synthesized during
/// submission, once the row has an id.
#[derive(Debug, Clone)]
pub struct RequestDraft {
    /// Group this request relates to.
    pub students_group_id: i64,
    /// User who proposed the change.
    pub initiator_id: i64,
    /// Text shown to the moderator.
    pub message: String,
    /// Structured action payload.
    pub meta: RequestMeta,
}

/// A pending or resolved moderation request. Never deleted; resolved rows
/// stay as an audit trail.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Request {
    /// Primary key; embedded in the accept/reject callback tokens.
    pub id: i64,
    /// Group this request relates to.
    pub students_group_id: i64,
    /// User who proposed the change.
    pub initiator_id: i64,
    /// Moderator resolved at submission time; the only user who may resolve.
    pub moderator_id: i64,
    /// Text shown to the moderator.
    pub message: String,
    /// Callback token of the Accept button; empty until the second commit.
    pub accept_callback: String,
    /// Callback token of the Reject button; empty until the second commit.
    pub reject_callback: String,
    /// JSON-encoded [`RequestMeta`].
    pub meta: String,
    /// False until accepted or rejected; transitions true exactly once.
    pub is_resolved: bool,
}

impl Request {
    /// First commit of the two-phase submit: persists the draft with empty
    /// callback tokens and returns the new id the tokens will embed.
    pub async fn insert(
        pool: &sqlx::SqlitePool,
        draft: &RequestDraft,
        moderator_id: i64,
    ) -> Result<i64, sqlx::Error> {
        let meta = serde_json::to_string(&draft.meta)
            .map_err(|e| sqlx::Error::Protocol(e.to_string()))?;
        let result = sqlx::query(
            "INSERT INTO requests
                (students_group_id, initiator_id, moderator_id, message,
                 accept_callback, reject_callback, meta)
             VALUES (?, ?, ?, ?, '', '', ?)",
        )
        .bind(draft.students_group_id)
        .bind(draft.initiator_id)
        .bind(moderator_id)
        .bind(&draft.message)
        .bind(meta)
        .execute(pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    /// Second commit: stores the tokens synthesized from the persisted id.
    pub async fn set_callbacks(
        pool: &sqlx::SqlitePool,
        id: i64,
        accept_callback: &str,
        reject_callback: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE requests SET accept_callback = ?, reject_callback = ? WHERE id = ?")
            .bind(accept_callback)
            .bind(reject_callback)
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Looks a request up by id.
    pub async fn find_by_id(
        pool: &sqlx::SqlitePool,
        id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Request>(
            "SELECT id, students_group_id, initiator_id, moderator_id, message,
                    accept_callback, reject_callback, meta, is_resolved
             FROM requests WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Marks the request resolved. Never reset.
    pub async fn mark_resolved(pool: &sqlx::SqlitePool, id: i64) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE requests SET is_resolved = 1 WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Decodes the structured payload.
    pub fn parse_meta(&self) -> Result<RequestMeta, serde_json::Error> {
        serde_json::from_str(&self.meta)
    }
}
