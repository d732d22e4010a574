//! Comment repository implementation.

use sqlx::PgPool;

use hnjobs_core::error::{AppError, ErrorKind};
use hnjobs_core::result::AppResult;
use hnjobs_core::types::CommentId;
use hnjobs_entity::comment::{CommentStatus, NewComment};

/// Repository for raw comments and their processing status.
#[derive(Debug, Clone)]
pub struct CommentRepository {
    pool: PgPool,
}

impl CommentRepository {
    /// Create a new comment repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Check whether a comment has already been stored.
    pub async fn exists(&self, id: CommentId) -> AppResult<bool> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM comments WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to check comment", e))
    }

    /// Raw text of a comment, or `None` if it is unknown.
    pub async fn find_text(&self, id: CommentId) -> AppResult<Option<String>> {
        sqlx::query_scalar::<_, String>("SELECT value FROM comments WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to fetch comment text", e)
            })
    }

    /// Insert a new comment with status `queued`. Inserting an existing ID is a no-op.
    pub async fn insert(&self, comment: &NewComment) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO comments (id, story_id, value, commented_at, status) \
             VALUES ($1, $2, $3, $4, 'queued') ON CONFLICT (id) DO NOTHING",
        )
        .bind(comment.id)
        .bind(comment.story_id)
        .bind(&comment.value)
        .bind(comment.commented_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to insert comment", e))?;
        Ok(())
    }

    /// Set the processing status of a comment.
    pub async fn update_status(&self, id: CommentId, status: CommentStatus) -> AppResult<()> {
        sqlx::query("UPDATE comments SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(status)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to update comment status", e)
            })?;
        Ok(())
    }

    /// Mark a comment `in_progress` unless it is completed or unknown.
    /// Returns whether the comment was claimed.
    pub async fn claim(&self, id: CommentId) -> AppResult<bool> {
        let from: Vec<String> = CommentStatus::predecessors(CommentStatus::InProgress)
            .map(|s| s.as_str().to_string())
            .collect();

        let claimed = sqlx::query_scalar::<_, CommentId>(
            "UPDATE comments SET status = 'in_progress' \
             WHERE id = $1 AND status::text = ANY($2) RETURNING id",
        )
        .bind(id)
        .bind(from)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to claim comment", e))?;

        Ok(claimed.is_some())
    }

    /// IDs of all comments in any of `statuses`, oldest first.
    pub async fn ids_by_status(&self, statuses: &[CommentStatus]) -> AppResult<Vec<CommentId>> {
        if statuses.is_empty() {
            return Ok(Vec::new());
        }

        let names: Vec<String> = statuses.iter().map(|s| s.as_str().to_string()).collect();

        sqlx::query_scalar::<_, CommentId>(
            "SELECT id FROM comments WHERE status::text = ANY($1) ORDER BY id ASC",
        )
        .bind(names)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list comments by status", e)
        })
    }

    /// Move every `failed` comment back to `queued` and return their IDs.
    pub async fn requeue_failed(&self) -> AppResult<Vec<CommentId>> {
        sqlx::query_scalar::<_, CommentId>(
            "UPDATE comments SET status = 'queued' WHERE status = 'failed' RETURNING id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to requeue failed comments", e)
        })
    }

    /// Number of comments per status.
    pub async fn count_by_status(&self) -> AppResult<Vec<(CommentStatus, i64)>> {
        sqlx::query_as::<_, (CommentStatus, i64)>(
            "SELECT status, COUNT(*) FROM comments GROUP BY status ORDER BY status",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count comments", e))
    }
}
