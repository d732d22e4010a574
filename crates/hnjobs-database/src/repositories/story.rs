//! Story repository implementation.

use sqlx::PgPool;

use hnjobs_core::error::{AppError, ErrorKind};
use hnjobs_core::result::AppResult;
use hnjobs_core::types::StoryId;
use hnjobs_entity::story::Story;

/// Repository for hiring threads.
#[derive(Debug, Clone)]
pub struct StoryRepository {
    pool: PgPool,
}

impl StoryRepository {
    /// Create a new story repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Check whether a story has already been stored.
    pub async fn exists(&self, id: StoryId) -> AppResult<bool> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM stories WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to check story", e))
    }

    /// Most recently posted story, if any.
    pub async fn latest(&self) -> AppResult<Option<Story>> {
        sqlx::query_as::<_, Story>(
            "SELECT id, title, posted_at FROM stories ORDER BY posted_at DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find latest story", e))
    }

    /// Insert a story. Inserting an existing ID is a no-op.
    pub async fn insert(&self, story: &Story) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO stories (id, title, posted_at) VALUES ($1, $2, $3) \
             ON CONFLICT (id) DO NOTHING",
        )
        .bind(story.id)
        .bind(&story.title)
        .bind(story.posted_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to insert story", e))?;
        Ok(())
    }
}
