//! Data-store contract used by the scraper, processor, and runner.
//!
//! The pipeline only talks to storage through [`PipelineStore`] so it can
//! be driven by an in-memory store in tests. [`PgPipelineStore`] is the
//! PostgreSQL implementation built on the repositories in this crate.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use hnjobs_core::error::{AppError, ErrorKind};
use hnjobs_core::result::AppResult;
use hnjobs_core::types::{CommentId, JobId, StoryId};
use hnjobs_entity::comment::{CommentStatus, NewComment};
use hnjobs_entity::job::Job;
use hnjobs_entity::story::Story;

use crate::repositories::{CommentRepository, JobRepository, StoryRepository};

/// Durable storage for stories, comments, and extracted jobs.
#[async_trait]
pub trait PipelineStore: Send + Sync + 'static {
    /// Whether a story with this ID is stored. Absence is `Ok(false)`.
    async fn story_exists(&self, id: StoryId) -> AppResult<bool>;

    /// Store a newly discovered story.
    async fn insert_story(&self, story: &Story) -> AppResult<()>;

    /// Whether a comment with this ID is stored. Absence is `Ok(false)`.
    async fn comment_exists(&self, id: CommentId) -> AppResult<bool>;

    /// Store a newly discovered comment with status `queued`.
    async fn insert_comment(&self, comment: &NewComment) -> AppResult<()>;

    /// Raw text of a comment, or `None` if it is unknown.
    async fn comment_text(&self, id: CommentId) -> AppResult<Option<String>>;

    /// Move a comment to `in_progress` if its current status allows it.
    ///
    /// Returns `false` for completed or unknown comments, which must not be
    /// processed again.
    async fn claim_comment(&self, id: CommentId) -> AppResult<bool>;

    /// Set the processing status of a comment.
    async fn update_comment_status(&self, id: CommentId, status: CommentStatus) -> AppResult<()>;

    /// IDs of all comments in any of `statuses`.
    async fn comment_ids_by_status(&self, statuses: &[CommentStatus]) -> AppResult<Vec<CommentId>>;

    /// Move every `failed` comment back to `queued`, returning their IDs.
    async fn requeue_failed(&self) -> AppResult<Vec<CommentId>>;

    /// Number of comments per status.
    async fn count_by_status(&self) -> AppResult<Vec<(CommentStatus, i64)>>;

    /// Open a transaction for one comment's job rows.
    async fn begin(&self) -> AppResult<Box<dyn JobTransaction>>;
}

/// A unit of work that inserts one comment's jobs and tags atomically.
///
/// Dropping a transaction without committing discards its writes.
#[async_trait]
pub trait JobTransaction: Send {
    /// Insert a job row.
    async fn insert_job(&mut self, job: &Job) -> AppResult<()>;

    /// Insert one tech-stack tag for a job inserted in this transaction.
    async fn insert_tech_stack(&mut self, job_id: JobId, value: &str) -> AppResult<()>;

    /// Make every write visible.
    async fn commit(self: Box<Self>) -> AppResult<()>;

    /// Discard every write.
    async fn rollback(self: Box<Self>) -> AppResult<()>;
}

/// PostgreSQL implementation of [`PipelineStore`].
#[derive(Debug, Clone)]
pub struct PgPipelineStore {
    pool: PgPool,
    stories: StoryRepository,
    comments: CommentRepository,
}

impl PgPipelineStore {
    /// Create a store over `pool`.
    pub fn new(pool: PgPool) -> Self {
        Self {
            stories: StoryRepository::new(pool.clone()),
            comments: CommentRepository::new(pool.clone()),
            pool,
        }
    }
}

#[async_trait]
impl PipelineStore for PgPipelineStore {
    async fn story_exists(&self, id: StoryId) -> AppResult<bool> {
        self.stories.exists(id).await
    }

    async fn insert_story(&self, story: &Story) -> AppResult<()> {
        self.stories.insert(story).await
    }

    async fn comment_exists(&self, id: CommentId) -> AppResult<bool> {
        self.comments.exists(id).await
    }

    async fn insert_comment(&self, comment: &NewComment) -> AppResult<()> {
        self.comments.insert(comment).await
    }

    async fn comment_text(&self, id: CommentId) -> AppResult<Option<String>> {
        self.comments.find_text(id).await
    }

    async fn claim_comment(&self, id: CommentId) -> AppResult<bool> {
        self.comments.claim(id).await
    }

    async fn update_comment_status(&self, id: CommentId, status: CommentStatus) -> AppResult<()> {
        self.comments.update_status(id, status).await
    }

    async fn comment_ids_by_status(&self, statuses: &[CommentStatus]) -> AppResult<Vec<CommentId>> {
        self.comments.ids_by_status(statuses).await
    }

    async fn requeue_failed(&self) -> AppResult<Vec<CommentId>> {
        self.comments.requeue_failed().await
    }

    async fn count_by_status(&self) -> AppResult<Vec<(CommentStatus, i64)>> {
        self.comments.count_by_status().await
    }

    async fn begin(&self) -> AppResult<Box<dyn JobTransaction>> {
        let tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;
        Ok(Box::new(PgJobTransaction { tx }))
    }
}

/// [`JobTransaction`] backed by a sqlx PostgreSQL transaction.
struct PgJobTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl JobTransaction for PgJobTransaction {
    async fn insert_job(&mut self, job: &Job) -> AppResult<()> {
        JobRepository::insert(&mut *self.tx, job).await
    }

    async fn insert_tech_stack(&mut self, job_id: JobId, value: &str) -> AppResult<()> {
        JobRepository::insert_tech_stack(&mut *self.tx, job_id, value).await
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        self.tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit transaction", e)
        })
    }

    async fn rollback(self: Box<Self>) -> AppResult<()> {
        self.tx.rollback().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to roll back transaction", e)
        })
    }
}
