//! Job repository implementation.
//!
//! Inserts take a caller-supplied connection so they can run inside the
//! per-comment transaction opened by the processor.

use sqlx::{PgConnection, PgPool};

use hnjobs_core::error::{AppError, ErrorKind};
use hnjobs_core::result::AppResult;
use hnjobs_core::types::JobId;
use hnjobs_entity::job::Job;

/// Repository for extracted jobs and their tech-stack tags.
#[derive(Debug, Clone)]
pub struct JobRepository {
    pool: PgPool,
}

impl JobRepository {
    /// Create a new job repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a job row on `conn`.
    pub async fn insert(conn: &mut PgConnection, job: &Job) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO jobs (id, comment_id, company, company_description, company_url, contact, \
             title, description, role_type, application_url, location, salary, equity, \
             is_remote, is_hybrid, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)",
        )
        .bind(job.id)
        .bind(job.comment_id)
        .bind(&job.company)
        .bind(&job.company_description)
        .bind(&job.company_url)
        .bind(&job.contact)
        .bind(&job.title)
        .bind(&job.description)
        .bind(&job.role_type)
        .bind(&job.application_url)
        .bind(&job.location)
        .bind(&job.salary)
        .bind(&job.equity)
        .bind(job.is_remote)
        .bind(job.is_hybrid)
        .bind(job.created_at)
        .execute(conn)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to insert job", e))?;
        Ok(())
    }

    /// Insert one tech-stack tag for `job_id` on `conn`.
    pub async fn insert_tech_stack(
        conn: &mut PgConnection,
        job_id: JobId,
        value: &str,
    ) -> AppResult<()> {
        sqlx::query("INSERT INTO tech_stack (job_id, value) VALUES ($1, $2)")
            .bind(job_id)
            .bind(value)
            .execute(conn)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to insert tech stack", e)
            })?;
        Ok(())
    }

    /// Total number of stored jobs.
    pub async fn count(&self) -> AppResult<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM jobs")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count jobs", e))
    }
}
