//! Schema migrations for stories, comments, jobs, and tech-stack tags.

use sqlx::PgPool;
use tracing::info;

use hnjobs_core::error::{AppError, ErrorKind};
use hnjobs_core::result::AppResult;

/// Bring the schema up to date with the bundled migrations.
pub async fn run_migrations(pool: &PgPool) -> AppResult<()> {
    let migrator = sqlx::migrate!("../../migrations");
    let latest = migrator.iter().map(|m| m.version).max().unwrap_or_default();

    migrator.run(pool).await.map_err(|e| {
        AppError::with_source(ErrorKind::Database, "Schema migration failed", e)
    })?;

    info!(
        migrations = migrator.iter().count(),
        schema_version = latest,
        "Pipeline schema is up to date"
    );
    Ok(())
}
