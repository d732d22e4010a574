//! Connection pool for the pipeline database.

use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

use hnjobs_core::config::{DatabaseConfig, mask_password};
use hnjobs_core::error::{AppError, ErrorKind};
use hnjobs_core::result::AppResult;

use crate::migration;
use crate::store::PgPipelineStore;

/// Pool shared by the pipeline store and the CLI reports.
#[derive(Debug, Clone)]
pub struct DatabasePool {
    pool: PgPool,
}

impl DatabasePool {
    /// Open the pool described by `config`.
    pub async fn connect(config: &DatabaseConfig) -> AppResult<Self> {
        let url = mask_password(&config.url);

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .idle_timeout(Duration::from_secs(config.idle_timeout_seconds))
            .connect(&config.url)
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Database,
                    format!("Cannot reach pipeline database at {url}"),
                    e,
                )
            })?;

        info!(
            url = %url,
            pool_size = config.max_connections,
            "Pipeline database connected"
        );
        Ok(Self { pool })
    }

    /// Apply pending schema migrations.
    pub async fn migrate(&self) -> AppResult<()> {
        migration::run_migrations(&self.pool).await
    }

    /// A [`PgPipelineStore`] over this pool.
    pub fn store(&self) -> PgPipelineStore {
        PgPipelineStore::new(self.pool.clone())
    }

    /// The underlying sqlx pool, for repositories outside the store.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Close all connections.
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Pipeline database closed");
    }
}
