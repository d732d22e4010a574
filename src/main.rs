//! HN Jobs Server — hiring-thread extraction pipeline
//!
//! Main entry point that wires all crates together and runs the pipeline
//! until Ctrl+C or SIGTERM.

use std::sync::Arc;

use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, fmt};

use hnjobs_core::config::AppConfig;
use hnjobs_core::error::AppError;
use hnjobs_database::DatabasePool;
use hnjobs_extraction::GeminiExtractor;
use hnjobs_forum::HackerNewsClient;
use hnjobs_worker::Runner;

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Load configuration from file and environment
fn load_configuration() -> Result<AppConfig, AppError> {
    let config_path =
        std::env::var("HNJOBS_CONFIG").unwrap_or_else(|_| "config/default.toml".to_string());

    AppConfig::load(&config_path)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting HN Jobs v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Database connection + migrations ─────────────────
    let db_pool = DatabasePool::connect(&config.database).await?;

    if config.database.run_migrations {
        db_pool.migrate().await?;
    }

    // ── Step 2: External collaborators ───────────────────────────
    let store = Arc::new(db_pool.store());
    let forum = Arc::new(HackerNewsClient::new(&config.forum)?);
    let extractor = Arc::new(GeminiExtractor::new(&config.extraction)?);
    tracing::info!(
        "Forum API at {}, extraction endpoint {}",
        forum.base_url(),
        extractor.endpoint()
    );

    // ── Step 3: Shutdown channel ─────────────────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received, starting graceful shutdown...");
        let _ = shutdown_tx.send(true);
    });

    // ── Step 4: Run the pipeline ─────────────────────────────────
    if config.pipeline.enabled {
        let mut runner = Runner::new(
            store,
            forum,
            extractor,
            config.forum.clone(),
            config.pipeline.clone(),
        );

        runner.run(shutdown_rx).await?;

        // ── Step 5: Drain buffered comments ──────────────────────
        let totals = runner.close().await;
        tracing::info!(
            "Pipeline stopped: {} comments completed, {} failed",
            totals.completed,
            totals.failed
        );
    } else {
        tracing::warn!("Pipeline disabled by configuration; waiting for shutdown");
        let mut shutdown_rx = shutdown_rx;
        while !*shutdown_rx.borrow() {
            if shutdown_rx.changed().await.is_err() {
                break;
            }
        }
    }

    db_pool.close().await;
    tracing::info!("HN Jobs server shut down complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
