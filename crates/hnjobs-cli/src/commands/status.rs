//! Pipeline progress: comment counts per status and stored jobs.

use serde::Serialize;
use tabled::Tabled;

use crate::output::{self, OutputFormat};
use hnjobs_core::error::AppError;
use hnjobs_database::repositories::{JobRepository, StoryRepository};
use hnjobs_database::PipelineStore;
use hnjobs_entity::comment::CommentStatus;
use hnjobs_entity::story::Story;

#[derive(Debug, Serialize, Tabled)]
struct StatusRow {
    #[tabled(rename = "Status")]
    status: CommentStatus,
    #[tabled(rename = "Comments")]
    count: i64,
}

#[derive(Debug, Serialize)]
struct StatusReport {
    latest_thread: Option<Story>,
    jobs: i64,
    comments: Vec<StatusRow>,
}

/// Print the latest thread, the stored job count, and how many comments
/// are in each processing status
pub async fn execute(config_path: &str, format: OutputFormat) -> Result<(), AppError> {
    let config = super::load_config(config_path)?;
    let pool = super::create_db_pool(&config).await?;
    let store = pool.store();

    let counts = store.count_by_status().await?;
    let comments: Vec<StatusRow> = CommentStatus::ALL
        .iter()
        .map(|status| StatusRow {
            status: *status,
            count: counts
                .iter()
                .find(|(s, _)| s == status)
                .map(|(_, n)| *n)
                .unwrap_or(0),
        })
        .collect();

    let report = StatusReport {
        latest_thread: StoryRepository::new(pool.pool().clone()).latest().await?,
        jobs: JobRepository::new(pool.pool().clone()).count().await?,
        comments,
    };
    pool.close().await;

    match format {
        OutputFormat::Table => {
            let thread = report
                .latest_thread
                .as_ref()
                .map(|s| format!("{} ({})", s.title, s.id))
                .unwrap_or_else(|| "none".to_string());
            output::print_kv("Latest thread", &thread);
            output::print_kv("Jobs stored", &report.jobs.to_string());
            output::print_list(&report.comments, format);
        }
        OutputFormat::Json => output::print_summary("Status", &[], &report, format),
    }
    Ok(())
}
