//! One-shot scrape command.

use serde::Serialize;

use crate::output::{self, OutputFormat};
use hnjobs_core::error::AppError;
use hnjobs_worker::{BatchOutcome, ScrapeReport};

#[derive(Debug, Serialize)]
struct ScrapeSummary {
    #[serde(flatten)]
    report: ScrapeReport,
    processed: BatchOutcome,
}

/// Scrape the hiring thread once and process every new comment
pub async fn execute(config_path: &str, format: OutputFormat) -> Result<(), AppError> {
    let config = super::load_config(config_path)?;
    let runner = super::create_runner(&config).await?;

    let (report, processed) = runner.scrape_once().await?;

    let story = report
        .story
        .map(|id| id.to_string())
        .unwrap_or_else(|| "none found".to_string());
    output::print_summary(
        "Scrape finished:",
        &[
            ("Hiring thread", story),
            ("New comments", report.new_comments.to_string()),
            ("Already stored", report.existing.to_string()),
            ("Skipped", report.skipped.to_string()),
            ("Completed", processed.completed.to_string()),
            ("Failed", processed.failed.to_string()),
        ],
        &ScrapeSummary { report, processed },
        format,
    );
    Ok(())
}
