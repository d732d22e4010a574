//! One-shot recovery command.

use clap::Args;
use serde::Serialize;

use crate::output::{self, OutputFormat};
use hnjobs_core::error::AppError;
use hnjobs_entity::comment::CommentStatus;
use hnjobs_worker::BatchOutcome;

/// Arguments for the recover command
#[derive(Debug, Args)]
pub struct RecoverArgs {
    /// Only re-feed comments whose extraction failed
    #[arg(long)]
    pub failed_only: bool,
}

#[derive(Debug, Serialize)]
struct RecoverSummary {
    queued: usize,
    processed: BatchOutcome,
}

/// Re-feed unfinished comments and process them to completion
pub async fn execute(
    args: &RecoverArgs,
    config_path: &str,
    format: OutputFormat,
) -> Result<(), AppError> {
    let config = super::load_config(config_path)?;
    let runner = super::create_runner(&config).await?;

    let statuses: &[CommentStatus] = if args.failed_only {
        &[CommentStatus::Failed]
    } else {
        &CommentStatus::NON_TERMINAL
    };
    let (queued, processed) = runner.recover_once(statuses).await?;

    output::print_summary(
        "Recovery finished:",
        &[
            ("Re-queued", queued.to_string()),
            ("Completed", processed.completed.to_string()),
            ("Failed", processed.failed.to_string()),
        ],
        &RecoverSummary { queued, processed },
        format,
    );
    Ok(())
}
