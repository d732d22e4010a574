//! Configuration management CLI commands.

use clap::{Args, Subcommand};

use crate::output::{self, OutputFormat};
use hnjobs_core::config::mask_password;
use hnjobs_core::error::AppError;

/// Arguments for config commands
#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Config subcommand
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration with secrets masked
    Show,
    /// Validate configuration file
    Validate,
    /// Write the default configuration file
    Generate {
        /// Output file path
        #[arg(short, long, default_value = "config/generated.toml")]
        output: String,
    },
}

/// Execute config commands
pub async fn execute(
    args: &ConfigArgs,
    config_path: &str,
    format: OutputFormat,
) -> Result<(), AppError> {
    match &args.command {
        ConfigCommand::Show => {
            let config = super::load_config(config_path)?.redacted();
            output::print_summary(
                "Effective configuration:",
                &[
                    ("Database", config.database.url.clone()),
                    ("Forum API", config.forum.base_url.clone()),
                    ("Hiring user", config.forum.hiring_user.clone()),
                    ("Model", config.extraction.model.clone()),
                    ("API key", config.extraction.api_key.clone()),
                    ("Batch size", config.pipeline.batch_size.to_string()),
                    ("Queue capacity", config.pipeline.queue_capacity.to_string()),
                    (
                        "Scrape every",
                        format!("{}s", config.pipeline.scrape_interval_seconds),
                    ),
                    (
                        "Recover every",
                        format!("{}s", config.pipeline.recovery_interval_seconds),
                    ),
                ],
                &config,
                format,
            );
        }
        ConfigCommand::Validate => match super::load_config(config_path) {
            Ok(config) => {
                output::print_success(&format!("Configuration '{config_path}' is valid"));
                output::print_kv("Database", &mask_password(&config.database.url));
                output::print_kv("Model", &config.extraction.model);
                output::print_kv(
                    "API key set",
                    &(!config.extraction.api_key.is_empty()).to_string(),
                );
            }
            Err(e) => {
                output::print_error(&format!("Configuration invalid: {e}"));
                return Err(e);
            }
        },
        ConfigCommand::Generate { output: out_path } => {
            let default_config = include_str!("../../../../config/default.toml");

            if let Some(parent) = std::path::Path::new(out_path).parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(out_path, default_config).await?;

            output::print_success(&format!("Default config written to '{out_path}'"));
        }
    }

    Ok(())
}
