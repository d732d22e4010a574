//! CLI command definitions and dispatch.

pub mod config;
pub mod migrate;
pub mod recover;
pub mod scrape;
pub mod status;

use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::output::OutputFormat;
use hnjobs_core::config::AppConfig;
use hnjobs_core::error::AppError;
use hnjobs_database::DatabasePool;
use hnjobs_extraction::GeminiExtractor;
use hnjobs_forum::HackerNewsClient;
use hnjobs_worker::Runner;

/// HN jobs: extracts structured listings from monthly hiring threads
#[derive(Debug, Parser)]
#[command(name = "hnjobs", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run pending database migrations
    Migrate,
    /// Scrape the current hiring thread once and process new comments
    Scrape,
    /// Re-feed unfinished comments and process them
    Recover(recover::RecoverArgs),
    /// Show comment counts per processing status
    Status,
    /// Configuration management
    Config(config::ConfigArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<(), AppError> {
        match &self.command {
            Commands::Migrate => migrate::execute(&self.config).await,
            Commands::Scrape => scrape::execute(&self.config, self.format).await,
            Commands::Recover(args) => recover::execute(args, &self.config, self.format).await,
            Commands::Status => status::execute(&self.config, self.format).await,
            Commands::Config(args) => config::execute(args, &self.config, self.format).await,
        }
    }
}

/// Helper: load configuration from file
pub fn load_config(config_path: &str) -> Result<AppConfig, AppError> {
    AppConfig::load(config_path)
}

/// Helper: create database pool from config
pub async fn create_db_pool(config: &AppConfig) -> Result<DatabasePool, AppError> {
    DatabasePool::connect(&config.database).await
}

/// Helper: wire a runner against the real database, forum, and model
pub async fn create_runner(config: &AppConfig) -> Result<Runner, AppError> {
    let pool = create_db_pool(config).await?;
    let store = Arc::new(pool.store());
    let forum = Arc::new(HackerNewsClient::new(&config.forum)?);
    let extractor = Arc::new(GeminiExtractor::new(&config.extraction)?);

    Ok(Runner::new(
        store,
        forum,
        extractor,
        config.forum.clone(),
        config.pipeline.clone(),
    ))
}
