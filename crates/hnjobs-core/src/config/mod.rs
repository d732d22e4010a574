//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate, overlaid with `HNJOBS__`-prefixed environment variables.
//! Each sub-module represents a logical configuration section.

pub mod database;
pub mod extraction;
pub mod forum;
pub mod logging;
pub mod pipeline;

use serde::{Deserialize, Serialize};

pub use self::database::DatabaseConfig;
pub use self::extraction::{ExtractionConfig, MAX_EXTRACTION_BATCH};
pub use self::forum::ForumConfig;
pub use self::logging::LoggingConfig;
pub use self::pipeline::PipelineConfig;

use crate::error::AppError;

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Database connection settings.
    pub database: DatabaseConfig,
    /// Forum API settings.
    #[serde(default)]
    pub forum: ForumConfig,
    /// Language-model extraction settings.
    #[serde(default)]
    pub extraction: ExtractionConfig,
    /// Queue, batching, and timer settings.
    #[serde(default)]
    pub pipeline: PipelineConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from TOML files and the environment.
    ///
    /// Merges `config/default` (if present), the file at `path` (if present),
    /// and environment variables prefixed with `HNJOBS__`, then validates.
    pub fn load(path: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("HNJOBS")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let config: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from an in-memory TOML document.
    pub fn from_toml_str(toml: &str) -> Result<Self, AppError> {
        let config: Self = config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), AppError> {
        let pipeline = &self.pipeline;

        if pipeline.queue_capacity == 0 {
            return Err(AppError::configuration(
                "pipeline.queue_capacity must be at least 1",
            ));
        }
        if pipeline.batch_size == 0 || pipeline.batch_size > MAX_EXTRACTION_BATCH {
            return Err(AppError::configuration(format!(
                "pipeline.batch_size must be between 1 and {MAX_EXTRACTION_BATCH}, got {}",
                pipeline.batch_size
            )));
        }
        if pipeline.scrape_interval_seconds == 0 || pipeline.recovery_interval_seconds == 0 {
            return Err(AppError::configuration(
                "pipeline intervals must be greater than zero",
            ));
        }
        if self.forum.submissions_to_inspect == 0 {
            return Err(AppError::configuration(
                "forum.submissions_to_inspect must be at least 1",
            ));
        }

        Ok(())
    }

    /// Copy of the configuration with secrets masked, for display.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if !copy.extraction.api_key.is_empty() {
            copy.extraction.api_key = "****".to_string();
        }
        copy.database.url = mask_password(&copy.database.url);
        copy
    }
}

/// Mask the password portion of a connection URL for safe logging.
pub fn mask_password(url: &str) -> String {
    if let Some(at_pos) = url.find('@') {
        if let Some(colon_pos) = url[..at_pos].rfind(':') {
            let scheme_end = url.find("://").map(|p| p + 3).unwrap_or(0);
            if colon_pos > scheme_end {
                return format!("{}:****@{}", &url[..colon_pos], &url[at_pos + 1..]);
            }
        }
    }
    url.to_string()
}
