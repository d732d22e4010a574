//! Scheduling and batching configuration for the ingestion pipeline.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Queue, batching, and timer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Whether the server starts the pipeline at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Capacity of the bounded comment queue.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// Maximum comments per extraction batch.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// How long to wait for another comment before flushing a partial batch.
    #[serde(default = "default_batch_idle_timeout")]
    pub batch_idle_timeout_ms: u64,
    /// Interval between scraper runs, in seconds.
    #[serde(default = "default_scrape_interval")]
    pub scrape_interval_seconds: u64,
    /// Interval between failed-comment recovery scans, in seconds.
    #[serde(default = "default_recovery_interval")]
    pub recovery_interval_seconds: u64,
}

impl PipelineConfig {
    /// Idle flush timeout as a [`Duration`].
    pub fn batch_idle_timeout(&self) -> Duration {
        Duration::from_millis(self.batch_idle_timeout_ms)
    }

    /// Scrape period as a [`Duration`].
    pub fn scrape_interval(&self) -> Duration {
        Duration::from_secs(self.scrape_interval_seconds)
    }

    /// Recovery period as a [`Duration`].
    pub fn recovery_interval(&self) -> Duration {
        Duration::from_secs(self.recovery_interval_seconds)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            queue_capacity: default_queue_capacity(),
            batch_size: default_batch_size(),
            batch_idle_timeout_ms: default_batch_idle_timeout(),
            scrape_interval_seconds: default_scrape_interval(),
            recovery_interval_seconds: default_recovery_interval(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_queue_capacity() -> usize {
    1000
}

fn default_batch_size() -> usize {
    30
}

fn default_batch_idle_timeout() -> u64 {
    5_000
}

fn default_scrape_interval() -> u64 {
    4 * 60 * 60
}

fn default_recovery_interval() -> u64 {
    12 * 60 * 60
}
