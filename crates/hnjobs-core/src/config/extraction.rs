//! Language-model extraction configuration.

use serde::{Deserialize, Serialize};

/// Hard upper bound on comments per extraction request.
pub const MAX_EXTRACTION_BATCH: usize = 30;

/// Settings for the hosted language model that parses job postings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Base URL of the provider's REST API.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Model name.
    #[serde(default = "default_model")]
    pub model: String,
    /// API key. Usually supplied through `HNJOBS__EXTRACTION__API_KEY`.
    #[serde(default)]
    pub api_key: String,
    /// Sampling temperature; kept low for deterministic parsing.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Maximum comments per request, clamped to [`MAX_EXTRACTION_BATCH`].
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,
    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl ExtractionConfig {
    /// Effective batch limit after clamping.
    pub fn batch_limit(&self) -> usize {
        self.max_batch_size.clamp(1, MAX_EXTRACTION_BATCH)
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            api_key: String::new(),
            temperature: default_temperature(),
            max_batch_size: default_max_batch_size(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_temperature() -> f32 {
    0.1
}

fn default_max_batch_size() -> usize {
    MAX_EXTRACTION_BATCH
}

fn default_request_timeout() -> u64 {
    120
}
