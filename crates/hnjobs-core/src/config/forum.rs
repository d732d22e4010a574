//! Forum API configuration.

use serde::{Deserialize, Serialize};

/// Settings for discovering hiring threads on the forum.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForumConfig {
    /// Base URL of the forum's public JSON API.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Account that posts the monthly hiring threads.
    #[serde(default = "default_hiring_user")]
    pub hiring_user: String,
    /// Title prefix identifying a hiring thread.
    #[serde(default = "default_title_prefix")]
    pub title_prefix: String,
    /// How many of the account's most recent submissions to inspect.
    #[serde(default = "default_submissions_to_inspect")]
    pub submissions_to_inspect: usize,
    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    /// User-Agent header sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ForumConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            hiring_user: default_hiring_user(),
            title_prefix: default_title_prefix(),
            submissions_to_inspect: default_submissions_to_inspect(),
            request_timeout_seconds: default_request_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_base_url() -> String {
    "https://hacker-news.firebaseio.com/v0".to_string()
}

fn default_hiring_user() -> String {
    "whoishiring".to_string()
}

fn default_title_prefix() -> String {
    "Ask HN: Who is hiring?".to_string()
}

fn default_submissions_to_inspect() -> usize {
    3
}

fn default_request_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    concat!("hnjobs/", env!("CARGO_PKG_VERSION")).to_string()
}
