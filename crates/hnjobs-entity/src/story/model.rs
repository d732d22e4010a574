//! Story entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use hnjobs_core::types::StoryId;

/// A monthly hiring thread. Inserted once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Story {
    /// Forum-assigned ID.
    pub id: StoryId,
    /// Thread title, e.g. `"Ask HN: Who is hiring? (March 2025)"`.
    pub title: String,
    /// When the thread was posted.
    pub posted_at: DateTime<Utc>,
}
