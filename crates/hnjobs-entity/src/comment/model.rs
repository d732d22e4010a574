//! Comment entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use hnjobs_core::types::{CommentId, StoryId};

use super::status::CommentStatus;

/// One raw reply under a hiring thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Comment {
    /// Forum-assigned ID.
    pub id: CommentId,
    /// Owning thread.
    pub story_id: StoryId,
    /// Raw comment HTML as returned by the forum.
    pub value: String,
    /// When the comment was posted.
    pub commented_at: DateTime<Utc>,
    /// Processing status.
    pub status: CommentStatus,
}

/// Data required to store a newly discovered comment.
///
/// New comments always start out [`CommentStatus::Queued`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewComment {
    /// Forum-assigned ID.
    pub id: CommentId,
    /// Owning thread.
    pub story_id: StoryId,
    /// Raw comment HTML.
    pub value: String,
    /// When the comment was posted.
    pub commented_at: DateTime<Utc>,
}

impl NewComment {
    /// Materialize the row as it will be stored.
    pub fn into_comment(self) -> Comment {
        Comment {
            id: self.id,
            story_id: self.story_id,
            value: self.value,
            commented_at: self.commented_at,
            status: CommentStatus::Queued,
        }
    }
}
