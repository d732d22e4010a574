//! Comment processing status.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Where a comment is in the extraction pipeline.
///
/// Normal flow is `queued → in_progress → {completed | failed}`. A
/// recovery scan may move `failed` back to `queued`; nothing else moves
/// backwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "comment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CommentStatus {
    /// Stored and waiting for extraction.
    Queued,
    /// Claimed by a batch that has not finished.
    InProgress,
    /// Extraction finished and any jobs were committed.
    Completed,
    /// Extraction or persistence failed; retried by the next recovery scan.
    Failed,
}

impl CommentStatus {
    /// Every status, in pipeline order.
    pub const ALL: [CommentStatus; 4] = [
        Self::Queued,
        Self::InProgress,
        Self::Completed,
        Self::Failed,
    ];

    /// Statuses the startup recovery scan re-feeds.
    pub const NON_TERMINAL: [CommentStatus; 3] = [Self::Queued, Self::InProgress, Self::Failed];

    /// Check if no further processing is expected.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Check whether moving to `next` is a legal transition.
    ///
    /// Re-marking a comment `in_progress` is allowed so that crash
    /// leftovers and at-least-once re-feeds can be picked up again.
    pub fn can_transition_to(&self, next: CommentStatus) -> bool {
        use CommentStatus::*;
        matches!(
            (self, next),
            (Queued, InProgress)
                | (InProgress, InProgress)
                | (InProgress, Completed)
                | (InProgress, Failed)
                | (Failed, Queued)
                | (Failed, InProgress)
        )
    }

    /// Statuses from which moving to `next` is legal.
    pub fn predecessors(next: CommentStatus) -> impl Iterator<Item = CommentStatus> {
        Self::ALL.into_iter().filter(move |s| s.can_transition_to(next))
    }

    /// Return the status as stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for CommentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CommentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "queued" => Ok(Self::Queued),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(format!("unknown comment status '{other}'")),
        }
    }
}
