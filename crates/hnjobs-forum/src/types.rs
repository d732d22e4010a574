//! Forum API data types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A forum account and the items it has submitted, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForumUser {
    /// Username.
    pub id: String,
    /// IDs of submitted stories, comments, and polls, newest first.
    #[serde(default)]
    pub submitted: Vec<i64>,
}

/// A top-level story.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoryItem {
    /// Item ID.
    pub id: i64,
    /// Story title.
    pub title: String,
    /// When the story was posted.
    pub time: DateTime<Utc>,
    /// Direct replies, in display order.
    pub kids: Vec<i64>,
}

/// A reply to a story or another comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentItem {
    /// Item ID.
    pub id: i64,
    /// Parent item ID.
    pub parent: Option<i64>,
    /// Comment HTML; absent for deleted comments.
    pub text: Option<String>,
    /// When the comment was posted.
    pub time: DateTime<Utc>,
    /// Removed by its author.
    pub deleted: bool,
    /// Killed by moderators or flags.
    pub dead: bool,
}

impl CommentItem {
    /// Whether the comment has usable text.
    pub fn is_live(&self) -> bool {
        !self.deleted
            && !self.dead
            && self.text.as_deref().is_some_and(|t| !t.trim().is_empty())
    }
}

/// Any item the API can return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    /// A story.
    Story(StoryItem),
    /// A comment.
    Comment(CommentItem),
    /// Jobs, polls, and poll options.
    Other {
        /// Item ID.
        id: i64,
        /// The reported item type.
        kind: String,
    },
}

impl Item {
    /// Item ID regardless of kind.
    pub fn id(&self) -> i64 {
        match self {
            Item::Story(s) => s.id,
            Item::Comment(c) => c.id,
            Item::Other { id, .. } => *id,
        }
    }
}

/// Wire format of `/item/{id}.json`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawItem {
    pub id: i64,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub time: Option<i64>,
    #[serde(default)]
    pub parent: Option<i64>,
    #[serde(default)]
    pub kids: Vec<i64>,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub dead: bool,
}

impl From<RawItem> for Item {
    fn from(raw: RawItem) -> Self {
        let time = raw
            .time
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .unwrap_or_default();

        match raw.kind.as_deref() {
            Some("story") => Item::Story(StoryItem {
                id: raw.id,
                title: raw.title.unwrap_or_default(),
                time,
                kids: raw.kids,
            }),
            Some("comment") => Item::Comment(CommentItem {
                id: raw.id,
                parent: raw.parent,
                text: raw.text,
                time,
                deleted: raw.deleted,
                dead: raw.dead,
            }),
            other => Item::Other {
                id: raw.id,
                kind: other.unwrap_or("unknown").to_string(),
            },
        }
    }
}
