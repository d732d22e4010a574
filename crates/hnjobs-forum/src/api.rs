//! Trait the pipeline uses to read from the forum.

use async_trait::async_trait;

use crate::error::{ForumError, ForumResult};
use crate::types::{CommentItem, ForumUser, Item, StoryItem};

/// Read-only access to forum users and items.
#[async_trait]
pub trait ForumApi: Send + Sync + 'static {
    /// Fetch a user and their submissions.
    async fn get_user(&self, username: &str) -> ForumResult<ForumUser>;

    /// Fetch any item by ID.
    async fn get_item(&self, id: i64) -> ForumResult<Item>;

    /// Fetch an item that must be a story.
    async fn get_story(&self, id: i64) -> ForumResult<StoryItem> {
        match self.get_item(id).await? {
            Item::Story(story) => Ok(story),
            _ => Err(ForumError::ExpectedStory(id)),
        }
    }

    /// Fetch an item that must be a comment.
    async fn get_comment(&self, id: i64) -> ForumResult<CommentItem> {
        match self.get_item(id).await? {
            Item::Comment(comment) => Ok(comment),
            _ => Err(ForumError::ExpectedComment(id)),
        }
    }
}
