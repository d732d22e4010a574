//! Discovers the current hiring thread and its unseen comments.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info};

use hnjobs_core::config::ForumConfig;
use hnjobs_core::result::AppResult;
use hnjobs_core::types::{CommentId, StoryId};
use hnjobs_database::PipelineStore;
use hnjobs_entity::comment::NewComment;
use hnjobs_entity::story::Story;
use hnjobs_forum::{ForumApi, StoryItem};

use crate::queue::CommentQueue;

/// Summary of one scraper run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScrapeReport {
    /// Hiring thread that was walked, if one was found.
    pub story: Option<StoryId>,
    /// Comments stored and queued by this run.
    pub new_comments: usize,
    /// Comments that were already stored.
    pub existing: usize,
    /// Deleted, dead, or empty comments that were not stored.
    pub skipped: usize,
}

/// Walks the hiring thread and feeds new comments into the queue.
///
/// Skipped comments are never stored, so their IDs are remembered for the
/// lifetime of the scraper to avoid fetching them again on every run.
pub struct Scraper {
    forum: Arc<dyn ForumApi>,
    store: Arc<dyn PipelineStore>,
    config: ForumConfig,
    skipped: Mutex<HashSet<CommentId>>,
}

impl Scraper {
    /// Create a scraper.
    pub fn new(forum: Arc<dyn ForumApi>, store: Arc<dyn PipelineStore>, config: ForumConfig) -> Self {
        Self {
            forum,
            store,
            config,
            skipped: Mutex::new(HashSet::new()),
        }
    }

    /// Run once.
    ///
    /// Finding no hiring thread is not an error. Any forum or store
    /// error aborts the run; rows already written stay, and the next run
    /// picks up after them because every insert is existence-checked.
    pub async fn run(&self, queue: &CommentQueue) -> AppResult<ScrapeReport> {
        let Some(story) = self.find_hiring_thread().await? else {
            info!(
                user = %self.config.hiring_user,
                "No hiring thread among recent submissions"
            );
            return Ok(ScrapeReport::default());
        };

        let story_id = StoryId(story.id);
        if !self.store.story_exists(story_id).await? {
            self.store
                .insert_story(&Story {
                    id: story_id,
                    title: story.title.clone(),
                    posted_at: story.time,
                })
                .await?;
            info!(story_id = %story_id, title = %story.title, "Stored new hiring thread");
        }

        let mut report = ScrapeReport {
            story: Some(story_id),
            ..ScrapeReport::default()
        };

        for kid in &story.kids {
            let comment_id = CommentId(*kid);
            if self.skipped.lock().await.contains(&comment_id) {
                report.skipped += 1;
                continue;
            }
            if self.store.comment_exists(comment_id).await? {
                report.existing += 1;
                continue;
            }

            let comment = self.forum.get_comment(*kid).await?;
            if !comment.is_live() {
                debug!(comment_id = %comment_id, "Skipping deleted or empty comment");
                self.skipped.lock().await.insert(comment_id);
                report.skipped += 1;
                continue;
            }

            self.store
                .insert_comment(&NewComment {
                    id: comment_id,
                    story_id,
                    value: comment.text.unwrap_or_default(),
                    commented_at: comment.time,
                })
                .await?;
            queue.push(comment_id).await?;
            report.new_comments += 1;
            debug!(comment_id = %comment_id, "Queued new comment");
        }

        info!(
            story_id = %story_id,
            new_comments = report.new_comments,
            existing = report.existing,
            skipped = report.skipped,
            "Scrape finished"
        );
        Ok(report)
    }

    /// First of the most recent submissions whose title marks a hiring thread.
    async fn find_hiring_thread(&self) -> AppResult<Option<StoryItem>> {
        let user = self.forum.get_user(&self.config.hiring_user).await?;

        for id in user.submitted.iter().take(self.config.submissions_to_inspect) {
            let story = self.forum.get_story(*id).await?;
            if story.title.starts_with(&self.config.title_prefix) {
                return Ok(Some(story));
            }
            debug!(story_id = id, title = %story.title, "Not a hiring thread");
        }

        Ok(None)
    }
}
