//! In-memory collaborators for exercising the pipeline without a network
//! or a database.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use hnjobs_core::config::MAX_EXTRACTION_BATCH;
use hnjobs_core::error::AppError;
use hnjobs_core::result::AppResult;
use hnjobs_core::types::{CommentId, JobId, StoryId};
use hnjobs_database::{JobTransaction, PipelineStore};
use hnjobs_entity::comment::{Comment, CommentStatus, NewComment};
use hnjobs_entity::job::{Job, TechStack};
use hnjobs_entity::posting::{JobEntry, JobPosting};
use hnjobs_entity::story::Story;
use hnjobs_extraction::{ExtractionError, ExtractionResult, JobExtractor, validate_batch};
use hnjobs_forum::{CommentItem, ForumApi, ForumError, ForumResult, ForumUser, Item, StoryItem};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ── Store ────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct StoreState {
    stories: BTreeMap<StoryId, Story>,
    comments: BTreeMap<CommentId, Comment>,
    jobs: Vec<Job>,
    tech_stack: Vec<TechStack>,
    transitions: Vec<(CommentId, CommentStatus)>,
    story_inserts: usize,
    comment_inserts: usize,
    fail_job_insert: Option<(CommentId, usize)>,
    unavailable: bool,
}

impl StoreState {
    fn check_available(&self) -> AppResult<()> {
        if self.unavailable {
            Err(AppError::database("store unavailable"))
        } else {
            Ok(())
        }
    }
}

/// [`PipelineStore`] backed by in-memory maps.
///
/// Job writes are buffered per transaction and only become visible on
/// commit. Every status change is recorded in order.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<StoreState>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a comment with an arbitrary status.
    pub fn seed_comment(&self, id: i64, story_id: i64, value: &str, status: CommentStatus) {
        let mut state = lock(&self.state);
        state.comments.insert(
            CommentId(id),
            Comment {
                id: CommentId(id),
                story_id: StoryId(story_id),
                value: value.to_string(),
                commented_at: DateTime::<Utc>::default(),
                status,
            },
        );
    }

    /// Make the `nth` (1-based) job insert of a transaction for `comment_id` fail.
    pub fn fail_job_insert(&self, comment_id: i64, nth: usize) {
        lock(&self.state).fail_job_insert = Some((CommentId(comment_id), nth));
    }

    /// Make every operation fail with a database error.
    pub fn set_unavailable(&self, unavailable: bool) {
        lock(&self.state).unavailable = unavailable;
    }

    /// Current status of a comment.
    pub fn status(&self, id: i64) -> Option<CommentStatus> {
        lock(&self.state).comments.get(&CommentId(id)).map(|c| c.status)
    }

    /// Every status written for `id`, oldest first.
    pub fn transitions(&self, id: i64) -> Vec<CommentStatus> {
        lock(&self.state)
            .transitions
            .iter()
            .filter(|(comment, _)| *comment == CommentId(id))
            .map(|(_, status)| *status)
            .collect()
    }

    /// Stored stories.
    pub fn stories(&self) -> Vec<Story> {
        lock(&self.state).stories.values().cloned().collect()
    }

    /// Stored comments in ID order.
    pub fn comments(&self) -> Vec<Comment> {
        lock(&self.state).comments.values().cloned().collect()
    }

    /// Committed jobs in insertion order.
    pub fn jobs(&self) -> Vec<Job> {
        lock(&self.state).jobs.clone()
    }

    /// Committed jobs for one comment.
    pub fn jobs_for(&self, comment_id: i64) -> Vec<Job> {
        lock(&self.state)
            .jobs
            .iter()
            .filter(|job| job.comment_id == CommentId(comment_id))
            .cloned()
            .collect()
    }

    /// Committed tags of one job, in insertion order.
    pub fn tags_for(&self, job_id: JobId) -> Vec<String> {
        lock(&self.state)
            .tech_stack
            .iter()
            .filter(|tag| tag.job_id == job_id)
            .map(|tag| tag.value.clone())
            .collect()
    }

    /// Total committed tag rows.
    pub fn tag_count(&self) -> usize {
        lock(&self.state).tech_stack.len()
    }

    /// Number of story inserts that created a row.
    pub fn story_inserts(&self) -> usize {
        lock(&self.state).story_inserts
    }

    /// Number of comment inserts that created a row.
    pub fn comment_inserts(&self) -> usize {
        lock(&self.state).comment_inserts
    }
}

#[async_trait]
impl PipelineStore for MemoryStore {
    async fn story_exists(&self, id: StoryId) -> AppResult<bool> {
        let state = lock(&self.state);
        state.check_available()?;
        Ok(state.stories.contains_key(&id))
    }

    async fn insert_story(&self, story: &Story) -> AppResult<()> {
        let mut state = lock(&self.state);
        state.check_available()?;
        if !state.stories.contains_key(&story.id) {
            state.stories.insert(story.id, story.clone());
            state.story_inserts += 1;
        }
        Ok(())
    }

    async fn comment_exists(&self, id: CommentId) -> AppResult<bool> {
        let state = lock(&self.state);
        state.check_available()?;
        Ok(state.comments.contains_key(&id))
    }

    async fn insert_comment(&self, comment: &NewComment) -> AppResult<()> {
        let mut state = lock(&self.state);
        state.check_available()?;
        if !state.comments.contains_key(&comment.id) {
            state.comments.insert(comment.id, comment.clone().into_comment());
            state.comment_inserts += 1;
        }
        Ok(())
    }

    async fn comment_text(&self, id: CommentId) -> AppResult<Option<String>> {
        let state = lock(&self.state);
        state.check_available()?;
        Ok(state.comments.get(&id).map(|c| c.value.clone()))
    }

    async fn claim_comment(&self, id: CommentId) -> AppResult<bool> {
        let mut state = lock(&self.state);
        state.check_available()?;
        let Some(comment) = state.comments.get_mut(&id) else {
            return Ok(false);
        };
        if !comment.status.can_transition_to(CommentStatus::InProgress) {
            return Ok(false);
        }
        comment.status = CommentStatus::InProgress;
        state.transitions.push((id, CommentStatus::InProgress));
        Ok(true)
    }

    async fn update_comment_status(&self, id: CommentId, status: CommentStatus) -> AppResult<()> {
        let mut state = lock(&self.state);
        state.check_available()?;
        let comment = state
            .comments
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("comment {id}")))?;
        comment.status = status;
        state.transitions.push((id, status));
        Ok(())
    }

    async fn comment_ids_by_status(&self, statuses: &[CommentStatus]) -> AppResult<Vec<CommentId>> {
        let state = lock(&self.state);
        state.check_available()?;
        Ok(state
            .comments
            .values()
            .filter(|c| statuses.contains(&c.status))
            .map(|c| c.id)
            .collect())
    }

    async fn requeue_failed(&self) -> AppResult<Vec<CommentId>> {
        let mut state = lock(&self.state);
        state.check_available()?;
        let ids: Vec<CommentId> = state
            .comments
            .values()
            .filter(|c| c.status == CommentStatus::Failed)
            .map(|c| c.id)
            .collect();
        for id in &ids {
            if let Some(comment) = state.comments.get_mut(id) {
                comment.status = CommentStatus::Queued;
            }
            state.transitions.push((*id, CommentStatus::Queued));
        }
        Ok(ids)
    }

    async fn count_by_status(&self) -> AppResult<Vec<(CommentStatus, i64)>> {
        let state = lock(&self.state);
        state.check_available()?;
        Ok(CommentStatus::ALL
            .iter()
            .map(|status| {
                let count = state.comments.values().filter(|c| c.status == *status).count();
                (*status, count as i64)
            })
            .filter(|(_, count)| *count > 0)
            .collect())
    }

    async fn begin(&self) -> AppResult<Box<dyn JobTransaction>> {
        lock(&self.state).check_available()?;
        Ok(Box::new(MemoryTransaction {
            state: Arc::clone(&self.state),
            jobs: Vec::new(),
            tags: Vec::new(),
        }))
    }
}

struct MemoryTransaction {
    state: Arc<Mutex<StoreState>>,
    jobs: Vec<Job>,
    tags: Vec<TechStack>,
}

#[async_trait]
impl JobTransaction for MemoryTransaction {
    async fn insert_job(&mut self, job: &Job) -> AppResult<()> {
        if let Some((comment_id, nth)) = lock(&self.state).fail_job_insert {
            let attempt = self.jobs.len() + 1;
            if job.comment_id == comment_id && attempt == nth {
                return Err(AppError::database(format!(
                    "injected failure on job {attempt} of comment {comment_id}"
                )));
            }
        }
        self.jobs.push(job.clone());
        Ok(())
    }

    async fn insert_tech_stack(&mut self, job_id: JobId, value: &str) -> AppResult<()> {
        self.tags.push(TechStack {
            job_id,
            value: value.to_string(),
        });
        Ok(())
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        let this = *self;
        let mut state = lock(&this.state);
        state.check_available()?;
        state.jobs.extend(this.jobs);
        state.tech_stack.extend(this.tags);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> AppResult<()> {
        Ok(())
    }
}

// ── Forum ────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct ForumState {
    users: HashMap<String, ForumUser>,
    items: HashMap<i64, Item>,
    item_requests: usize,
}

/// [`ForumApi`] serving users and items registered up front.
#[derive(Debug, Clone, Default)]
pub struct FakeForum {
    state: Arc<Mutex<ForumState>>,
}

impl FakeForum {
    /// Create an empty forum.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user and their submissions, newest first.
    pub fn add_user(&self, name: &str, submitted: &[i64]) {
        lock(&self.state).users.insert(
            name.to_string(),
            ForumUser {
                id: name.to_string(),
                submitted: submitted.to_vec(),
            },
        );
    }

    /// Register a story with its direct replies.
    pub fn add_story(&self, id: i64, title: &str, kids: &[i64]) {
        self.add_item(Item::Story(StoryItem {
            id,
            title: title.to_string(),
            time: timestamp(id),
            kids: kids.to_vec(),
        }));
    }

    /// Register a live comment.
    pub fn add_comment(&self, id: i64, parent: i64, text: &str) {
        self.add_item(Item::Comment(CommentItem {
            id,
            parent: Some(parent),
            text: Some(text.to_string()),
            time: timestamp(id),
            deleted: false,
            dead: false,
        }));
    }

    /// Register a deleted comment.
    pub fn add_deleted_comment(&self, id: i64, parent: i64) {
        self.add_item(Item::Comment(CommentItem {
            id,
            parent: Some(parent),
            text: None,
            time: timestamp(id),
            deleted: true,
            dead: false,
        }));
    }

    /// Append a reply to an already registered story.
    pub fn add_reply(&self, story_id: i64, id: i64, text: &str) {
        if let Some(Item::Story(story)) = lock(&self.state).items.get_mut(&story_id) {
            story.kids.push(id);
        }
        self.add_comment(id, story_id, text);
    }

    /// Register any item.
    pub fn add_item(&self, item: Item) {
        lock(&self.state).items.insert(item.id(), item);
    }

    /// Number of item lookups served so far.
    pub fn item_requests(&self) -> usize {
        lock(&self.state).item_requests
    }
}

fn timestamp(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap_or_default()
}

#[async_trait]
impl ForumApi for FakeForum {
    async fn get_user(&self, username: &str) -> ForumResult<ForumUser> {
        lock(&self.state)
            .users
            .get(username)
            .cloned()
            .ok_or_else(|| ForumError::NotFound(format!("user/{username}")))
    }

    async fn get_item(&self, id: i64) -> ForumResult<Item> {
        let mut state = lock(&self.state);
        state.item_requests += 1;
        state
            .items
            .get(&id)
            .cloned()
            .ok_or_else(|| ForumError::NotFound(format!("item/{id}")))
    }
}

// ── Extractor ────────────────────────────────────────────────────────

type Respond =
    dyn Fn(&BTreeMap<CommentId, String>) -> ExtractionResult<Vec<JobPosting>> + Send + Sync;

/// [`JobExtractor`] that answers with a caller-supplied function and
/// records every batch it receives.
///
/// Batch bounds are enforced exactly as the real client does.
#[derive(Clone)]
pub struct FakeExtractor {
    respond: Arc<Respond>,
    calls: Arc<Mutex<Vec<Vec<CommentId>>>>,
}

impl std::fmt::Debug for FakeExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FakeExtractor")
            .field("calls", &lock(&self.calls).len())
            .finish()
    }
}

impl FakeExtractor {
    /// Answer every batch with `respond`.
    pub fn new<F>(respond: F) -> Self
    where
        F: Fn(&BTreeMap<CommentId, String>) -> ExtractionResult<Vec<JobPosting>>
            + Send
            + Sync
            + 'static,
    {
        Self {
            respond: Arc::new(respond),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// One "Engineer" role per comment at "Company {id}".
    pub fn one_job_each() -> Self {
        Self::new(|inputs| {
            Ok(inputs
                .keys()
                .map(|id| JobPosting {
                    id: Some(*id),
                    is_job_posting: true,
                    company_name: Some(format!("Company {id}")),
                    jobs: vec![JobEntry {
                        title: "Engineer".to_string(),
                        ..JobEntry::default()
                    }],
                    ..JobPosting::default()
                })
                .collect())
        })
    }

    /// Answer with canned postings, returning only those in the batch.
    pub fn with_postings(postings: Vec<JobPosting>) -> Self {
        Self::new(move |inputs| {
            Ok(postings
                .iter()
                .filter(|p| p.id.is_some_and(|id| inputs.contains_key(&id)))
                .cloned()
                .collect())
        })
    }

    /// Fail every batch with the error built by `make`.
    pub fn failing(make: fn() -> ExtractionError) -> Self {
        Self::new(move |_| Err(make()))
    }

    /// Every batch received, in call order.
    pub fn calls(&self) -> Vec<Vec<CommentId>> {
        lock(&self.calls).clone()
    }
}

#[async_trait]
impl JobExtractor for FakeExtractor {
    async fn parse_job_postings(
        &self,
        inputs: &BTreeMap<CommentId, String>,
    ) -> ExtractionResult<Vec<JobPosting>> {
        lock(&self.calls).push(inputs.keys().copied().collect());
        validate_batch(inputs, MAX_EXTRACTION_BATCH)?;
        (self.respond)(inputs)
    }
}
