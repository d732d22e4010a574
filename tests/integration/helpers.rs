//! Shared test helpers for integration tests.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use hnjobs_core::config::{ForumConfig, PipelineConfig};
use hnjobs_core::types::CommentId;
use hnjobs_entity::comment::CommentStatus;
use hnjobs_worker::testing::{FakeExtractor, FakeForum, MemoryStore};
use hnjobs_worker::{BatchOutcome, Runner};

/// Title of the thread every test scrapes.
pub const HIRING_TITLE: &str = "Ask HN: Who is hiring? (June 2025)";

/// ID of that thread.
pub const STORY_ID: i64 = 4000;

/// One hour of (paused) test time.
pub const HOUR: Duration = Duration::from_secs(60 * 60);

/// Test pipeline context
pub struct TestApp {
    /// In-memory data store
    pub store: MemoryStore,
    /// Fake forum API
    pub forum: FakeForum,
    /// Fake extraction client
    pub extractor: FakeExtractor,
}

/// A runner executing in the background.
pub struct RunningPipeline {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<BatchOutcome>,
}

impl RunningPipeline {
    /// Signal shutdown, then wait for the queue to drain.
    pub async fn stop(self) -> BatchOutcome {
        self.shutdown.send(true).expect("runner is listening");
        self.handle.await.expect("runner task")
    }
}

impl TestApp {
    /// A forum with a hiring thread and the given replies, behind an extractor.
    pub fn with_thread(replies: &[(i64, &str)], extractor: FakeExtractor) -> Self {
        let forum = FakeForum::new();
        forum.add_user("whoishiring", &[STORY_ID + 2, STORY_ID + 1, STORY_ID]);
        forum.add_story(STORY_ID + 2, "Ask HN: Who wants to be hired? (June 2025)", &[]);
        forum.add_story(STORY_ID + 1, "Ask HN: Freelancer? Seeking freelancer? (June 2025)", &[]);

        let kids: Vec<i64> = replies.iter().map(|(id, _)| *id).collect();
        forum.add_story(STORY_ID, HIRING_TITLE, &kids);
        for (id, text) in replies {
            forum.add_comment(*id, STORY_ID, text);
        }

        Self {
            store: MemoryStore::new(),
            forum,
            extractor,
        }
    }

    /// Build a runner with the default intervals and a short batch timeout.
    pub fn runner(&self) -> Runner {
        let pipeline = PipelineConfig {
            batch_idle_timeout_ms: 100,
            ..PipelineConfig::default()
        };

        Runner::new(
            Arc::new(self.store.clone()),
            Arc::new(self.forum.clone()),
            Arc::new(self.extractor.clone()),
            ForumConfig::default(),
            pipeline,
        )
    }

    /// Start a runner in the background.
    pub fn start(&self) -> RunningPipeline {
        let mut runner = self.runner();
        let (shutdown, cancel) = watch::channel(false);
        let handle = tokio::spawn(async move {
            runner.run(cancel).await.expect("runner starts once");
            runner.close().await
        });
        RunningPipeline { shutdown, handle }
    }

    /// How many times each comment was sent to the extractor.
    pub fn extraction_count(&self, id: i64) -> usize {
        self.extractor
            .calls()
            .iter()
            .flatten()
            .filter(|c| **c == CommentId(id))
            .count()
    }

    /// Assert that every recorded status change of `id`, starting from
    /// `initial`, is a legal transition.
    pub fn assert_transitions_legal(&self, id: i64, initial: CommentStatus) {
        let mut current = initial;
        for next in self.store.transitions(id) {
            assert!(
                current.can_transition_to(next),
                "comment {id}: illegal transition {current} -> {next}"
            );
            current = next;
        }
    }
}
