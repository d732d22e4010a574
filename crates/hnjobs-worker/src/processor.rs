//! Batches queued comments through the extraction client and persists
//! the resulting jobs.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use hnjobs_core::config::{MAX_EXTRACTION_BATCH, PipelineConfig};
use hnjobs_core::result::AppResult;
use hnjobs_core::types::CommentId;
use hnjobs_database::{JobTransaction, PipelineStore};
use hnjobs_entity::comment::CommentStatus;
use hnjobs_entity::posting::{JobPosting, ResolvedJob};
use hnjobs_extraction::{ExtractionError, JobExtractor};

use crate::queue::CommentReceiver;

/// Per-batch (or accumulated) processing counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchOutcome {
    /// Comments marked `completed`.
    pub completed: usize,
    /// Comments marked `failed`.
    pub failed: usize,
}

impl BatchOutcome {
    fn absorb(&mut self, other: BatchOutcome) {
        self.completed += other.completed;
        self.failed += other.failed;
    }
}

/// Single consumer of the comment queue.
pub struct Processor {
    store: Arc<dyn PipelineStore>,
    extractor: Arc<dyn JobExtractor>,
    batch_size: usize,
    idle_timeout: Duration,
}

impl Processor {
    /// Create a processor. The batch size is capped at the extraction limit.
    pub fn new(
        store: Arc<dyn PipelineStore>,
        extractor: Arc<dyn JobExtractor>,
        config: &PipelineConfig,
    ) -> Self {
        Self {
            store,
            extractor,
            batch_size: config.batch_size.clamp(1, MAX_EXTRACTION_BATCH),
            idle_timeout: config.batch_idle_timeout(),
        }
    }

    /// Consume batches until the queue is closed and drained.
    pub async fn run(&self, mut receiver: CommentReceiver) -> BatchOutcome {
        info!(
            batch_size = self.batch_size,
            idle_timeout_ms = self.idle_timeout.as_millis() as u64,
            "Processor started"
        );

        let mut totals = BatchOutcome::default();
        while let Some(batch) = receiver.next_batch(self.batch_size, self.idle_timeout).await {
            let size = batch.len();
            let outcome = self.process_batch(batch).await;
            info!(
                size,
                completed = outcome.completed,
                failed = outcome.failed,
                "Batch processed"
            );
            totals.absorb(outcome);
        }

        info!(
            completed = totals.completed,
            failed = totals.failed,
            "Processor stopped: queue closed and drained"
        );
        totals
    }

    /// Process one batch. Never fails as a whole; every comment ends up
    /// `completed` or `failed` unless the store itself is unreachable.
    pub async fn process_batch(&self, ids: Vec<CommentId>) -> BatchOutcome {
        let ids: BTreeSet<CommentId> = ids.into_iter().collect();
        let mut outcome = BatchOutcome::default();

        let mut claimed = Vec::with_capacity(ids.len());
        for id in ids {
            match self.store.claim_comment(id).await {
                Ok(true) => claimed.push(id),
                Ok(false) => {
                    info!(comment_id = %id, "Comment already completed or unknown; skipping");
                }
                Err(e) => {
                    error!(
                        comment_id = %id,
                        error = %e,
                        "Failed to claim comment; status unchanged, left for the next startup scan"
                    );
                    outcome.failed += 1;
                }
            }
        }

        let mut inputs = BTreeMap::new();
        for id in claimed {
            match self.store.comment_text(id).await {
                Ok(Some(text)) => {
                    inputs.insert(id, text);
                }
                Ok(None) => {
                    warn!(comment_id = %id, "Comment text not found");
                    self.mark(id, CommentStatus::Failed, &mut outcome).await;
                }
                Err(e) => {
                    error!(comment_id = %id, error = %e, "Failed to load comment text");
                    self.mark(id, CommentStatus::Failed, &mut outcome).await;
                }
            }
        }

        if inputs.is_empty() {
            return outcome;
        }

        let postings = match self.extractor.parse_job_postings(&inputs).await {
            Ok(postings) => postings,
            Err(e) => {
                log_extraction_failure(&e, inputs.len());
                for id in inputs.keys() {
                    self.mark(*id, CommentStatus::Failed, &mut outcome).await;
                }
                return outcome;
            }
        };

        let mut by_id: HashMap<CommentId, JobPosting> = postings
            .into_iter()
            .filter_map(|posting| posting.id.map(|id| (id, posting)))
            .collect();

        for id in inputs.keys().copied() {
            let Some(posting) = by_id.remove(&id) else {
                warn!(comment_id = %id, "No posting returned for comment");
                self.mark(id, CommentStatus::Failed, &mut outcome).await;
                continue;
            };

            match self.persist(id, &posting).await {
                Ok(jobs) => {
                    debug!(comment_id = %id, jobs, "Comment processed");
                    self.mark(id, CommentStatus::Completed, &mut outcome).await;
                }
                Err(e) => {
                    warn!(comment_id = %id, error = %e, "Rolled back jobs for comment");
                    self.mark(id, CommentStatus::Failed, &mut outcome).await;
                }
            }
        }

        outcome
    }

    /// Write one comment's jobs and tags in a single transaction,
    /// returning how many jobs were stored.
    async fn persist(&self, comment_id: CommentId, posting: &JobPosting) -> AppResult<usize> {
        if !posting.has_jobs() {
            return Ok(0);
        }

        let resolved = posting.resolve_jobs(comment_id, Utc::now());

        let mut tx = self.store.begin().await?;
        if let Err(e) = write_jobs(tx.as_mut(), &resolved).await {
            if let Err(rollback) = tx.rollback().await {
                error!(comment_id = %comment_id, error = %rollback, "Rollback failed");
            }
            return Err(e);
        }
        tx.commit().await?;

        Ok(resolved.len())
    }

    async fn mark(&self, id: CommentId, status: CommentStatus, outcome: &mut BatchOutcome) {
        match status {
            CommentStatus::Completed => outcome.completed += 1,
            CommentStatus::Failed => outcome.failed += 1,
            _ => {}
        }
        if let Err(e) = self.store.update_comment_status(id, status).await {
            error!(comment_id = %id, status = %status, error = %e, "Failed to update comment status");
        }
    }
}

async fn write_jobs(tx: &mut dyn JobTransaction, jobs: &[ResolvedJob]) -> AppResult<()> {
    for resolved in jobs {
        tx.insert_job(&resolved.job).await?;
        for tag in &resolved.tech_stack {
            tx.insert_tech_stack(resolved.job.id, tag).await?;
        }
    }
    Ok(())
}

fn log_extraction_failure(err: &ExtractionError, size: usize) {
    if err.is_contract_violation() {
        error!(size, error = %err, "Extraction batch violated request bounds");
    } else if err.is_malformed_response() {
        warn!(size, error = %err, "Model returned a malformed response; batch left for recovery");
    } else if err.is_transient() {
        warn!(size, error = %err, "Extraction provider unavailable; batch left for recovery");
    } else {
        error!(size, error = %err, "Extraction failed");
    }
}

#[cfg(test)]
mod tests {
    use hnjobs_entity::posting::{Compensation, JobEntry};

    use super::*;
    use crate::queue::comment_queue;
    use crate::testing::{FakeExtractor, MemoryStore};

    const ACME: &str = "AcmeCo | Go Engineer | REMOTE | https://acme.example/careers";

    fn processor(store: &MemoryStore, extractor: &FakeExtractor) -> Processor {
        Processor::new(
            Arc::new(store.clone()),
            Arc::new(extractor.clone()),
            &PipelineConfig::default(),
        )
    }

    fn queued(store: &MemoryStore, ids: &[i64]) {
        for id in ids {
            store.seed_comment(*id, 1, &format!("comment {id}"), CommentStatus::Queued);
        }
    }

    fn entry(title: &str, tech: &[&str], salary: Option<&str>) -> JobEntry {
        JobEntry {
            title: title.to_string(),
            tech_stack: tech.iter().map(|t| t.to_string()).collect(),
            compensation: Compensation {
                base_salary: salary.map(str::to_string),
                equity: None,
            },
            ..JobEntry::default()
        }
    }

    #[tokio::test]
    async fn test_single_posting_is_persisted() {
        let store = MemoryStore::new();
        store.seed_comment(101, 1, ACME, CommentStatus::Queued);
        let extractor = FakeExtractor::with_postings(vec![JobPosting {
            id: Some(CommentId(101)),
            is_job_posting: true,
            company_name: Some("AcmeCo".to_string()),
            jobs: vec![entry("Go Engineer", &["Go"], None)],
            is_remote: true,
            ..JobPosting::default()
        }]);

        let outcome = processor(&store, &extractor)
            .process_batch(vec![CommentId(101)])
            .await;

        assert_eq!(outcome, BatchOutcome { completed: 1, failed: 0 });
        let jobs = store.jobs();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].comment_id, CommentId(101));
        assert_eq!(jobs[0].company, "AcmeCo");
        assert_eq!(jobs[0].title, "Go Engineer");
        assert!(jobs[0].is_remote);
        assert_eq!(store.tags_for(jobs[0].id), vec!["Go".to_string()]);
        assert_eq!(
            store.transitions(101),
            vec![CommentStatus::InProgress, CommentStatus::Completed]
        );
    }

    #[tokio::test]
    async fn test_job_level_values_override_general() {
        let store = MemoryStore::new();
        queued(&store, &[7]);
        let extractor = FakeExtractor::with_postings(vec![JobPosting {
            id: Some(CommentId(7)),
            is_job_posting: true,
            company_name: Some("Beta".to_string()),
            jobs: vec![
                entry("Backend Engineer", &["Go"], None),
                entry("Staff Engineer", &[], Some("$200k")),
            ],
            general_tech_stack: vec!["AWS".to_string()],
            general_compensation: Compensation {
                base_salary: Some("$100k-$150k".to_string()),
                equity: None,
            },
            ..JobPosting::default()
        }]);

        processor(&store, &extractor)
            .process_batch(vec![CommentId(7)])
            .await;

        let jobs = store.jobs_for(7);
        assert_eq!(jobs.len(), 2);
        assert_eq!(store.tags_for(jobs[0].id), vec!["Go".to_string()]);
        assert_eq!(jobs[0].salary.as_deref(), Some("$100k-$150k"));
        assert_eq!(store.tags_for(jobs[1].id), vec!["AWS".to_string()]);
        assert_eq!(jobs[1].salary.as_deref(), Some("$200k"));
    }

    #[tokio::test]
    async fn test_failed_insert_rolls_back_only_that_comment() {
        let store = MemoryStore::new();
        queued(&store, &[1, 2]);
        store.fail_job_insert(1, 2);
        let three_jobs = |id: i64| JobPosting {
            id: Some(CommentId(id)),
            is_job_posting: true,
            company_name: Some(format!("Company {id}")),
            jobs: vec![
                entry("One", &["Rust"], None),
                entry("Two", &["Rust"], None),
                entry("Three", &["Rust"], None),
            ],
            ..JobPosting::default()
        };
        let extractor = FakeExtractor::with_postings(vec![three_jobs(1), three_jobs(2)]);

        let outcome = processor(&store, &extractor)
            .process_batch(vec![CommentId(1), CommentId(2)])
            .await;

        assert_eq!(outcome, BatchOutcome { completed: 1, failed: 1 });
        assert!(store.jobs_for(1).is_empty());
        assert_eq!(store.jobs_for(2).len(), 3);
        assert_eq!(store.tag_count(), 3);
        assert_eq!(store.status(1), Some(CommentStatus::Failed));
        assert_eq!(store.status(2), Some(CommentStatus::Completed));
    }

    #[tokio::test]
    async fn test_non_posting_is_completed_without_jobs() {
        let store = MemoryStore::new();
        queued(&store, &[5, 6]);
        let extractor = FakeExtractor::with_postings(vec![
            JobPosting {
                id: Some(CommentId(5)),
                is_job_posting: false,
                ..JobPosting::default()
            },
            JobPosting {
                id: Some(CommentId(6)),
                is_job_posting: true,
                company_name: Some("NoRoles".to_string()),
                ..JobPosting::default()
            },
        ]);

        let outcome = processor(&store, &extractor)
            .process_batch(vec![CommentId(5), CommentId(6)])
            .await;

        assert_eq!(outcome, BatchOutcome { completed: 2, failed: 0 });
        assert!(store.jobs().is_empty());
        assert_eq!(store.status(5), Some(CommentStatus::Completed));
    }

    #[tokio::test]
    async fn test_extraction_failure_fails_whole_batch() {
        let store = MemoryStore::new();
        queued(&store, &[1, 2, 3]);
        let extractor = FakeExtractor::failing(|| ExtractionError::RateLimit("429".to_string()));

        let outcome = processor(&store, &extractor)
            .process_batch(vec![CommentId(1), CommentId(2), CommentId(3)])
            .await;

        assert_eq!(outcome, BatchOutcome { completed: 0, failed: 3 });
        for id in 1..=3 {
            assert_eq!(
                store.transitions(id),
                vec![CommentStatus::InProgress, CommentStatus::Failed]
            );
        }
    }

    #[tokio::test]
    async fn test_missing_text_and_missing_posting_fail() {
        let store = MemoryStore::new();
        queued(&store, &[1, 2]);
        let extractor = FakeExtractor::with_postings(vec![JobPosting {
            id: Some(CommentId(1)),
            is_job_posting: false,
            ..JobPosting::default()
        }]);

        // 3 was never stored and is skipped, 2 gets no posting back.
        let outcome = processor(&store, &extractor)
            .process_batch(vec![CommentId(1), CommentId(2), CommentId(3)])
            .await;

        assert_eq!(outcome, BatchOutcome { completed: 1, failed: 1 });
        assert_eq!(extractor.calls(), vec![vec![CommentId(1), CommentId(2)]]);
        assert_eq!(store.status(2), Some(CommentStatus::Failed));
    }

    #[tokio::test]
    async fn test_duplicate_ids_are_collapsed() {
        let store = MemoryStore::new();
        queued(&store, &[9]);
        let extractor = FakeExtractor::one_job_each();

        processor(&store, &extractor)
            .process_batch(vec![CommentId(9), CommentId(9)])
            .await;

        assert_eq!(extractor.calls(), vec![vec![CommentId(9)]]);
        assert_eq!(store.jobs_for(9).len(), 1);
    }

    #[tokio::test]
    async fn test_completed_comment_is_not_processed_again() {
        let store = MemoryStore::new();
        queued(&store, &[101]);
        let extractor = FakeExtractor::one_job_each();
        let processor = processor(&store, &extractor);

        let first = processor.process_batch(vec![CommentId(101)]).await;
        let second = processor.process_batch(vec![CommentId(101)]).await;

        assert_eq!(first, BatchOutcome { completed: 1, failed: 0 });
        assert_eq!(second, BatchOutcome::default());
        assert_eq!(extractor.calls().len(), 1);
        assert_eq!(store.jobs_for(101).len(), 1);
        assert_eq!(
            store.transitions(101),
            vec![CommentStatus::InProgress, CommentStatus::Completed]
        );
    }

    #[tokio::test]
    async fn test_failed_claim_leaves_status_unchanged() {
        let store = MemoryStore::new();
        queued(&store, &[4]);
        store.set_unavailable(true);
        let extractor = FakeExtractor::one_job_each();

        let outcome = processor(&store, &extractor)
            .process_batch(vec![CommentId(4)])
            .await;
        store.set_unavailable(false);

        assert_eq!(outcome, BatchOutcome { completed: 0, failed: 1 });
        assert!(extractor.calls().is_empty());
        assert_eq!(store.status(4), Some(CommentStatus::Queued));
        assert!(store.transitions(4).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_batches_and_survives_bad_batch() {
        let store = MemoryStore::new();
        let ids: Vec<i64> = (1..=45).collect();
        queued(&store, &ids);
        let extractor = FakeExtractor::new(|inputs| {
            if inputs.contains_key(&CommentId(1)) {
                Err(ExtractionError::NoResponse)
            } else {
                Ok(inputs
                    .keys()
                    .map(|id| JobPosting {
                        id: Some(*id),
                        ..JobPosting::default()
                    })
                    .collect())
            }
        });
        let (queue, receiver) = comment_queue(100);
        queue.push_all(ids.iter().copied().map(CommentId)).await.expect("queue open");
        drop(queue);

        let totals = processor(&store, &extractor).run(receiver).await;

        let sizes: Vec<usize> = extractor.calls().iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![30, 15]);
        assert_eq!(totals, BatchOutcome { completed: 15, failed: 30 });
        assert_eq!(store.status(45), Some(CommentStatus::Completed));
        assert_eq!(store.status(1), Some(CommentStatus::Failed));
    }
}
