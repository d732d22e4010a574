//! Crash leftovers and provider outages are retried until they complete.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::time;

use hnjobs_entity::comment::CommentStatus;
use hnjobs_entity::posting::{JobEntry, JobPosting};
use hnjobs_extraction::ExtractionError;
use hnjobs_worker::BatchOutcome;
use hnjobs_worker::testing::FakeExtractor;

use crate::helpers::{HOUR, STORY_ID, TestApp};

/// Fails every batch while `outage` is set, then answers one job per comment.
fn flaky_extractor(outage: Arc<AtomicBool>) -> FakeExtractor {
    FakeExtractor::new(move |inputs| {
        if outage.load(Ordering::SeqCst) {
            return Err(ExtractionError::ServiceUnavailable(
                "The model is overloaded".to_string(),
            ));
        }
        Ok(inputs
            .keys()
            .map(|id| JobPosting {
                id: Some(*id),
                is_job_posting: true,
                company_name: Some("Retry Inc".to_string()),
                jobs: vec![JobEntry {
                    title: "Engineer".to_string(),
                    ..JobEntry::default()
                }],
                ..JobPosting::default()
            })
            .collect())
    })
}

#[tokio::test(start_paused = true)]
async fn test_startup_recovers_crash_leftovers_once() {
    let app = TestApp::with_thread(
        &[(11, "a"), (12, "b"), (13, "c"), (14, "d")],
        FakeExtractor::one_job_each(),
    );
    app.store.seed_comment(11, STORY_ID, "a", CommentStatus::Queued);
    app.store.seed_comment(12, STORY_ID, "b", CommentStatus::InProgress);
    app.store.seed_comment(13, STORY_ID, "c", CommentStatus::Failed);
    app.store.seed_comment(14, STORY_ID, "d", CommentStatus::Completed);

    let pipeline = app.start();
    time::sleep(HOUR).await;
    let totals = pipeline.stop().await;

    assert_eq!(totals, BatchOutcome { completed: 3, failed: 0 });
    for id in [11, 12, 13] {
        assert_eq!(app.store.status(id), Some(CommentStatus::Completed));
        assert_eq!(app.extraction_count(id), 1, "comment {id}");
    }
    assert_eq!(app.extraction_count(14), 0);
    assert!(app.store.jobs_for(14).is_empty());
    assert_eq!(app.store.comment_inserts(), 0);

    app.assert_transitions_legal(11, CommentStatus::Queued);
    app.assert_transitions_legal(12, CommentStatus::InProgress);
    app.assert_transitions_legal(13, CommentStatus::Failed);
}

#[tokio::test(start_paused = true)]
async fn test_outage_is_retried_by_the_recovery_scan() {
    let outage = Arc::new(AtomicBool::new(true));
    let app = TestApp::with_thread(
        &[(21, "Epsilon | Backend"), (22, "Zeta | Frontend")],
        flaky_extractor(Arc::clone(&outage)),
    );

    let pipeline = app.start();
    time::sleep(HOUR).await;
    assert_eq!(app.store.status(21), Some(CommentStatus::Failed));
    assert_eq!(app.store.status(22), Some(CommentStatus::Failed));
    assert!(app.store.jobs().is_empty());

    outage.store(false, Ordering::SeqCst);
    // Scrapes at 4h and 8h find nothing new; the 12h scan re-feeds both.
    time::sleep(10 * HOUR).await;
    assert_eq!(app.store.status(21), Some(CommentStatus::Failed));

    time::sleep(2 * HOUR).await;
    let totals = pipeline.stop().await;

    assert_eq!(totals, BatchOutcome { completed: 2, failed: 2 });
    assert_eq!(app.store.status(21), Some(CommentStatus::Completed));
    assert_eq!(app.store.status(22), Some(CommentStatus::Completed));
    assert_eq!(app.store.jobs().len(), 2);
    for id in [21, 22] {
        assert_eq!(app.extraction_count(id), 2);
        assert_eq!(
            app.store.transitions(id),
            vec![
                CommentStatus::InProgress,
                CommentStatus::Failed,
                CommentStatus::Queued,
                CommentStatus::InProgress,
                CommentStatus::Completed,
            ]
        );
    }
}

#[tokio::test(start_paused = true)]
async fn test_failed_write_leaves_no_partial_jobs() {
    let app = TestApp::with_thread(
        &[(31, "Eta | Two roles")],
        FakeExtractor::with_postings(vec![JobPosting {
            id: Some(hnjobs_core::types::CommentId(31)),
            is_job_posting: true,
            company_name: Some("Eta".to_string()),
            jobs: vec![
                JobEntry {
                    title: "Backend".to_string(),
                    tech_stack: vec!["Rust".to_string()],
                    ..JobEntry::default()
                },
                JobEntry {
                    title: "Frontend".to_string(),
                    tech_stack: vec!["TypeScript".to_string()],
                    ..JobEntry::default()
                },
            ],
            ..JobPosting::default()
        }]),
    );
    app.store.fail_job_insert(31, 2);

    let pipeline = app.start();
    time::sleep(HOUR).await;
    let totals = pipeline.stop().await;

    assert_eq!(totals, BatchOutcome { completed: 0, failed: 1 });
    assert_eq!(app.store.status(31), Some(CommentStatus::Failed));
    assert!(app.store.jobs_for(31).is_empty());
    assert_eq!(app.store.tag_count(), 0);
}
