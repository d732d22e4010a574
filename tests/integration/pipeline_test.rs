//! Scrape-to-storage flows through a running pipeline.

use tokio::time;

use hnjobs_core::types::CommentId;
use hnjobs_entity::comment::CommentStatus;
use hnjobs_entity::posting::{JobEntry, JobPosting};
use hnjobs_worker::BatchOutcome;
use hnjobs_worker::testing::FakeExtractor;

use crate::helpers::{HOUR, STORY_ID, TestApp};

fn acme_posting() -> JobPosting {
    JobPosting {
        id: Some(CommentId(101)),
        is_job_posting: true,
        company_name: Some("AcmeCo".to_string()),
        is_remote: true,
        general_tech_stack: vec!["Go".to_string(), "Postgres".to_string()],
        jobs: vec![JobEntry {
            title: "Go Engineer".to_string(),
            ..JobEntry::default()
        }],
        ..JobPosting::default()
    }
}

#[tokio::test(start_paused = true)]
async fn test_new_thread_is_scraped_and_extracted() {
    let app = TestApp::with_thread(
        &[(101, "AcmeCo | Go Engineer | REMOTE | Go, Postgres")],
        FakeExtractor::with_postings(vec![acme_posting()]),
    );

    let pipeline = app.start();
    time::sleep(HOUR).await;
    let totals = pipeline.stop().await;

    assert_eq!(totals, BatchOutcome { completed: 1, failed: 0 });
    assert_eq!(app.store.stories().len(), 1);
    assert_eq!(app.store.stories()[0].id.0, STORY_ID);
    assert_eq!(app.store.status(101), Some(CommentStatus::Completed));

    let jobs = app.store.jobs_for(101);
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].company, "AcmeCo");
    assert_eq!(jobs[0].title, "Go Engineer");
    assert!(jobs[0].is_remote);

    let mut tags = app.store.tags_for(jobs[0].id);
    tags.sort();
    assert_eq!(tags, vec!["Go".to_string(), "Postgres".to_string()]);
    app.assert_transitions_legal(101, CommentStatus::Queued);
}

#[tokio::test(start_paused = true)]
async fn test_later_replies_are_picked_up_on_the_next_scrape() {
    let app = TestApp::with_thread(&[(101, "AcmeCo | Go")], FakeExtractor::one_job_each());

    let pipeline = app.start();
    time::sleep(HOUR).await;
    assert_eq!(app.store.status(101), Some(CommentStatus::Completed));

    app.forum.add_reply(STORY_ID, 102, "Beta | Rust | NYC");
    time::sleep(HOUR).await;
    assert_eq!(app.store.status(102), None);

    time::sleep(3 * HOUR).await;
    let totals = pipeline.stop().await;

    assert_eq!(totals, BatchOutcome { completed: 2, failed: 0 });
    assert_eq!(app.store.status(102), Some(CommentStatus::Completed));
    assert_eq!(app.store.story_inserts(), 1);
    assert_eq!(app.store.comment_inserts(), 2);
    assert_eq!(app.extraction_count(101), 1);
    assert_eq!(app.extraction_count(102), 1);
}

#[tokio::test(start_paused = true)]
async fn test_large_thread_is_split_into_bounded_batches() {
    let texts: Vec<String> = (0..75).map(|i| format!("Company {i} | Engineer")).collect();
    let replies: Vec<(i64, &str)> = texts
        .iter()
        .enumerate()
        .map(|(i, text)| (1000 + i as i64, text.as_str()))
        .collect();
    let app = TestApp::with_thread(&replies, FakeExtractor::one_job_each());

    let pipeline = app.start();
    time::sleep(HOUR).await;
    let totals = pipeline.stop().await;

    assert_eq!(totals, BatchOutcome { completed: 75, failed: 0 });
    let calls = app.extractor.calls();
    assert!(calls.len() >= 3);
    assert!(calls.iter().all(|batch| (1..=30).contains(&batch.len())));
    assert_eq!(calls.iter().map(Vec::len).sum::<usize>(), 75);
    assert_eq!(app.store.jobs().len(), 75);
}

#[tokio::test(start_paused = true)]
async fn test_non_postings_complete_without_jobs() {
    let app = TestApp::with_thread(
        &[(201, "Is this role open to contractors?")],
        FakeExtractor::with_postings(vec![JobPosting {
            id: Some(CommentId(201)),
            is_job_posting: false,
            ..JobPosting::default()
        }]),
    );

    let pipeline = app.start();
    time::sleep(HOUR).await;
    let totals = pipeline.stop().await;

    assert_eq!(totals, BatchOutcome { completed: 1, failed: 0 });
    assert_eq!(app.store.status(201), Some(CommentStatus::Completed));
    assert!(app.store.jobs().is_empty());
    assert_eq!(app.store.tag_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_drains_queued_comments() {
    let app = TestApp::with_thread(
        &[(301, "Gamma | SRE"), (302, "Delta | Data")],
        FakeExtractor::one_job_each(),
    );

    // Stop right away; the first scrape still runs and its comments are drained.
    let pipeline = app.start();
    tokio::task::yield_now().await;
    let totals = pipeline.stop().await;

    for id in [301, 302] {
        let status = app.store.status(id);
        assert!(
            status.is_none() || status == Some(CommentStatus::Completed),
            "comment {id} left as {status:?}"
        );
    }
    assert_eq!(totals.failed, 0);
    assert_eq!(totals.completed, app.store.comments().len());
}
