//! Pipeline runner: wires scraper and recovery scans to the processor and
//! keeps the periodic timers armed until shutdown.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{error, info, warn};

use hnjobs_core::config::{ForumConfig, PipelineConfig};
use hnjobs_core::error::AppError;
use hnjobs_core::result::AppResult;
use hnjobs_core::types::CommentId;
use hnjobs_database::PipelineStore;
use hnjobs_entity::comment::CommentStatus;
use hnjobs_extraction::JobExtractor;
use hnjobs_forum::ForumApi;

use crate::processor::{BatchOutcome, Processor};
use crate::queue::{CommentQueue, CommentReceiver, comment_queue};
use crate::scraper::{ScrapeReport, Scraper};

/// Owns the comment queue and everything that feeds or drains it.
pub struct Runner {
    scraper: Arc<Scraper>,
    processor: Arc<Processor>,
    store: Arc<dyn PipelineStore>,
    config: PipelineConfig,
    queue: CommentQueue,
    receiver: Option<CommentReceiver>,
    processor_task: Option<JoinHandle<BatchOutcome>>,
}

impl Runner {
    /// Build the pipeline around the given collaborators.
    pub fn new(
        store: Arc<dyn PipelineStore>,
        forum: Arc<dyn ForumApi>,
        extractor: Arc<dyn JobExtractor>,
        forum_config: ForumConfig,
        config: PipelineConfig,
    ) -> Self {
        let (queue, receiver) = comment_queue(config.queue_capacity);
        Self {
            scraper: Arc::new(Scraper::new(forum, Arc::clone(&store), forum_config)),
            processor: Arc::new(Processor::new(Arc::clone(&store), extractor, &config)),
            store,
            config,
            queue,
            receiver: Some(receiver),
            processor_task: None,
        }
    }

    /// Run until `cancel` flips to `true`.
    ///
    /// Starts the processor, re-feeds every queued, in-progress, and failed
    /// comment, then scrapes immediately and every scrape interval while
    /// re-feeding failed comments every recovery interval. Cancelling stops
    /// both timers but lets a scrape or recovery already under way finish.
    /// The processor keeps running until [`Runner::close`].
    pub async fn run(&mut self, cancel: watch::Receiver<bool>) -> AppResult<()> {
        self.start_processor()?;

        info!(
            queue_capacity = self.config.queue_capacity,
            scrape_interval_secs = self.config.scrape_interval_seconds,
            recovery_interval_secs = self.config.recovery_interval_seconds,
            "Runner started"
        );

        match self.recover(&CommentStatus::NON_TERMINAL).await {
            Ok(count) => info!(count, "Startup recovery scan queued comments"),
            Err(e) => error!(error = %e, "Startup recovery scan failed"),
        }

        let scrape_task = tokio::spawn(scrape_loop(
            Arc::clone(&self.scraper),
            self.queue.clone(),
            self.config.scrape_interval(),
            cancel.clone(),
        ));
        let recovery_task = tokio::spawn(recovery_loop(
            Arc::clone(&self.store),
            self.queue.clone(),
            self.config.recovery_interval(),
            cancel,
        ));

        for (name, task) in [("scrape", scrape_task), ("recovery", recovery_task)] {
            if let Err(e) = task.await {
                error!(timer = name, error = %e, "Timer task panicked");
            }
        }

        info!("Runner timers stopped");
        Ok(())
    }

    /// Re-feed every comment in `statuses`, returning how many were queued.
    ///
    /// Failed comments are moved back to `queued` in the store first.
    pub async fn recover(&self, statuses: &[CommentStatus]) -> AppResult<usize> {
        recover_into(self.store.as_ref(), &self.queue, statuses).await
    }

    /// Run the scraper once and process what it found, then shut down.
    pub async fn scrape_once(mut self) -> AppResult<(ScrapeReport, BatchOutcome)> {
        self.start_processor()?;
        let report = self.scraper.run(&self.queue).await;
        let outcome = self.close().await;
        Ok((report?, outcome))
    }

    /// Run one recovery scan and process the re-fed comments, then shut down.
    pub async fn recover_once(
        mut self,
        statuses: &[CommentStatus],
    ) -> AppResult<(usize, BatchOutcome)> {
        self.start_processor()?;
        let queued = self.recover(statuses).await;
        let outcome = self.close().await;
        Ok((queued?, outcome))
    }

    /// Close the queue and wait for the processor to drain it.
    pub async fn close(self) -> BatchOutcome {
        let Runner {
            queue,
            receiver,
            processor_task,
            ..
        } = self;
        drop(queue);
        drop(receiver);

        info!("Comment queue closed, waiting for processor to drain");
        match processor_task {
            Some(task) => match task.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!(error = %e, "Processor task panicked");
                    BatchOutcome::default()
                }
            },
            None => BatchOutcome::default(),
        }
    }

    fn start_processor(&mut self) -> AppResult<()> {
        let receiver = self
            .receiver
            .take()
            .ok_or_else(|| AppError::internal("Runner has already been started"))?;
        let processor = Arc::clone(&self.processor);
        self.processor_task = Some(tokio::spawn(async move { processor.run(receiver).await }));
        Ok(())
    }
}

async fn recover_into(
    store: &dyn PipelineStore,
    queue: &CommentQueue,
    statuses: &[CommentStatus],
) -> AppResult<usize> {
    // Completed comments are never re-fed.
    let others: Vec<CommentStatus> = statuses
        .iter()
        .copied()
        .filter(|s| !s.is_terminal() && *s != CommentStatus::Failed)
        .collect();

    let mut ids: BTreeSet<CommentId> = BTreeSet::new();
    if !others.is_empty() {
        ids.extend(store.comment_ids_by_status(&others).await?);
    }
    if statuses.contains(&CommentStatus::Failed) {
        ids.extend(store.requeue_failed().await?);
    }

    queue.push_all(ids).await
}

async fn scrape_loop(
    scraper: Arc<Scraper>,
    queue: CommentQueue,
    period: Duration,
    mut cancel: watch::Receiver<bool>,
) {
    let mut ticker = time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    while !*cancel.borrow() {
        tokio::select! {
            biased;
            changed = cancel.changed() => {
                if changed.is_err() || *cancel.borrow() {
                    info!("Scrape timer received shutdown signal");
                    break;
                }
            }
            _ = ticker.tick() => {
                match scraper.run(&queue).await {
                    Ok(_) => {}
                    Err(e) if e.is_retryable() => {
                        warn!(error = %e, "Scrape run interrupted; retrying on next tick");
                    }
                    Err(e) => error!(error = %e, "Scrape run aborted; retrying on next tick"),
                }
            }
        }
    }
}

async fn recovery_loop(
    store: Arc<dyn PipelineStore>,
    queue: CommentQueue,
    period: Duration,
    mut cancel: watch::Receiver<bool>,
) {
    // The startup scan already covered this tick.
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    while !*cancel.borrow() {
        tokio::select! {
            biased;
            changed = cancel.changed() => {
                if changed.is_err() || *cancel.borrow() {
                    info!("Recovery timer received shutdown signal");
                    break;
                }
            }
            _ = ticker.tick() => {
                match recover_into(store.as_ref(), &queue, &[CommentStatus::Failed]).await {
                    Ok(count) => info!(count, "Recovery scan re-queued failed comments"),
                    Err(e) => warn!(error = %e, "Recovery scan failed"),
                }
            }
        }
    }
}
