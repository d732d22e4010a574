//! Bounded FIFO of comment IDs between producers and the processor.
//!
//! Producers (the scraper and recovery scans) hold [`CommentQueue`]
//! handles; the single consumer holds the [`CommentReceiver`]. A full
//! queue blocks producers. Once every handle is dropped the receiver
//! drains what is buffered and then reports the end of the stream.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time;

use hnjobs_core::error::AppError;
use hnjobs_core::result::AppResult;
use hnjobs_core::types::CommentId;

/// Create a queue holding at most `capacity` IDs.
pub fn comment_queue(capacity: usize) -> (CommentQueue, CommentReceiver) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (CommentQueue { tx }, CommentReceiver { rx })
}

/// Producer handle. Cloning it adds another producer.
#[derive(Debug, Clone)]
pub struct CommentQueue {
    tx: mpsc::Sender<CommentId>,
}

impl CommentQueue {
    /// Push one ID, waiting for space if the queue is full.
    pub async fn push(&self, id: CommentId) -> AppResult<()> {
        self.tx
            .send(id)
            .await
            .map_err(|_| AppError::service_unavailable("Comment queue is closed"))
    }

    /// Push every ID in order, returning how many were pushed.
    pub async fn push_all<I>(&self, ids: I) -> AppResult<usize>
    where
        I: IntoIterator<Item = CommentId>,
    {
        let mut pushed = 0;
        for id in ids {
            self.push(id).await?;
            pushed += 1;
        }
        Ok(pushed)
    }

    /// Number of IDs currently buffered.
    pub fn len(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    /// Whether nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Consumer handle.
#[derive(Debug)]
pub struct CommentReceiver {
    rx: mpsc::Receiver<CommentId>,
}

impl CommentReceiver {
    /// Wait for the next batch of up to `max` IDs.
    ///
    /// Waits indefinitely for the first ID, then keeps collecting until
    /// `max` IDs are held or `idle` passes without a new one. Returns
    /// `None` once the queue is closed and empty.
    pub async fn next_batch(&mut self, max: usize, idle: Duration) -> Option<Vec<CommentId>> {
        let max = max.max(1);
        let first = self.rx.recv().await?;

        let mut batch = Vec::with_capacity(max);
        batch.push(first);

        while batch.len() < max {
            match time::timeout(idle, self.rx.recv()).await {
                Ok(Some(id)) => batch.push(id),
                // Closed or idle: flush what we have.
                Ok(None) | Err(_) => break,
            }
        }

        Some(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const IDLE: Duration = Duration::from_secs(5);

    #[tokio::test(start_paused = true)]
    async fn test_full_batch_returns_without_waiting() {
        let (queue, mut receiver) = comment_queue(100);
        queue.push_all((1..=40).map(CommentId)).await.expect("queue open");

        let started = time::Instant::now();
        let batch = receiver.next_batch(30, IDLE).await.expect("batch");
        assert_eq!(batch.len(), 30);
        assert_eq!(batch[0], CommentId(1));
        assert!(started.elapsed() < IDLE);

        let rest = receiver.next_batch(30, IDLE).await.expect("batch");
        assert_eq!(rest.len(), 10);
        assert_eq!(rest[0], CommentId(31));
    }

    #[tokio::test(start_paused = true)]
    async fn test_partial_batch_flushes_after_idle() {
        let (queue, mut receiver) = comment_queue(100);
        queue.push_all([CommentId(7), CommentId(8)]).await.expect("queue open");

        let started = time::Instant::now();
        let batch = receiver.next_batch(30, IDLE).await.expect("batch");
        assert_eq!(batch, vec![CommentId(7), CommentId(8)]);
        assert!(started.elapsed() >= IDLE);

        drop(queue);
    }

    #[tokio::test]
    async fn test_closed_queue_drains_then_ends() {
        let (queue, mut receiver) = comment_queue(10);
        queue.push(CommentId(1)).await.expect("queue open");
        queue.push(CommentId(2)).await.expect("queue open");
        drop(queue);

        let batch = receiver.next_batch(30, IDLE).await.expect("buffered items");
        assert_eq!(batch, vec![CommentId(1), CommentId(2)]);
        assert!(receiver.next_batch(30, IDLE).await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_queue_blocks_producer() {
        let (queue, mut receiver) = comment_queue(1);
        queue.push(CommentId(1)).await.expect("queue open");
        assert_eq!(queue.len(), 1);

        let blocked = time::timeout(Duration::from_millis(50), queue.push(CommentId(2))).await;
        assert!(blocked.is_err());

        let batch = receiver.next_batch(1, IDLE).await.expect("batch");
        assert_eq!(batch, vec![CommentId(1)]);
        queue.push(CommentId(2)).await.expect("space freed");
    }

    #[tokio::test]
    async fn test_push_after_receiver_dropped_fails() {
        let (queue, receiver) = comment_queue(1);
        drop(receiver);
        let err = queue.push(CommentId(1)).await.unwrap_err();
        assert_eq!(err.kind, hnjobs_core::error::ErrorKind::ServiceUnavailable);
    }
}
