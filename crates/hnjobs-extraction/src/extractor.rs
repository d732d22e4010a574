//! The extraction port used by the processor.

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use tracing::warn;

use hnjobs_core::types::CommentId;
use hnjobs_entity::posting::JobPosting;

use crate::error::{ExtractionError, ExtractionResult};

/// Turns raw comment text into structured postings.
///
/// Implementations receive the batch keyed and ordered by comment ID and
/// return at most one posting per input, each tagged with its comment ID.
#[async_trait]
pub trait JobExtractor: Send + Sync + 'static {
    /// Parse a batch of comments.
    ///
    /// Fails with [`ExtractionError::NoInputs`] or
    /// [`ExtractionError::MaxBatch`] before any request is made when the
    /// batch is out of bounds.
    async fn parse_job_postings(
        &self,
        inputs: &BTreeMap<CommentId, String>,
    ) -> ExtractionResult<Vec<JobPosting>>;
}

/// Check that a batch holds between 1 and `max` inputs.
pub fn validate_batch(inputs: &BTreeMap<CommentId, String>, max: usize) -> ExtractionResult<()> {
    if inputs.is_empty() {
        return Err(ExtractionError::NoInputs);
    }
    if inputs.len() > max {
        return Err(ExtractionError::MaxBatch {
            size: inputs.len(),
            max,
        });
    }
    Ok(())
}

/// Tie every posting to a comment in the batch.
///
/// A posting without an `id` takes the ID at its position in the input
/// order. Postings naming an ID outside the batch, duplicates, and
/// surplus postings are dropped.
pub fn assign_ids(
    postings: Vec<JobPosting>,
    inputs: &BTreeMap<CommentId, String>,
) -> Vec<JobPosting> {
    let ordered: Vec<CommentId> = inputs.keys().copied().collect();
    let mut seen = HashSet::new();
    let mut assigned = Vec::with_capacity(postings.len());

    for (index, mut posting) in postings.into_iter().enumerate() {
        let id = match posting.id {
            Some(id) if inputs.contains_key(&id) => id,
            Some(id) => {
                warn!(comment_id = %id, "Model returned a posting for a comment not in the batch");
                continue;
            }
            None => match ordered.get(index) {
                Some(id) => *id,
                None => {
                    warn!(index, "Model returned more postings than inputs");
                    continue;
                }
            },
        };

        if !seen.insert(id) {
            warn!(comment_id = %id, "Model returned a duplicate posting");
            continue;
        }

        posting.id = Some(id);
        assigned.push(posting);
    }

    assigned
}
