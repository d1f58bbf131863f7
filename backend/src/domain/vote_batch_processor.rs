//! Batch pipeline that admits, persists, and settles incoming votes.
//!
//! Invalid or non-admissible votes are skipped and keep their status. The
//! survivors are written in a single repository call, then all move to
//! `PROCESSED` or, if the write fails, all move to `FAILED` with the error
//! text recorded.

use std::sync::Arc;

use mockable::Clock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::domain::ports::{VoteRepository, VoteRepositoryError};
use crate::domain::{Vote, VoteId, VoteTransitionError, VoteValidationError};

/// Batch size used when none is configured.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Errors returned by [`VoteBatchProcessor`].
#[derive(Debug, thiserror::Error)]
pub enum VoteProcessingError {
    /// The repository rejected the write; every attempted vote is `FAILED`.
    #[error("failed to persist {attempted} vote(s): {source}")]
    PersistenceFailed {
        attempted: usize,
        #[source]
        source: VoteRepositoryError,
    },
    /// The repository rejected a single vote, which is now `FAILED`.
    #[error("failed to persist vote {vote_id}: {source}")]
    SaveFailed {
        vote_id: VoteId,
        #[source]
        source: VoteRepositoryError,
    },
    /// Every vote in a non-empty batch was skipped.
    #[error("no valid votes in batch of {batch_size}")]
    NoValidEntries { batch_size: usize },
    /// The write was cancelled; every attempted vote is `FAILED`.
    #[error("vote processing was cancelled")]
    Cancelled,
    /// A single vote failed validation.
    #[error("invalid vote: {0}")]
    InvalidVote(#[from] VoteValidationError),
    /// A single vote was not in a state that allows processing.
    #[error(transparent)]
    Transition(#[from] VoteTransitionError),
}

/// Counts reported for a processed batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchOutcome {
    /// Votes written and marked `PROCESSED`.
    pub persisted: usize,
    /// Votes discarded before the write.
    pub skipped: usize,
}

/// Drives votes through validation, persistence and status settlement.
#[derive(Clone)]
pub struct VoteBatchProcessor<R> {
    repository: Arc<R>,
    clock: Arc<dyn Clock>,
    batch_size: usize,
}

impl<R> VoteBatchProcessor<R> {
    /// Create a processor over `repository`.
    pub fn new(repository: Arc<R>, clock: Arc<dyn Clock>) -> Self {
        Self {
            repository,
            clock,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Set the expected upper bound on batch length. Zero is ignored.
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        if batch_size > 0 {
            self.batch_size = batch_size;
        }
        self
    }

    /// Configured batch size.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }
}

/// Try to move a vote into `PROCESSING`, returning why it was skipped.
fn admit(vote: &mut Vote) -> Result<(), String> {
    vote.validate().map_err(|err| err.to_string())?;
    if !vote.can_be_processed() {
        return Err(format!("status {} cannot be processed", vote.status()));
    }
    vote.mark_as_processing().map_err(|err| err.to_string())
}

fn settle_failed(votes: &mut [Vote], admitted: &[usize], reason: &dyn std::fmt::Display) {
    for &index in admitted {
        let Some(vote) = votes.get_mut(index) else {
            continue;
        };
        if let Err(err) = vote.mark_as_failed_with_error(reason) {
            warn!(vote_id = %vote.id(), error = %err, "could not mark vote as failed");
        }
    }
}

fn into_processing_error(error: VoteRepositoryError, attempted: usize) -> VoteProcessingError {
    match error {
        VoteRepositoryError::Cancelled => VoteProcessingError::Cancelled,
        source => VoteProcessingError::PersistenceFailed { attempted, source },
    }
}

impl<R> VoteBatchProcessor<R>
where
    R: VoteRepository,
{
    /// Process a batch in place.
    ///
    /// Skipped votes keep their status; admitted votes end `PROCESSED` on
    /// success or `FAILED` when the write fails.
    ///
    /// # Errors
    ///
    /// - [`VoteProcessingError::NoValidEntries`] when nothing was admitted.
    /// - [`VoteProcessingError::PersistenceFailed`] when the write failed.
    /// - [`VoteProcessingError::Cancelled`] when `cancel` fired mid-write.
    pub async fn process_batch(
        &self,
        votes: &mut [Vote],
        cancel: &CancellationToken,
    ) -> Result<BatchOutcome, VoteProcessingError> {
        if votes.is_empty() {
            return Ok(BatchOutcome::default());
        }
        if votes.len() > self.batch_size {
            warn!(
                batch_len = votes.len(),
                batch_size = self.batch_size,
                "batch exceeds configured size"
            );
        }

        let mut admitted = Vec::with_capacity(votes.len());
        for (index, vote) in votes.iter_mut().enumerate() {
            match admit(vote) {
                Ok(()) => admitted.push(index),
                Err(reason) => {
                    debug!(index, vote_id = %vote.id(), %reason, "skipping vote");
                }
            }
        }

        let skipped = votes.len() - admitted.len();
        if admitted.is_empty() {
            warn!(batch_size = votes.len(), "batch contained no valid votes");
            return Err(VoteProcessingError::NoValidEntries {
                batch_size: votes.len(),
            });
        }

        let pending: Vec<Vote> = admitted
            .iter()
            .filter_map(|&index| votes.get(index).cloned())
            .collect();

        if let Err(error) = self.repository.bulk_save(&pending, cancel).await {
            warn!(attempted = pending.len(), %error, "bulk vote save failed");
            settle_failed(votes, &admitted, &error);
            return Err(into_processing_error(error, pending.len()));
        }

        for &index in &admitted {
            if let Some(vote) = votes.get_mut(index) {
                vote.mark_as_processed(self.clock.as_ref())?;
            }
        }

        let outcome = BatchOutcome {
            persisted: admitted.len(),
            skipped,
        };
        info!(
            persisted = outcome.persisted,
            skipped = outcome.skipped,
            "processed vote batch"
        );
        Ok(outcome)
    }

    /// Process one vote in place.
    ///
    /// # Errors
    ///
    /// Returns validation and transition errors without touching the store.
    /// [`VoteProcessingError::SaveFailed`] and cancellation leave the vote
    /// `FAILED`.
    pub async fn process_single(
        &self,
        vote: &mut Vote,
        cancel: &CancellationToken,
    ) -> Result<(), VoteProcessingError> {
        vote.validate()?;
        vote.mark_as_processing()?;

        if let Err(error) = self.repository.save(vote, cancel).await {
            warn!(vote_id = %vote.id(), %error, "vote save failed");
            vote.mark_as_failed_with_error(&error)?;
            return Err(match error {
                VoteRepositoryError::Cancelled => VoteProcessingError::Cancelled,
                source => VoteProcessingError::SaveFailed {
                    vote_id: vote.id(),
                    source,
                },
            });
        }

        vote.mark_as_processed(self.clock.as_ref())?;
        debug!(vote_id = %vote.id(), "processed vote");
        Ok(())
    }
}

#[cfg(test)]
#[path = "vote_batch_processor_tests.rs"]
mod tests;
