//! Port for durable vote storage.
//!
//! Writes are unconditional upserts keyed on the vote id, so replaying a
//! batch converges on the same stored rows.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::domain::{Vote, VoteId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by vote repository adapters.
    pub enum VoteRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "vote repository connection failed: {message}",
        /// Query or transaction failed during execution.
        Query { message: String } =>
            "vote repository query failed: {message}",
        /// A vote failed re-validation before any write was attempted.
        InvalidInput { index: usize, message: String } =>
            "invalid vote at index {index}: {message}",
        /// The caller cancelled the operation; nothing was committed.
        Cancelled => "vote repository operation was cancelled",
    }
}

/// Re-check every vote before it reaches the store.
///
/// # Errors
///
/// Returns [`VoteRepositoryError::InvalidInput`] for the first invalid vote.
pub fn ensure_votes_valid(votes: &[Vote]) -> Result<(), VoteRepositoryError> {
    for (index, vote) in votes.iter().enumerate() {
        vote.validate()
            .map_err(|err| VoteRepositoryError::invalid_input(index, err.to_string()))?;
    }
    Ok(())
}

/// Port for persisting votes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VoteRepository: Send + Sync {
    /// Upsert a single vote.
    async fn save(
        &self,
        vote: &Vote,
        cancel: &CancellationToken,
    ) -> Result<(), VoteRepositoryError>;

    /// Upsert every vote in one transaction; nothing is stored on failure.
    async fn bulk_save(
        &self,
        votes: &[Vote],
        cancel: &CancellationToken,
    ) -> Result<(), VoteRepositoryError>;

    /// Load a stored vote.
    async fn find_by_id(
        &self,
        id: &VoteId,
        cancel: &CancellationToken,
    ) -> Result<Option<Vote>, VoteRepositoryError>;
}

/// Fixture implementation that validates and discards writes.
#[cfg(test)]
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureVoteRepository;

#[cfg(test)]
#[async_trait]
impl VoteRepository for FixtureVoteRepository {
    async fn save(
        &self,
        vote: &Vote,
        _cancel: &CancellationToken,
    ) -> Result<(), VoteRepositoryError> {
        ensure_votes_valid(std::slice::from_ref(vote))
    }

    async fn bulk_save(
        &self,
        votes: &[Vote],
        _cancel: &CancellationToken,
    ) -> Result<(), VoteRepositoryError> {
        ensure_votes_valid(votes)
    }

    async fn find_by_id(
        &self,
        _id: &VoteId,
        _cancel: &CancellationToken,
    ) -> Result<Option<Vote>, VoteRepositoryError> {
        Ok(None)
    }
}
