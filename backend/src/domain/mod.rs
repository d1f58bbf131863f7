//! Domain primitives, services, and ports.
//!
//! Purpose: own the vote lifecycle, the batch pipeline that settles votes,
//! and the schema migration engine. Infrastructure is reached only through
//! the traits in [`ports`].
//!
//! Public surface:
//! - `Vote`, `VoteStatus`, `VoteId`: the entity and its transition graph.
//! - `VoteBatchProcessor`: validates, persists and settles batches.
//! - `MigrationEngine`, `Migration`: applies versioned SQL files once.

pub mod migrations;
pub mod ports;
mod vote_batch_processor;
pub mod votes;

#[cfg(test)]
pub(crate) mod test_fixtures;

pub use self::migrations::{
    Migration, MigrationEngine, MigrationError, MigrationReport, load_migrations,
    split_statements, statement_preview,
};
pub use self::vote_batch_processor::{
    BatchOutcome, DEFAULT_BATCH_SIZE, VoteBatchProcessor, VoteProcessingError,
};
pub use self::votes::{
    Vote, VoteDraft, VoteId, VoteStatus, VoteTransitionError, VoteValidationError,
};
