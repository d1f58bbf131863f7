//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod migration_ledger;
mod vote_repository;

#[cfg(test)]
pub use migration_ledger::MockMigrationLedger;
pub use migration_ledger::{MigrationLedger, MigrationLedgerError};
#[cfg(test)]
pub use vote_repository::{FixtureVoteRepository, MockVoteRepository};
pub use vote_repository::{VoteRepository, VoteRepositoryError, ensure_votes_valid};
