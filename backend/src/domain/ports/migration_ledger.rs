//! Port for the store side of schema migrations.
//!
//! The ledger table is the only record of which versions have been applied.
//! Adapters must execute a migration's statements and its ledger insert in a
//! single transaction.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::domain::Migration;

use super::define_port_error;

define_port_error! {
    /// Errors raised by migration ledger adapters.
    pub enum MigrationLedgerError {
        /// Ledger connection could not be established.
        Connection { message: String } =>
            "migration ledger connection failed: {message}",
        /// Ledger bookkeeping query failed.
        Query { message: String } =>
            "migration ledger query failed: {message}",
        /// A migration statement failed; the transaction was rolled back.
        Statement { index: usize, message: String } =>
            "statement {index} failed: {message}",
        /// The caller cancelled the operation; nothing was committed.
        Cancelled => "migration ledger operation was cancelled",
    }
}

/// Store operations needed by [`crate::domain::MigrationEngine`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MigrationLedger: Send + Sync {
    /// Create the ledger table when it does not exist.
    async fn ensure_ledger(&self, cancel: &CancellationToken) -> Result<(), MigrationLedgerError>;

    /// Whether `version` has a ledger record.
    async fn is_applied(
        &self,
        version: &str,
        cancel: &CancellationToken,
    ) -> Result<bool, MigrationLedgerError>;

    /// Execute `statements` in order and record `migration`, atomically.
    ///
    /// An empty statement list only records the migration.
    async fn apply(
        &self,
        migration: &Migration,
        statements: &[String],
        cancel: &CancellationToken,
    ) -> Result<(), MigrationLedgerError>;
}
