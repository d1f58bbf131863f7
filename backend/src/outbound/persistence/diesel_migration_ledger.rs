//! PostgreSQL-backed migration ledger.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::domain::Migration;
use crate::domain::ports::{MigrationLedger, MigrationLedgerError};
use crate::domain::statement_preview;

use super::cancellation::run_cancellable;
use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::NewSchemaMigrationRow;
use super::pool::{DbPool, PoolError};
use super::schema::schema_migrations;

const CREATE_LEDGER_SQL: &str = "CREATE TABLE IF NOT EXISTS schema_migrations (
    version VARCHAR(255) PRIMARY KEY,
    name VARCHAR(255) NOT NULL,
    executed_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
)";

/// Diesel-backed implementation of the [`MigrationLedger`] port.
#[derive(Clone)]
pub struct DieselMigrationLedger {
    pool: DbPool,
}

impl DieselMigrationLedger {
    /// Create a ledger over the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Failure inside the apply transaction.
enum ApplyFailure {
    Statement {
        index: usize,
        error: diesel::result::Error,
    },
    Ledger(diesel::result::Error),
}

impl From<diesel::result::Error> for ApplyFailure {
    fn from(error: diesel::result::Error) -> Self {
        Self::Ledger(error)
    }
}

fn map_pool_error(error: PoolError) -> MigrationLedgerError {
    map_basic_pool_error(error, |message| MigrationLedgerError::connection(message))
}

fn map_diesel_error(error: diesel::result::Error) -> MigrationLedgerError {
    map_basic_diesel_error(
        error,
        MigrationLedgerError::query,
        MigrationLedgerError::connection,
    )
}

fn map_apply_failure(failure: ApplyFailure) -> MigrationLedgerError {
    match failure {
        ApplyFailure::Statement { index, error } => {
            let message = map_diesel_error(error).to_string();
            MigrationLedgerError::statement(index, message)
        }
        ApplyFailure::Ledger(error) => map_diesel_error(error),
    }
}

async fn execute_statements(
    conn: &mut AsyncPgConnection,
    version: &str,
    statements: &[String],
) -> Result<(), ApplyFailure> {
    for (offset, statement) in statements.iter().enumerate() {
        let index = offset + 1;
        info!(
            version,
            index,
            sql = %statement_preview(statement),
            "executing migration statement"
        );
        diesel::sql_query(statement.as_str())
            .execute(&mut *conn)
            .await
            .map_err(|error| ApplyFailure::Statement { index, error })?;
    }
    Ok(())
}

#[async_trait]
impl MigrationLedger for DieselMigrationLedger {
    async fn ensure_ledger(&self, cancel: &CancellationToken) -> Result<(), MigrationLedgerError> {
        let ensure = async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            diesel::sql_query(CREATE_LEDGER_SQL)
                .execute(&mut conn)
                .await
                .map_err(map_diesel_error)?;
            debug!("migration ledger ready");
            Ok(())
        };
        run_cancellable(cancel, MigrationLedgerError::cancelled, ensure).await
    }

    async fn is_applied(
        &self,
        version: &str,
        cancel: &CancellationToken,
    ) -> Result<bool, MigrationLedgerError> {
        let lookup = async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            let count: i64 = schema_migrations::table
                .filter(schema_migrations::version.eq(version))
                .count()
                .get_result(&mut conn)
                .await
                .map_err(map_diesel_error)?;
            Ok(count > 0)
        };
        run_cancellable(cancel, MigrationLedgerError::cancelled, lookup).await
    }

    async fn apply(
        &self,
        migration: &Migration,
        statements: &[String],
        cancel: &CancellationToken,
    ) -> Result<(), MigrationLedgerError> {
        let apply = async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            let record = NewSchemaMigrationRow {
                version: migration.version(),
                name: migration.name(),
            };
            conn.transaction(|conn| {
                async move {
                    execute_statements(conn, record.version, statements).await?;
                    diesel::insert_into(schema_migrations::table)
                        .values(&record)
                        .execute(conn)
                        .await?;
                    Ok::<(), ApplyFailure>(())
                }
                .scope_boxed()
            })
            .await
            .map_err(map_apply_failure)?;
            info!(version = migration.version(), "migration recorded");
            Ok(())
        };
        run_cancellable(cancel, MigrationLedgerError::cancelled, apply).await
    }
}
