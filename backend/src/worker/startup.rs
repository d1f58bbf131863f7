//! Worker bootstrap: pool, health check, migrations, and pipeline wiring.

use std::sync::Arc;

use mockable::{Clock, DefaultClock};
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::domain::{MigrationEngine, MigrationError, VoteBatchProcessor, VoteProcessingError};
use crate::inbound::queue::{HandleReport, VoteMessageHandler};
use crate::outbound::persistence::{
    DbPool, DieselMigrationLedger, DieselVoteRepository, PoolError,
};

use super::config::{WorkerConfigError, WorkerSettings};

/// Errors that stop the worker from starting.
#[derive(Debug, Error)]
pub enum StartupError {
    /// Settings were missing or out of range.
    #[error("invalid worker configuration: {0}")]
    Config(#[from] WorkerConfigError),
    /// The pool could not be built or the store did not answer.
    #[error("database unavailable: {0}")]
    Database(#[from] PoolError),
    /// A migration failed; the worker must not accept traffic.
    #[error("schema migration failed: {0}")]
    Migration(#[from] MigrationError),
}

/// A started worker ready to receive payload batches.
pub struct VoteWorker {
    handler: VoteMessageHandler<DieselVoteRepository>,
    permits: Arc<Semaphore>,
    cancel: CancellationToken,
}

impl VoteWorker {
    /// Connect, check health, migrate when enabled, and wire the pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`StartupError`] for invalid settings, an unreachable store, or
    /// a failed migration.
    pub async fn start(
        settings: &WorkerSettings,
        cancel: CancellationToken,
    ) -> Result<Self, StartupError> {
        Self::start_with_clock(settings, cancel, Arc::new(DefaultClock)).await
    }

    /// As [`VoteWorker::start`], stamping processed votes with `clock`.
    ///
    /// # Errors
    ///
    /// See [`VoteWorker::start`].
    pub async fn start_with_clock(
        settings: &WorkerSettings,
        cancel: CancellationToken,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, StartupError> {
        settings.validate()?;
        let pool = DbPool::new(settings.pool_config()?).await?;
        pool.ping().await?;

        if settings.run_migrations() {
            let path = settings.migrations_path();
            let engine = MigrationEngine::new(Arc::new(DieselMigrationLedger::new(pool.clone())));
            let report = engine.run(&path, &cancel).await?;
            info!(
                applied = report.applied.len(),
                skipped = report.skipped.len(),
                "schema is up to date"
            );
        } else {
            warn!("migrations disabled; assuming schema is current");
        }

        let repository = Arc::new(DieselVoteRepository::new(pool));
        let processor =
            VoteBatchProcessor::new(repository, clock).with_batch_size(settings.batch_size());
        let handler = VoteMessageHandler::new(processor);

        info!(
            batch_size = settings.batch_size(),
            workers = settings.workers(),
            run_migrations = settings.run_migrations(),
            migrations_path = %settings.migrations_path().display(),
            "vote worker started"
        );

        Ok(Self {
            handler,
            permits: Arc::new(Semaphore::new(settings.workers())),
            cancel,
        })
    }

    /// Process one batch of raw payloads.
    ///
    /// At most `workers` batches run at once; further callers wait.
    ///
    /// # Errors
    ///
    /// Returns [`VoteProcessingError::Cancelled`] once the worker is shutting
    /// down, otherwise whatever the pipeline returns.
    pub async fn handle_batch<P>(&self, payloads: &[P]) -> Result<HandleReport, VoteProcessingError>
    where
        P: AsRef<[u8]>,
    {
        let _permit = tokio::select! {
            biased;
            () = self.cancel.cancelled() => return Err(VoteProcessingError::Cancelled),
            permit = self.permits.acquire() => {
                permit.map_err(|_| VoteProcessingError::Cancelled)?
            }
        };
        self.handler.handle(payloads, &self.cancel).await
    }

    /// Stop admitting batches and cancel in-flight writes.
    pub fn shutdown(&self) {
        self.permits.close();
        self.cancel.cancel();
        info!("vote worker shutting down");
    }
}
