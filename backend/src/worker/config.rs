//! Worker configuration loaded via OrthoConfig.
//!
//! Values come from CLI flags, `VOTES_*` environment variables, and config
//! files, in OrthoConfig's usual precedence.

use std::path::PathBuf;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::domain::DEFAULT_BATCH_SIZE;
use crate::outbound::persistence::PoolConfig;

const DEFAULT_WORKERS: usize = 5;
const DEFAULT_MIGRATIONS_PATH: &str = "migrations";
const DEFAULT_POOL_MAX_SIZE: u32 = 10;
const DEFAULT_POOL_MIN_IDLE: u32 = 2;
const DEFAULT_POOL_TIMEOUT_SECS: u64 = 30;

/// Invalid or missing worker configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorkerConfigError {
    #[error("database URL missing: set --database-url or VOTES_DATABASE_URL")]
    MissingDatabaseUrl,
    #[error("{field} must be greater than zero")]
    ZeroValue { field: &'static str },
    #[error("pool_min_idle ({min_idle}) must not exceed pool_max_size ({max_size})")]
    MinIdleExceedsMaxSize { min_idle: u32, max_size: u32 },
}

/// Configuration values for the vote worker.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "VOTES")]
pub struct WorkerSettings {
    /// PostgreSQL connection URL.
    pub database_url: Option<String>,
    /// Expected upper bound on votes per batch.
    pub batch_size: Option<usize>,
    /// Number of batches processed concurrently.
    pub workers: Option<usize>,
    /// Apply pending migrations before accepting traffic.
    pub run_migrations: Option<bool>,
    /// Directory scanned for `*.sql` migration files.
    pub migrations_path: Option<PathBuf>,
    /// Maximum pooled connections.
    pub pool_max_size: Option<u32>,
    /// Idle connections kept open.
    pub pool_min_idle: Option<u32>,
    /// Connection checkout timeout in seconds.
    pub pool_connection_timeout_secs: Option<u64>,
}

impl WorkerSettings {
    /// Return the configured database URL, if any.
    pub fn database_url(&self) -> Option<&str> {
        self.database_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    /// Return the batch size, falling back to the default.
    pub fn batch_size(&self) -> usize {
        self.batch_size.unwrap_or(DEFAULT_BATCH_SIZE)
    }

    /// Return the worker count, falling back to the default.
    pub fn workers(&self) -> usize {
        self.workers.unwrap_or(DEFAULT_WORKERS)
    }

    /// Whether to migrate on startup; on unless explicitly disabled.
    pub fn run_migrations(&self) -> bool {
        self.run_migrations.unwrap_or(true)
    }

    fn pool_max_size(&self) -> u32 {
        self.pool_max_size.unwrap_or(DEFAULT_POOL_MAX_SIZE)
    }

    /// Return the migrations directory, falling back to `migrations`.
    pub fn migrations_path(&self) -> PathBuf {
        self.migrations_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_MIGRATIONS_PATH))
    }

    /// Reject values the worker cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerConfigError`] for a missing URL, a zero count, or an
    /// explicit idle floor above the pool size.
    pub fn validate(&self) -> Result<(), WorkerConfigError> {
        if self.database_url().is_none() {
            return Err(WorkerConfigError::MissingDatabaseUrl);
        }
        if self.batch_size() == 0 {
            return Err(WorkerConfigError::ZeroValue {
                field: "batch_size",
            });
        }
        if self.workers() == 0 {
            return Err(WorkerConfigError::ZeroValue { field: "workers" });
        }
        let max_size = self.pool_max_size();
        if max_size == 0 {
            return Err(WorkerConfigError::ZeroValue {
                field: "pool_max_size",
            });
        }
        if let Some(min_idle) = self.pool_min_idle.filter(|idle| *idle > max_size) {
            return Err(WorkerConfigError::MinIdleExceedsMaxSize { min_idle, max_size });
        }
        Ok(())
    }

    /// Build the pool configuration.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerConfigError::MissingDatabaseUrl`] when no URL is set.
    pub fn pool_config(&self) -> Result<PoolConfig, WorkerConfigError> {
        let url = self
            .database_url()
            .ok_or(WorkerConfigError::MissingDatabaseUrl)?;
        let max_size = self.pool_max_size();
        let min_idle = self
            .pool_min_idle
            .unwrap_or(DEFAULT_POOL_MIN_IDLE.min(max_size));
        Ok(PoolConfig::new(url)
            .with_max_size(max_size)
            .with_min_idle(Some(min_idle))
            .with_connection_timeout(Duration::from_secs(
                self.pool_connection_timeout_secs
                    .unwrap_or(DEFAULT_POOL_TIMEOUT_SECS),
            )))
    }
}
