//! File-driven schema migrations.
//!
//! Migration files are named `<version>_<name>.sql`. Versions compare as
//! strings, so zero-pad numeric versions. The ledger records each applied
//! version and is the only thing consulted when deciding what to run; editing
//! an applied file has no effect.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::domain::ports::{MigrationLedger, MigrationLedgerError};

mod source;
mod splitter;

pub use source::load_migrations;
pub use splitter::{STATEMENT_PREVIEW_CHARS, split_statements, statement_preview};

/// Errors raised while loading or applying migrations.
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    /// A migration directory or file could not be read.
    #[error("failed to read migrations at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// A migration file name lacks the `<version>_<name>` shape.
    #[error("invalid migration filename format: {file_name}")]
    InvalidFileName { file_name: String },
    /// Two files declare the same version.
    #[error("duplicate migration version: {version}")]
    DuplicateVersion { version: String },
    /// The ledger table could not be prepared or queried.
    #[error("migration ledger unavailable: {0}")]
    Ledger(#[source] MigrationLedgerError),
    /// Applying a migration failed; its transaction was rolled back.
    #[error("migration {version} failed: {source}")]
    Apply {
        version: String,
        #[source]
        source: MigrationLedgerError,
    },
    /// The run was cancelled before completing.
    #[error("migration run was cancelled")]
    Cancelled,
}

impl MigrationError {
    pub(crate) fn read(path: &Path, source: std::io::Error) -> Self {
        Self::Read {
            path: path.to_path_buf(),
            source,
        }
    }

    fn from_ledger(error: MigrationLedgerError) -> Self {
        match error {
            MigrationLedgerError::Cancelled => Self::Cancelled,
            other => Self::Ledger(other),
        }
    }

    fn from_apply(version: &str, error: MigrationLedgerError) -> Self {
        match error {
            MigrationLedgerError::Cancelled => Self::Cancelled,
            source => Self::Apply {
                version: version.to_owned(),
                source,
            },
        }
    }
}

/// A versioned SQL change loaded from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Migration {
    version: String,
    name: String,
    body: String,
}

impl Migration {
    /// Build a migration from a file name and its contents.
    ///
    /// The version is everything before the first underscore; the name is
    /// the remainder without the `.sql` extension.
    ///
    /// # Errors
    ///
    /// Returns [`MigrationError::InvalidFileName`] when there is no
    /// underscore or the version is empty.
    ///
    /// # Examples
    /// ```
    /// use backend::domain::Migration;
    ///
    /// let migration = Migration::from_file("001_create_votes.sql", String::new())
    ///     .expect("valid file name");
    /// assert_eq!(migration.version(), "001");
    /// assert_eq!(migration.name(), "create_votes");
    /// ```
    pub fn from_file(file_name: &str, body: String) -> Result<Self, MigrationError> {
        let stem = file_name.strip_suffix(".sql").unwrap_or(file_name);
        match stem.split_once('_') {
            Some((version, name)) if !version.is_empty() => Ok(Self {
                version: version.to_owned(),
                name: name.to_owned(),
                body,
            }),
            _ => Err(MigrationError::InvalidFileName {
                file_name: file_name.to_owned(),
            }),
        }
    }

    /// Version string used for ordering and the ledger key.
    pub fn version(&self) -> &str {
        self.version.as_str()
    }

    /// Human-readable name.
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Raw SQL body.
    pub fn body(&self) -> &str {
        self.body.as_str()
    }

    /// Statements to execute, in order. Empty for a blank body.
    pub fn statements(&self) -> Vec<String> {
        split_statements(&self.body)
    }
}

/// Versions touched by a migration run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// Versions applied by this run, in order.
    pub applied: Vec<String>,
    /// Versions already present in the ledger.
    pub skipped: Vec<String>,
}

/// Applies pending migrations through a [`MigrationLedger`].
#[derive(Clone)]
pub struct MigrationEngine<L> {
    ledger: Arc<L>,
}

impl<L> MigrationEngine<L>
where
    L: MigrationLedger,
{
    /// Create an engine writing through `ledger`.
    pub fn new(ledger: Arc<L>) -> Self {
        Self { ledger }
    }

    /// Ensure the ledger exists, then apply every pending file under `dir`.
    ///
    /// # Errors
    ///
    /// Stops at the first failure. Migrations committed before it stay
    /// applied.
    pub async fn run(
        &self,
        dir: &Path,
        cancel: &CancellationToken,
    ) -> Result<MigrationReport, MigrationError> {
        self.ledger
            .ensure_ledger(cancel)
            .await
            .map_err(MigrationError::from_ledger)?;
        let migrations = load_migrations(dir)?;
        info!(
            count = migrations.len(),
            path = %dir.display(),
            "loaded migrations"
        );
        self.apply_pending(&migrations, cancel).await
    }

    /// Apply the given migrations in order, skipping recorded versions.
    ///
    /// The ledger must already exist.
    ///
    /// # Errors
    ///
    /// Stops at the first failure.
    pub async fn apply_pending(
        &self,
        migrations: &[Migration],
        cancel: &CancellationToken,
    ) -> Result<MigrationReport, MigrationError> {
        let mut report = MigrationReport::default();
        for migration in migrations {
            if cancel.is_cancelled() {
                return Err(MigrationError::Cancelled);
            }
            let applied = self
                .ledger
                .is_applied(migration.version(), cancel)
                .await
                .map_err(MigrationError::from_ledger)?;
            if applied {
                info!(version = migration.version(), "migration already applied");
                report.skipped.push(migration.version().to_owned());
                continue;
            }

            let statements = migration.statements();
            if statements.is_empty() {
                warn!(
                    version = migration.version(),
                    "migration body is blank; recording without executing"
                );
            }
            info!(
                version = migration.version(),
                name = migration.name(),
                statements = statements.len(),
                "applying migration"
            );
            self.ledger
                .apply(migration, &statements, cancel)
                .await
                .map_err(|error| MigrationError::from_apply(migration.version(), error))?;
            report.applied.push(migration.version().to_owned());
        }
        info!(
            applied = report.applied.len(),
            skipped = report.skipped.len(),
            "migrations complete"
        );
        Ok(report)
    }
}
