//! Template databases migrated with the production migration engine.
//!
//! The first suite to ask for a database creates a template named after a
//! hash of `backend/migrations`, runs every migration against it, and each
//! test then clones it. Editing a migration file yields a new template.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

use backend::domain::MigrationEngine;
use backend::outbound::persistence::{DbPool, DieselMigrationLedger, PoolConfig};
use pg_embedded_setup_unpriv::test_support::hash_directory;
use pg_embedded_setup_unpriv::{ClusterHandle, TemporaryDatabase};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

static TEMPLATE_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

const TEMPLATE_NAME_PREFIX: &str = "votes_template";
const TEMPLATE_PROVISION_RETRIES: usize = 5;
const TEMPLATE_PROVISION_RETRY_DELAY: Duration = Duration::from_millis(500);

/// The `backend/migrations` directory shipped with the crate.
pub fn migrations_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("migrations")
}

fn template_database_name() -> Result<String, String> {
    let hash = hash_directory(migrations_dir()).map_err(|err| format!("hash migrations: {err}"))?;
    let short_hash = hash.get(..8).unwrap_or(&hash);
    Ok(format!("{TEMPLATE_NAME_PREFIX}_{short_hash}"))
}

fn ensure_template_database(cluster: &ClusterHandle) -> Result<String, String> {
    let template_name = template_database_name()?;
    let _lock = TEMPLATE_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|err| err.into_inner());

    let exists = cluster
        .database_exists(template_name.as_str())
        .map_err(|err| format!("template check: {err:?}"))?;
    if !exists {
        cluster
            .create_database(template_name.as_str())
            .map_err(|err| format!("create template: {err:?}"))?;
        let url = cluster.connection().database_url(&template_name);
        migrate_schema(&url)?;
    }
    Ok(template_name)
}

/// Clone a fresh database from the migrated template.
pub fn provision_template_database(cluster: &ClusterHandle) -> Result<TemporaryDatabase, String> {
    let mut last_error = String::from("create database from template: no attempts made");
    for attempt in 1..=TEMPLATE_PROVISION_RETRIES {
        let cloned = ensure_template_database(cluster).and_then(|template_name| {
            let db_name = format!("test_{}", Uuid::new_v4());
            cluster
                .temporary_database_from_template(db_name.as_str(), template_name.as_str())
                .map_err(|err| format!("create database from template: {err:?}"))
        });
        match cloned {
            Ok(database) => return Ok(database),
            Err(error) => {
                last_error = format!("attempt {attempt}/{TEMPLATE_PROVISION_RETRIES}: {error}");
            }
        }
        if attempt < TEMPLATE_PROVISION_RETRIES {
            std::thread::sleep(TEMPLATE_PROVISION_RETRY_DELAY);
        }
    }
    Err(last_error)
}

/// Apply `backend/migrations` to the database at `url`.
///
/// Must not be called from inside a Tokio runtime.
pub fn migrate_schema(url: &str) -> Result<(), String> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| format!("migration runtime: {err}"))?;
    runtime.block_on(async {
        let pool = DbPool::new(PoolConfig::new(url).with_max_size(1).with_min_idle(None))
            .await
            .map_err(|err| format!("migration pool: {err}"))?;
        let engine = MigrationEngine::new(Arc::new(DieselMigrationLedger::new(pool)));
        engine
            .run(&migrations_dir(), &CancellationToken::new())
            .await
            .map(|_| ())
            .map_err(|err| format!("migration: {err}"))
    })
}

/// Create an empty database with no migrations applied.
pub fn provision_empty_database(cluster: &ClusterHandle) -> Result<TemporaryDatabase, String> {
    let db_name = format!("empty_{}", Uuid::new_v4());
    cluster
        .temporary_database(db_name.as_str())
        .map_err(|err| format!("create empty database: {err:?}"))
}
