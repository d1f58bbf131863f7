//! Apply pending schema migrations without starting the vote worker.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use backend::domain::MigrationEngine;
use backend::outbound::persistence::{DbPool, DieselMigrationLedger, PoolConfig};
use clap::Parser;
use color_eyre::eyre::{Result, WrapErr, eyre};
use tokio::runtime::Builder;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

/// `migrate` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "migrate",
    about = "Apply pending SQL migrations to the votes database",
    version
)]
struct CliArgs {
    /// Directory containing `<version>_<name>.sql` files.
    #[arg(long = "migrations-path", value_name = "dir", default_value = "migrations")]
    migrations_path: PathBuf,
    /// Database connection URL. Falls back to `DATABASE_URL` when omitted.
    #[arg(long = "database-url", value_name = "url")]
    database_url: Option<String>,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt().with_env_filter(EnvFilter::from_default_env()).try_init() {
        warn!(error = %e, "tracing init failed");
    }
    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .wrap_err("create Tokio runtime")?;
    runtime.block_on(async_main(CliArgs::parse()))
}

async fn async_main(args: CliArgs) -> Result<()> {
    let database_url = resolve_database_url(args.database_url, env::var("DATABASE_URL").ok())?;
    let config = PoolConfig::new(database_url)
        .with_max_size(1)
        .with_min_idle(None);
    let pool = DbPool::new(config)
        .await
        .wrap_err("create database pool")?;
    let engine = MigrationEngine::new(Arc::new(DieselMigrationLedger::new(pool)));

    let report = engine
        .run(&args.migrations_path, &CancellationToken::new())
        .await
        .wrap_err("apply migrations")?;

    info!(
        applied = ?report.applied,
        skipped = report.skipped.len(),
        "migrations finished"
    );
    Ok(())
}

fn resolve_database_url(explicit: Option<String>, from_env: Option<String>) -> Result<String> {
    if let Some(value) = explicit {
        if value.trim().is_empty() {
            return Err(eyre!("--database-url must not be empty when provided"));
        }
        return Ok(value);
    }
    match from_env {
        Some(value) if !value.trim().is_empty() => Ok(value),
        Some(_) => Err(eyre!("DATABASE_URL must not be empty")),
        None => Err(eyre!(
            "database URL missing: set --database-url or DATABASE_URL"
        )),
    }
}
