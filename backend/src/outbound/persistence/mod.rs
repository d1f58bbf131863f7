//! PostgreSQL persistence adapters using Diesel.
//!
//! Implements the domain's [`VoteRepository`](crate::domain::ports::VoteRepository)
//! and [`MigrationLedger`](crate::domain::ports::MigrationLedger) ports with
//! `diesel-async` connections pooled by `bb8`.
//!
//! Row structs (`models.rs`) and table definitions (`schema.rs`) stay inside
//! this module. Every store-facing call accepts a cancellation token; see
//! `cancellation.rs` for what happens to an interrupted transaction.
//!
//! # Example
//!
//! ```no_run
//! use backend::outbound::persistence::{DbPool, DieselVoteRepository, PoolConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/votes")).await?;
//! pool.ping().await?;
//! let repository = DieselVoteRepository::new(pool);
//! # let _ = repository;
//! # Ok(())
//! # }
//! ```

mod cancellation;
mod diesel_basic_error_mapping;
mod diesel_migration_ledger;
mod diesel_vote_repository;
mod models;
mod pool;
mod schema;

pub use diesel_migration_ledger::DieselMigrationLedger;
pub use diesel_vote_repository::DieselVoteRepository;
pub use pool::{DbPool, PoolConfig, PoolError};
