//! Worker process configuration and startup.

pub mod config;
mod startup;

pub use config::{WorkerConfigError, WorkerSettings};
pub use startup::{StartupError, VoteWorker};
