//! Vote ingestion backend.
//!
//! Votes arrive from a queue as JSON payloads, move through a guarded
//! lifecycle, and are persisted to PostgreSQL in batches. The schema is kept
//! current by a file-driven migration engine that runs before any traffic.
//!
//! - [`domain`]: entities, the batch processor, the migration engine, ports.
//! - [`inbound`]: payload decoding for the queue consumer.
//! - [`outbound`]: Diesel adapters for the ports.
//! - [`worker`]: configuration and process bootstrap.

pub mod domain;
pub mod inbound;
pub mod outbound;
pub mod worker;
