//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL-backed vote storage and migration ledger
//!   using Diesel.
//!
//! Adapters translate between domain types and store representations and
//! contain no business logic.

pub mod persistence;
