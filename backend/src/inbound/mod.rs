//! Inbound adapters that translate external input into domain calls.
//!
//! [`queue`] decodes vote payloads delivered by the message broker.

pub mod queue;
