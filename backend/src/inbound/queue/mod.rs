//! Queue-facing adapter.
//!
//! The broker consumer itself lives outside this crate; it hands batches of
//! raw message bodies to [`VoteMessageHandler::handle`].

mod handler;
mod vote_message;

pub use handler::{HandleReport, VoteMessageHandler};
pub use vote_message::{VoteMessage, VoteMessageError};
