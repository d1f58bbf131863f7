//! Vote entity and lifecycle status.
//!
//! A vote is created when a queue payload is decoded and then only moves
//! through the transition operations on [`Vote`]. Every operation checks the
//! [`VoteStatus`] transition graph before mutating, so a rejected move leaves
//! the entity untouched.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

mod status;
mod vote;

pub use status::VoteStatus;
pub use vote::{Vote, VoteDraft};

/// Validation errors raised when checking whether a vote is well formed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoteValidationError {
    MissingId,
    NonPositiveParticipantId { participant_id: i64 },
    EmptySessionId,
    MissingTimestamp,
    InvalidStatus { value: String },
}

impl fmt::Display for VoteValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingId => write!(f, "vote id is required"),
            Self::NonPositiveParticipantId { participant_id } => write!(
                f,
                "participant id must be greater than zero (got {participant_id})"
            ),
            Self::EmptySessionId => write!(f, "session id is required"),
            Self::MissingTimestamp => write!(f, "vote timestamp is required"),
            Self::InvalidStatus { value } => write!(f, "invalid vote status: {value}"),
        }
    }
}

impl std::error::Error for VoteValidationError {}

/// Rejected lifecycle move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cannot change vote status from {from} to {to}")]
pub struct VoteTransitionError {
    /// Status the vote held when the move was attempted.
    pub from: VoteStatus,
    /// Requested status.
    pub to: VoteStatus,
}

/// Stable vote identifier stored as a UUID.
///
/// The nil UUID stands for "no identifier" and fails entity validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VoteId(Uuid);

impl VoteId {
    /// Generate a new random [`VoteId`].
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// The nil identifier.
    pub const fn nil() -> Self {
        Self(Uuid::nil())
    }

    /// Access the underlying UUID.
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Whether this identifier is absent.
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl fmt::Display for VoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for VoteId {
    type Err = uuid::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(value).map(Self)
    }
}
