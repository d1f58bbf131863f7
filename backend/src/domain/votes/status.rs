//! Vote lifecycle status and its transition graph.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::VoteValidationError;

/// Lifecycle status of a [`super::Vote`].
///
/// The textual form (`RECEIVED`, `SENT`, ...) is the storage and wire
/// representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VoteStatus {
    /// Vote was decoded from the queue.
    Received,
    /// Vote arrived pre-tagged as sent by the producer.
    Sent,
    /// Vote was admitted into a batch and is being persisted.
    Processing,
    /// Vote was persisted. Terminal.
    Processed,
    /// Persistence failed. May be retried.
    Failed,
}

/// Allowed next states keyed by current state.
const TRANSITIONS: [(VoteStatus, &[VoteStatus]); 5] = [
    (VoteStatus::Received, &[VoteStatus::Processing]),
    (VoteStatus::Sent, &[VoteStatus::Processing]),
    (
        VoteStatus::Processing,
        &[VoteStatus::Processed, VoteStatus::Failed],
    ),
    (VoteStatus::Processed, &[]),
    (VoteStatus::Failed, &[VoteStatus::Processing]),
];

impl VoteStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 5] = [
        Self::Received,
        Self::Sent,
        Self::Processing,
        Self::Processed,
        Self::Failed,
    ];

    /// Return the storage representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Received => "RECEIVED",
            Self::Sent => "SENT",
            Self::Processing => "PROCESSING",
            Self::Processed => "PROCESSED",
            Self::Failed => "FAILED",
        }
    }

    /// Statuses reachable from `self` in one step.
    ///
    /// # Examples
    /// ```
    /// use backend::domain::VoteStatus;
    ///
    /// assert!(VoteStatus::Processed.allowed_transitions().is_empty());
    /// ```
    pub fn allowed_transitions(self) -> &'static [Self] {
        TRANSITIONS
            .iter()
            .find(|(from, _)| *from == self)
            .map_or(&[], |(_, targets)| *targets)
    }

    /// Whether moving from `self` to `target` is a legal transition.
    ///
    /// # Examples
    /// ```
    /// use backend::domain::VoteStatus;
    ///
    /// assert!(VoteStatus::Failed.can_transition_to(VoteStatus::Processing));
    /// assert!(!VoteStatus::Received.can_transition_to(VoteStatus::Processed));
    /// ```
    pub fn can_transition_to(self, target: Self) -> bool {
        self.allowed_transitions().contains(&target)
    }

    /// Parse a status from its storage form.
    ///
    /// # Errors
    ///
    /// Returns [`VoteValidationError::InvalidStatus`] for any value outside
    /// the closed set.
    pub fn validate(value: &str) -> Result<Self, VoteValidationError> {
        value.parse()
    }

    /// Parse a status that is known to be valid, panicking otherwise.
    ///
    /// Only for literals and fixtures; never call this on data read from
    /// the queue or the store.
    ///
    /// # Panics
    ///
    /// Panics when `value` is not one of the five status names.
    pub fn must_parse(value: &str) -> Self {
        match value.parse() {
            Ok(status) => status,
            Err(err) => panic!("vote status literal must be valid: {err}"),
        }
    }
}

impl fmt::Display for VoteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VoteStatus {
    type Err = VoteValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "RECEIVED" => Ok(Self::Received),
            "SENT" => Ok(Self::Sent),
            "PROCESSING" => Ok(Self::Processing),
            "PROCESSED" => Ok(Self::Processed),
            "FAILED" => Ok(Self::Failed),
            other => Err(VoteValidationError::InvalidStatus {
                value: other.to_owned(),
            }),
        }
    }
}
