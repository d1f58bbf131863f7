//! The vote entity and its guarded transition operations.

use std::fmt;

use chrono::{DateTime, Utc};
use mockable::Clock;

use super::{VoteId, VoteStatus, VoteTransitionError, VoteValidationError};

/// Input payload for [`Vote::from_draft`].
#[derive(Debug, Clone)]
pub struct VoteDraft {
    pub id: VoteId,
    pub participant_id: i64,
    pub session_id: String,
    pub timestamp: DateTime<Utc>,
    pub status: VoteStatus,
    pub processed_at: Option<DateTime<Utc>>,
    pub processing_error: Option<String>,
}

/// A participant's vote moving through the processing lifecycle.
///
/// Construction does not validate: payloads are admitted as received and the
/// batch pipeline decides what to do with malformed ones. Call
/// [`Vote::validate`] before persisting.
///
/// # Examples
///
/// ```
/// use backend::domain::{Vote, VoteStatus};
/// use mockable::DefaultClock;
///
/// let mut vote = Vote::new(42, "session-1", &DefaultClock);
/// vote.mark_as_processing().expect("received votes can be processed");
/// vote.mark_as_processed(&DefaultClock).expect("processing votes can finish");
/// assert_eq!(vote.status(), VoteStatus::Processed);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Vote {
    pub(super) id: VoteId,
    pub(super) participant_id: i64,
    pub(super) session_id: String,
    pub(super) timestamp: DateTime<Utc>,
    pub(super) status: VoteStatus,
    pub(super) processed_at: Option<DateTime<Utc>>,
    pub(super) processing_error: Option<String>,
}

fn is_zero_instant(instant: DateTime<Utc>) -> bool {
    instant.timestamp() == 0 && instant.timestamp_subsec_nanos() == 0
}

impl Vote {
    /// Create a freshly received vote with a new id, stamped now.
    pub fn new(participant_id: i64, session_id: impl Into<String>, clock: &dyn Clock) -> Self {
        Self {
            id: VoteId::random(),
            participant_id,
            session_id: session_id.into(),
            timestamp: clock.utc(),
            status: VoteStatus::Received,
            processed_at: None,
            processing_error: None,
        }
    }

    /// Rebuild a vote from explicit parts (decoded payloads, stored rows).
    pub fn from_draft(draft: VoteDraft) -> Self {
        let VoteDraft {
            id,
            participant_id,
            session_id,
            timestamp,
            status,
            processed_at,
            processing_error,
        } = draft;
        Self {
            id,
            participant_id,
            session_id,
            timestamp,
            status,
            processed_at,
            processing_error,
        }
    }

    /// Returns the vote id.
    pub fn id(&self) -> VoteId {
        self.id
    }

    /// Returns the participant the vote was cast for.
    pub fn participant_id(&self) -> i64 {
        self.participant_id
    }

    /// Returns the voting session id.
    pub fn session_id(&self) -> &str {
        self.session_id.as_str()
    }

    /// Returns the event timestamp.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Returns the current lifecycle status.
    pub fn status(&self) -> VoteStatus {
        self.status
    }

    /// Returns when the vote reached `PROCESSED`, if it has.
    pub fn processed_at(&self) -> Option<DateTime<Utc>> {
        self.processed_at
    }

    /// Returns the last recorded processing error.
    pub fn processing_error(&self) -> Option<&str> {
        self.processing_error.as_deref()
    }

    /// Check every field required for a vote to be persisted.
    ///
    /// # Errors
    ///
    /// Returns the first failing rule: id, participant id, session id,
    /// timestamp.
    pub fn validate(&self) -> Result<(), VoteValidationError> {
        if self.id.is_nil() {
            return Err(VoteValidationError::MissingId);
        }
        if self.participant_id <= 0 {
            return Err(VoteValidationError::NonPositiveParticipantId {
                participant_id: self.participant_id,
            });
        }
        if self.session_id.is_empty() {
            return Err(VoteValidationError::EmptySessionId);
        }
        if is_zero_instant(self.timestamp) {
            return Err(VoteValidationError::MissingTimestamp);
        }
        VoteStatus::validate(self.status.as_str()).map(|_| ())
    }

    /// Whether [`Vote::validate`] succeeds.
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Whether the vote may enter the pipeline.
    ///
    /// Narrower than the transition graph: a `FAILED` vote may move to
    /// `PROCESSING` but is not re-admitted by a fresh batch.
    pub fn can_be_processed(&self) -> bool {
        matches!(self.status, VoteStatus::Received | VoteStatus::Sent)
    }

    /// Whether processing has finished, successfully or not.
    pub fn is_processed(&self) -> bool {
        matches!(self.status, VoteStatus::Processed | VoteStatus::Failed)
    }

    /// Whether a non-empty processing error is recorded.
    pub fn has_error(&self) -> bool {
        self.processing_error
            .as_deref()
            .is_some_and(|message| !message.is_empty())
    }

    fn check_transition(&self, target: VoteStatus) -> Result<(), VoteTransitionError> {
        if self.status.can_transition_to(target) {
            Ok(())
        } else {
            Err(VoteTransitionError {
                from: self.status,
                to: target,
            })
        }
    }

    /// Move to `status` if the transition graph allows it.
    ///
    /// # Errors
    ///
    /// Returns [`VoteTransitionError`] and leaves the vote unchanged when the
    /// move is illegal.
    pub fn set_status(&mut self, status: VoteStatus) -> Result<(), VoteTransitionError> {
        self.check_transition(status)?;
        self.status = status;
        Ok(())
    }

    /// Admit the vote into processing.
    ///
    /// # Errors
    ///
    /// Fails unless the vote is `RECEIVED`, `SENT` or `FAILED`.
    pub fn mark_as_processing(&mut self) -> Result<(), VoteTransitionError> {
        self.set_status(VoteStatus::Processing)
    }

    /// Record successful persistence, stamping `processed_at` and clearing
    /// any earlier error.
    ///
    /// # Errors
    ///
    /// Fails unless the vote is `PROCESSING`.
    pub fn mark_as_processed(&mut self, clock: &dyn Clock) -> Result<(), VoteTransitionError> {
        self.check_transition(VoteStatus::Processed)?;
        self.status = VoteStatus::Processed;
        self.processed_at = Some(clock.utc());
        self.processing_error = None;
        Ok(())
    }

    /// Record a failure without an error message.
    ///
    /// # Errors
    ///
    /// Fails unless the vote is `PROCESSING`.
    pub fn mark_as_failed(&mut self) -> Result<(), VoteTransitionError> {
        self.set_status(VoteStatus::Failed)
    }

    /// Record a failure with its cause. `processed_at` is left as is.
    ///
    /// # Errors
    ///
    /// Fails unless the vote is `PROCESSING`.
    pub fn mark_as_failed_with_error(
        &mut self,
        error: &dyn fmt::Display,
    ) -> Result<(), VoteTransitionError> {
        self.check_transition(VoteStatus::Failed)?;
        self.status = VoteStatus::Failed;
        self.processing_error = Some(error.to_string());
        Ok(())
    }
}

impl fmt::Display for Vote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Vote[ID={}, ParticipantID={}, SessionID={}, Status={}]",
            self.id, self.participant_id, self.session_id, self.status
        )
    }
}
