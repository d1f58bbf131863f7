//! Wire payload published by vote producers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Vote, VoteDraft, VoteId, VoteStatus};

/// Reasons a decoded payload cannot become a vote.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VoteMessageError {
    #[error("participant id must be positive (got {participant_id})")]
    NonPositiveParticipantId { participant_id: i64 },
    #[error("session id is required")]
    EmptySessionId,
    #[error("timestamp is required")]
    MissingTimestamp,
    #[error("vote id is not a UUID: {value}")]
    InvalidId { value: String },
    #[error("producers may only tag votes RECEIVED or SENT (got {status})")]
    UnsupportedStatus { status: VoteStatus },
}

/// JSON body of a queue message.
///
/// ```json
/// {"id": "…", "participanteId": 3, "sessionId": "bbb-2026", "timestamp": "2026-03-14T18:45:00Z"}
/// ```
///
/// `id` and `status` are optional; a missing or empty id is replaced by a
/// fresh UUID on conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "participanteId", default)]
    pub participant_id: i64,
    #[serde(rename = "sessionId", default)]
    pub session_id: String,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<VoteStatus>,
}

impl VoteMessage {
    /// Decode a raw queue payload.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error for malformed payloads.
    pub fn from_slice(payload: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(payload)
    }

    /// Check the producer-supplied fields.
    ///
    /// # Errors
    ///
    /// Returns the first failing rule.
    pub fn validate(&self) -> Result<(), VoteMessageError> {
        if self.participant_id <= 0 {
            return Err(VoteMessageError::NonPositiveParticipantId {
                participant_id: self.participant_id,
            });
        }
        if self.session_id.is_empty() {
            return Err(VoteMessageError::EmptySessionId);
        }
        let has_timestamp = self
            .timestamp
            .is_some_and(|at| at.timestamp() != 0 || at.timestamp_subsec_nanos() != 0);
        if !has_timestamp {
            return Err(VoteMessageError::MissingTimestamp);
        }
        match self.status {
            None | Some(VoteStatus::Received | VoteStatus::Sent) => Ok(()),
            Some(status) => Err(VoteMessageError::UnsupportedStatus { status }),
        }
    }

    /// Convert into a vote entity, generating an id when none was sent.
    ///
    /// # Errors
    ///
    /// Fails validation as [`VoteMessage::validate`] does, or when `id` is
    /// present but not a UUID.
    pub fn into_vote(self) -> Result<Vote, VoteMessageError> {
        self.validate()?;
        let id = match self.id.as_deref().map(str::trim) {
            None | Some("") => VoteId::random(),
            Some(raw) => raw.parse().map_err(|_| VoteMessageError::InvalidId {
                value: raw.to_owned(),
            })?,
        };
        let timestamp = self.timestamp.ok_or(VoteMessageError::MissingTimestamp)?;
        Ok(Vote::from_draft(VoteDraft {
            id,
            participant_id: self.participant_id,
            session_id: self.session_id,
            timestamp,
            status: self.status.unwrap_or(VoteStatus::Received),
            processed_at: None,
            processing_error: None,
        }))
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use rstest::rstest;

    use super::*;

    const PAYLOAD: &str = r#"{
        "id": "6f1c1d5e-8e53-4f4e-9c55-2b8f0f0b9a11",
        "participanteId": 3,
        "sessionId": "paredao-12",
        "timestamp": "2026-03-14T18:45:00Z"
    }"#;

    #[rstest]
    fn decodes_producer_field_names() {
        let message = VoteMessage::from_slice(PAYLOAD.as_bytes()).expect("valid payload");
        assert_eq!(message.participant_id, 3);
        assert_eq!(message.session_id, "paredao-12");
        assert!(message.timestamp.is_some());
    }

    #[rstest]
    fn converts_with_supplied_id() {
        let vote = VoteMessage::from_slice(PAYLOAD.as_bytes())
            .expect("valid payload")
            .into_vote()
            .expect("valid message");

        assert_eq!(vote.id().to_string(), "6f1c1d5e-8e53-4f4e-9c55-2b8f0f0b9a11");
        assert_eq!(vote.status(), VoteStatus::Received);
        assert!(vote.is_valid());
    }

    #[rstest]
    #[case(r#"{"participanteId": 1, "sessionId": "s", "timestamp": "2026-03-14T18:45:00Z"}"#)]
    #[case(r#"{"id": "", "participanteId": 1, "sessionId": "s", "timestamp": "2026-03-14T18:45:00Z"}"#)]
    fn generates_id_when_absent(#[case] payload: &str) {
        let vote = VoteMessage::from_slice(payload.as_bytes())
            .expect("valid payload")
            .into_vote()
            .expect("valid message");
        assert!(!vote.id().is_nil());
    }

    #[rstest]
    fn keeps_sent_tag() {
        let payload = r#"{"participanteId": 1, "sessionId": "s", "timestamp": "2026-03-14T18:45:00Z", "status": "SENT"}"#;
        let vote = VoteMessage::from_slice(payload.as_bytes())
            .expect("valid payload")
            .into_vote()
            .expect("valid message");
        assert_eq!(vote.status(), VoteStatus::Sent);
    }

    #[rstest]
    #[case(r#"{"sessionId": "s", "timestamp": "2026-03-14T18:45:00Z"}"#, VoteMessageError::NonPositiveParticipantId { participant_id: 0 })]
    #[case(r#"{"participanteId": 2, "timestamp": "2026-03-14T18:45:00Z"}"#, VoteMessageError::EmptySessionId)]
    #[case(r#"{"participanteId": 2, "sessionId": "s"}"#, VoteMessageError::MissingTimestamp)]
    #[case(r#"{"participanteId": 2, "sessionId": "s", "timestamp": "1970-01-01T00:00:00Z"}"#, VoteMessageError::MissingTimestamp)]
    #[case(r#"{"participanteId": 2, "sessionId": "s", "timestamp": "2026-03-14T18:45:00Z", "status": "PROCESSED"}"#, VoteMessageError::UnsupportedStatus { status: VoteStatus::Processed })]
    fn rejects_invalid_messages(#[case] payload: &str, #[case] expected: VoteMessageError) {
        let message = VoteMessage::from_slice(payload.as_bytes()).expect("decodable payload");
        assert_eq!(message.into_vote(), Err(expected));
    }

    #[rstest]
    fn rejects_malformed_id() {
        let payload = r#"{"id": "not-a-uuid", "participanteId": 1, "sessionId": "s", "timestamp": "2026-03-14T18:45:00Z"}"#;
        let err = VoteMessage::from_slice(payload.as_bytes())
            .expect("decodable payload")
            .into_vote()
            .expect_err("bad id");
        assert_eq!(
            err,
            VoteMessageError::InvalidId {
                value: "not-a-uuid".to_owned()
            }
        );
    }

    #[rstest]
    fn malformed_json_is_a_decode_error() {
        assert!(VoteMessage::from_slice(b"{\"participanteId\": \"x\"").is_err());
    }
}
