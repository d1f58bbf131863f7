//! Shared fixtures for domain unit tests.

use std::sync::Arc;

use chrono::{DateTime, Local, TimeZone, Utc};
use mockable::Clock;

use super::{Vote, VoteDraft, VoteId, VoteStatus};

pub(crate) fn fixture_timestamp() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, 18, 45, 0)
        .single()
        .expect("valid fixture timestamp")
}

pub(crate) struct FixtureClock {
    pub(crate) utc_now: DateTime<Utc>,
}

impl Clock for FixtureClock {
    fn local(&self) -> DateTime<Local> {
        self.utc_now.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.utc_now
    }
}

pub(crate) fn fixture_clock() -> Arc<dyn Clock> {
    Arc::new(FixtureClock {
        utc_now: fixture_timestamp(),
    })
}

pub(crate) fn vote_draft(participant_id: i64, session_id: &str) -> VoteDraft {
    VoteDraft {
        id: VoteId::random(),
        participant_id,
        session_id: session_id.to_owned(),
        timestamp: fixture_timestamp() - chrono::Duration::minutes(5),
        status: VoteStatus::Received,
        processed_at: None,
        processing_error: None,
    }
}

pub(crate) fn received_vote(participant_id: i64) -> Vote {
    Vote::from_draft(vote_draft(participant_id, "session-1"))
}

pub(crate) fn vote_with_status(status: VoteStatus) -> Vote {
    Vote::from_draft(VoteDraft {
        status,
        ..vote_draft(7, "session-1")
    })
}
