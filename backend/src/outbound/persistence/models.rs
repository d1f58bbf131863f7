//! Internal Diesel row structs for database operations.
//!
//! These types never leave the persistence layer.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::{Vote, VoteDraft, VoteId, VoteStatus, VoteValidationError};

use super::schema::{schema_migrations, votes};

/// Row struct for reading from the votes table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = votes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct VoteRow {
    pub id: Uuid,
    pub participant_id: i64,
    pub session_id: String,
    pub timestamp: DateTime<Utc>,
    pub status: String,
    pub processed_at: Option<DateTime<Utc>>,
    pub processing_error: Option<String>,
    #[expect(dead_code, reason = "selected for completeness; not part of the entity")]
    pub created_at: DateTime<Utc>,
    #[expect(dead_code, reason = "selected for completeness; not part of the entity")]
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<VoteRow> for Vote {
    type Error = VoteValidationError;

    fn try_from(row: VoteRow) -> Result<Self, Self::Error> {
        let status = VoteStatus::validate(&row.status)?;
        Ok(Vote::from_draft(VoteDraft {
            id: VoteId::from_uuid(row.id),
            participant_id: row.participant_id,
            session_id: row.session_id,
            timestamp: row.timestamp,
            status,
            processed_at: row.processed_at,
            processing_error: row.processing_error,
        }))
    }
}

/// Insertable struct for upserting votes.
///
/// `created_at` and `updated_at` take their column defaults on insert.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = votes)]
pub(crate) struct NewVoteRow<'a> {
    pub id: Uuid,
    pub participant_id: i64,
    pub session_id: &'a str,
    pub timestamp: DateTime<Utc>,
    pub status: &'a str,
    pub processed_at: Option<DateTime<Utc>>,
    pub processing_error: Option<&'a str>,
}

impl<'a> From<&'a Vote> for NewVoteRow<'a> {
    fn from(vote: &'a Vote) -> Self {
        Self {
            id: *vote.id().as_uuid(),
            participant_id: vote.participant_id(),
            session_id: vote.session_id(),
            timestamp: vote.timestamp(),
            status: vote.status().as_str(),
            processed_at: vote.processed_at(),
            processing_error: vote.processing_error(),
        }
    }
}

/// Insertable ledger record; `executed_at` takes the column default.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema_migrations)]
pub(crate) struct NewSchemaMigrationRow<'a> {
    pub version: &'a str,
    pub name: &'a str,
}
