//! PostgreSQL-backed vote repository.
//!
//! Both write paths issue a single `INSERT .. ON CONFLICT (id) DO UPDATE`
//! inside a transaction. The conflict branch overwrites every mutable column
//! and bumps `updated_at`; `created_at` keeps its original value.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::domain::ports::{VoteRepository, VoteRepositoryError, ensure_votes_valid};
use crate::domain::{Vote, VoteId};

use super::cancellation::run_cancellable;
use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::{NewVoteRow, VoteRow};
use super::pool::{DbPool, PoolError};
use super::schema::votes;

/// Diesel-backed implementation of the [`VoteRepository`] port.
#[derive(Clone)]
pub struct DieselVoteRepository {
    pool: DbPool,
}

impl DieselVoteRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn upsert(&self, rows: Vec<NewVoteRow<'_>>) -> Result<(), VoteRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let expected = rows.len();
        let written = conn
            .transaction(|conn| async move { upsert_rows(conn, &rows).await }.scope_boxed())
            .await
            .map_err(map_diesel_error)?;
        debug!(expected, written, "upserted votes");
        Ok(())
    }
}

fn map_pool_error(error: PoolError) -> VoteRepositoryError {
    map_basic_pool_error(error, |message| VoteRepositoryError::connection(message))
}

fn map_diesel_error(error: diesel::result::Error) -> VoteRepositoryError {
    map_basic_diesel_error(
        error,
        VoteRepositoryError::query,
        VoteRepositoryError::connection,
    )
}

async fn upsert_rows(
    conn: &mut AsyncPgConnection,
    rows: &[NewVoteRow<'_>],
) -> Result<usize, diesel::result::Error> {
    diesel::insert_into(votes::table)
        .values(rows)
        .on_conflict(votes::id)
        .do_update()
        .set((
            votes::participant_id.eq(excluded(votes::participant_id)),
            votes::session_id.eq(excluded(votes::session_id)),
            votes::timestamp.eq(excluded(votes::timestamp)),
            votes::status.eq(excluded(votes::status)),
            votes::processed_at.eq(excluded(votes::processed_at)),
            votes::processing_error.eq(excluded(votes::processing_error)),
            votes::updated_at.eq(diesel::dsl::now),
        ))
        .execute(conn)
        .await
}

#[async_trait]
impl VoteRepository for DieselVoteRepository {
    async fn save(
        &self,
        vote: &Vote,
        cancel: &CancellationToken,
    ) -> Result<(), VoteRepositoryError> {
        ensure_votes_valid(std::slice::from_ref(vote))?;
        run_cancellable(
            cancel,
            VoteRepositoryError::cancelled,
            self.upsert(vec![NewVoteRow::from(vote)]),
        )
        .await
    }

    async fn bulk_save(
        &self,
        votes: &[Vote],
        cancel: &CancellationToken,
    ) -> Result<(), VoteRepositoryError> {
        if votes.is_empty() {
            return Ok(());
        }
        ensure_votes_valid(votes)?;
        let rows = votes.iter().map(NewVoteRow::from).collect();
        run_cancellable(cancel, VoteRepositoryError::cancelled, self.upsert(rows)).await
    }

    async fn find_by_id(
        &self,
        id: &VoteId,
        cancel: &CancellationToken,
    ) -> Result<Option<Vote>, VoteRepositoryError> {
        let lookup = async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            let row = votes::table
                .find(*id.as_uuid())
                .select(VoteRow::as_select())
                .first::<VoteRow>(&mut conn)
                .await
                .optional()
                .map_err(map_diesel_error)?;
            row.map(Vote::try_from)
                .transpose()
                .map_err(|err| VoteRepositoryError::query(format!("stored vote {id}: {err}")))
        };
        run_cancellable(cancel, VoteRepositoryError::cancelled, lookup).await
    }
}
