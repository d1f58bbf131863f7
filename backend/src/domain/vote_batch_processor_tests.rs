//! Tests for the vote batch processor.

use std::sync::Arc;

use rstest::{fixture, rstest};
use tokio_util::sync::CancellationToken;

use super::*;
use crate::domain::VoteStatus;
use crate::domain::ports::MockVoteRepository;
use crate::domain::test_fixtures::{
    fixture_clock, fixture_timestamp, received_vote, vote_with_status,
};

fn make_processor(repo: MockVoteRepository) -> VoteBatchProcessor<MockVoteRepository> {
    VoteBatchProcessor::new(Arc::new(repo), fixture_clock())
}

#[fixture]
fn cancel() -> CancellationToken {
    CancellationToken::new()
}

#[rstest]
#[tokio::test]
async fn empty_batch_is_trivial_success(cancel: CancellationToken) {
    let mut repo = MockVoteRepository::new();
    repo.expect_bulk_save().times(0);

    let outcome = make_processor(repo)
        .process_batch(&mut [], &cancel)
        .await
        .expect("empty batch succeeds");

    assert_eq!(outcome, BatchOutcome::default());
}

#[rstest]
#[tokio::test]
async fn invalid_vote_is_skipped_and_rest_persisted(cancel: CancellationToken) {
    let mut votes = vec![received_vote(1), received_vote(0), received_vote(3)];
    let expected_ids = vec![votes[0].id(), votes[2].id()];

    let mut repo = MockVoteRepository::new();
    repo.expect_bulk_save()
        .withf(move |batch, _| {
            batch.iter().map(Vote::id).collect::<Vec<_>>() == expected_ids
                && batch.iter().all(|vote| vote.status() == VoteStatus::Processing)
        })
        .times(1)
        .returning(|_, _| Ok(()));

    let outcome = make_processor(repo)
        .process_batch(&mut votes, &cancel)
        .await
        .expect("partial batch succeeds");

    assert_eq!(
        outcome,
        BatchOutcome {
            persisted: 2,
            skipped: 1
        }
    );
    assert_eq!(votes[0].status(), VoteStatus::Processed);
    assert_eq!(votes[0].processed_at(), Some(fixture_timestamp()));
    assert_eq!(votes[1].status(), VoteStatus::Received);
    assert_eq!(votes[2].status(), VoteStatus::Processed);
}

#[rstest]
#[tokio::test]
async fn persistence_failure_marks_every_attempt_failed(cancel: CancellationToken) {
    let mut votes = vec![received_vote(1), received_vote(2)];

    let mut repo = MockVoteRepository::new();
    repo.expect_bulk_save()
        .times(1)
        .returning(|_, _| Err(VoteRepositoryError::query("deadlock detected")));

    let err = make_processor(repo)
        .process_batch(&mut votes, &cancel)
        .await
        .expect_err("store failure propagates");

    assert!(matches!(
        err,
        VoteProcessingError::PersistenceFailed {
            attempted: 2,
            source: VoteRepositoryError::Query { .. },
        }
    ));
    for vote in &votes {
        assert_eq!(vote.status(), VoteStatus::Failed);
        assert!(
            vote.processing_error()
                .is_some_and(|message| message.contains("deadlock detected"))
        );
        assert_eq!(vote.processed_at(), None);
    }
}

#[rstest]
#[tokio::test]
async fn all_invalid_batch_reports_no_valid_entries(cancel: CancellationToken) {
    let mut votes = vec![
        received_vote(0),
        vote_with_status(VoteStatus::Processed),
        vote_with_status(VoteStatus::Failed),
    ];

    let mut repo = MockVoteRepository::new();
    repo.expect_bulk_save().times(0);

    let err = make_processor(repo)
        .process_batch(&mut votes, &cancel)
        .await
        .expect_err("nothing admitted");

    assert!(matches!(
        err,
        VoteProcessingError::NoValidEntries { batch_size: 3 }
    ));
    assert_eq!(votes[1].status(), VoteStatus::Processed);
    assert_eq!(votes[2].status(), VoteStatus::Failed);
}

#[rstest]
#[tokio::test]
async fn cancelled_write_fails_attempted_votes(cancel: CancellationToken) {
    let mut votes = vec![received_vote(4)];
    cancel.cancel();

    let mut repo = MockVoteRepository::new();
    repo.expect_bulk_save()
        .withf(|_, token| token.is_cancelled())
        .times(1)
        .returning(|_, _| Err(VoteRepositoryError::cancelled()));

    let err = make_processor(repo)
        .process_batch(&mut votes, &cancel)
        .await
        .expect_err("cancellation propagates");

    assert!(matches!(err, VoteProcessingError::Cancelled));
    assert_eq!(votes[0].status(), VoteStatus::Failed);
}

#[rstest]
#[tokio::test]
async fn oversized_batch_is_still_processed(cancel: CancellationToken) {
    let mut votes = vec![received_vote(1), received_vote(2), received_vote(3)];

    let mut repo = MockVoteRepository::new();
    repo.expect_bulk_save()
        .times(1)
        .returning(|_, _| Ok(()));

    let processor = make_processor(repo).with_batch_size(2);
    assert_eq!(processor.batch_size(), 2);

    let outcome = processor
        .process_batch(&mut votes, &cancel)
        .await
        .expect("oversized batch succeeds");
    assert_eq!(outcome.persisted, 3);
}

#[rstest]
fn zero_batch_size_keeps_default() {
    let processor = make_processor(MockVoteRepository::new()).with_batch_size(0);
    assert_eq!(processor.batch_size(), DEFAULT_BATCH_SIZE);
}

#[rstest]
#[tokio::test]
async fn single_vote_is_persisted_and_processed(cancel: CancellationToken) {
    let mut vote = vote_with_status(VoteStatus::Sent);

    let mut repo = MockVoteRepository::new();
    repo.expect_save()
        .withf(|vote, _| vote.status() == VoteStatus::Processing)
        .times(1)
        .returning(|_, _| Ok(()));

    make_processor(repo)
        .process_single(&mut vote, &cancel)
        .await
        .expect("single vote succeeds");

    assert_eq!(vote.status(), VoteStatus::Processed);
    assert_eq!(vote.processed_at(), Some(fixture_timestamp()));
}

#[rstest]
#[tokio::test]
async fn single_vote_failure_records_error(cancel: CancellationToken) {
    let mut vote = received_vote(9);
    let expected_id = vote.id();

    let mut repo = MockVoteRepository::new();
    repo.expect_save()
        .times(1)
        .returning(|_, _| Err(VoteRepositoryError::connection("pool exhausted")));

    let err = make_processor(repo)
        .process_single(&mut vote, &cancel)
        .await
        .expect_err("store failure propagates");

    assert!(matches!(
        err,
        VoteProcessingError::SaveFailed { vote_id, .. } if vote_id == expected_id
    ));
    assert!(err.to_string().contains(&expected_id.to_string()));
    assert_eq!(vote.status(), VoteStatus::Failed);
    assert!(vote.has_error());
}

#[rstest]
#[tokio::test]
async fn single_invalid_vote_never_reaches_store(cancel: CancellationToken) {
    let mut vote = received_vote(0);

    let mut repo = MockVoteRepository::new();
    repo.expect_save().times(0);

    let err = make_processor(repo)
        .process_single(&mut vote, &cancel)
        .await
        .expect_err("validation fails");

    assert!(matches!(
        err,
        VoteProcessingError::InvalidVote(VoteValidationError::NonPositiveParticipantId { .. })
    ));
    assert_eq!(vote.status(), VoteStatus::Received);
}

#[rstest]
#[tokio::test]
async fn single_processed_vote_is_rejected(cancel: CancellationToken) {
    let mut vote = vote_with_status(VoteStatus::Processed);

    let mut repo = MockVoteRepository::new();
    repo.expect_save().times(0);

    let err = make_processor(repo)
        .process_single(&mut vote, &cancel)
        .await
        .expect_err("terminal vote rejected");

    assert!(matches!(err, VoteProcessingError::Transition(_)));
}
