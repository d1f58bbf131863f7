//! Entry point a broker consumer calls with a batch of raw payloads.

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::domain::ports::VoteRepository;
use crate::domain::{BatchOutcome, VoteBatchProcessor, VoteProcessingError};

use super::VoteMessage;

/// Counts for one handled batch of payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HandleReport {
    /// Payloads that were not valid JSON for a [`VoteMessage`].
    pub malformed: usize,
    /// Decoded payloads that failed message validation.
    pub rejected: usize,
    /// Result of processing the converted votes.
    pub outcome: BatchOutcome,
}

/// Decodes raw payloads and hands the resulting votes to the processor.
#[derive(Clone)]
pub struct VoteMessageHandler<R> {
    processor: VoteBatchProcessor<R>,
}

impl<R> VoteMessageHandler<R>
where
    R: VoteRepository,
{
    /// Create a handler over `processor`.
    pub fn new(processor: VoteBatchProcessor<R>) -> Self {
        Self { processor }
    }

    /// The wrapped processor.
    pub fn processor(&self) -> &VoteBatchProcessor<R> {
        &self.processor
    }

    /// Decode `payloads` and process every vote they yield.
    ///
    /// Malformed or rejected payloads are skipped and counted. A batch with
    /// nothing decodable is a trivial success.
    ///
    /// # Errors
    ///
    /// Propagates [`VoteProcessingError`] from the processor.
    pub async fn handle<P>(
        &self,
        payloads: &[P],
        cancel: &CancellationToken,
    ) -> Result<HandleReport, VoteProcessingError>
    where
        P: AsRef<[u8]>,
    {
        let mut report = HandleReport::default();
        let mut votes = Vec::with_capacity(payloads.len());

        for (index, payload) in payloads.iter().enumerate() {
            let message = match VoteMessage::from_slice(payload.as_ref()) {
                Ok(message) => message,
                Err(error) => {
                    debug!(index, %error, "dropping malformed vote payload");
                    report.malformed += 1;
                    continue;
                }
            };
            match message.into_vote() {
                Ok(vote) => votes.push(vote),
                Err(error) => {
                    debug!(index, %error, "dropping invalid vote message");
                    report.rejected += 1;
                }
            }
        }

        report.outcome = self.processor.process_batch(&mut votes, cancel).await?;
        info!(
            payloads = payloads.len(),
            malformed = report.malformed,
            rejected = report.rejected,
            persisted = report.outcome.persisted,
            skipped = report.outcome.skipped,
            "handled vote payloads"
        );
        Ok(report)
    }
}
