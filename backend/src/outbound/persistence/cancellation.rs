//! Cancellation of in-flight store operations.
//!
//! Dropping a diesel-async transaction future leaves the connection with an
//! open transaction. The bb8 manager reports such connections as broken, so
//! the pool discards them and PostgreSQL rolls the transaction back when the
//! socket closes.
//!
//! A finished operation always wins over a token that fired during the same
//! poll, so a commit the driver has already reported is never turned into a
//! cancellation. One window remains: if the token fires after PostgreSQL
//! commits but before the acknowledgement is read, the caller sees
//! `Cancelled` for rows that were stored. Replaying such a batch is safe
//! because every write is an upsert.

use std::future::Future;

use tokio_util::sync::CancellationToken;

/// Drive `operation` until it completes or `cancel` fires.
///
/// An already-cancelled token never starts the operation. Once started, a
/// completed result takes precedence over cancellation.
pub(crate) async fn run_cancellable<T, E, F>(
    cancel: &CancellationToken,
    on_cancel: impl FnOnce() -> E,
    operation: F,
) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
{
    if cancel.is_cancelled() {
        return Err(on_cancel());
    }
    tokio::select! {
        biased;
        result = operation => result,
        () = cancel.cancelled() => Err(on_cancel()),
    }
}
