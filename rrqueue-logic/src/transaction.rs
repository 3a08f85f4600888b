//! Optimistic-transaction retry loop: runs a closure against a watched
//! snapshot, retrying on conflict until it commits, `max_retries` is
//! exhausted, or cancellation fires.

use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::engine::EngineError;
use crate::store::{QueueStore, TxOutcome, WatchSession, WriteOp};

/// What a transaction body decided to do with its snapshot read.
pub enum TxAction<T> {
    /// No watched key needs to change; the session is released untouched.
    Done(T),
    /// Attempt to commit `ops`; on conflict, the whole body re-runs.
    Commit(T, Vec<WriteOp>),
}

/// Run `body` against a watch session opened over `keys`, retrying on
/// `Conflict` until it commits. The loop carries no sleep/backoff of its
/// own: the store's serialization provides the pacing.
pub async fn run_watched<S, T, F, Fut>(
    store: &S,
    keys: &[String],
    cancel: &CancellationToken,
    max_retries: Option<u32>,
    mut body: F,
) -> Result<T, EngineError>
where
    S: QueueStore,
    F: FnMut(&mut S::Watch) -> Fut,
    Fut: Future<Output = Result<TxAction<T>, EngineError>>,
{
    let mut attempts: u32 = 0;

    loop {
        if cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }

        let mut watch = store.begin_watch(keys).await?;

        let action = match body(&mut watch).await {
            Ok(action) => action,
            Err(err) => return Err(err),
        };

        match action {
            TxAction::Done(value) => {
                watch.cancel().await?;
                return Ok(value);
            }
            TxAction::Commit(value, ops) => match watch.commit(ops).await? {
                TxOutcome::Committed(()) => return Ok(value),
                TxOutcome::Conflict => {
                    attempts += 1;
                    if let Some(max) = max_retries {
                        if attempts > max {
                            return Err(EngineError::RetryExhausted);
                        }
                    }
                    continue;
                }
            },
        }
    }
}
