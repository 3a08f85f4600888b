//! Background sweeper: periodically removes items whose creation time has
//! fallen outside the queue's TTL window.
//!
//! Modeled on `MessageBuffer::start()`'s tick-and-log-on-error shape: a
//! `tokio::time::interval` loop that never returns, cooperatively
//! cancelled via a [`CancellationToken`].

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::engine::{EngineError, QueueDescriptor};
use crate::store::{QueueStore, WriteOp};

fn now_unix() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before epoch")
        .as_secs() as i64
}

/// Runs one sweep: finds ids whose creation score is older than `ttl` and
/// deletes them from all three collections in a single pipeline.
///
/// Not watched: a racing `Enqueue` of an id between the scan and the
/// delete would be vanishingly rare (the id was already past TTL) and is
/// acceptable to re-add with a fresh creation time.
pub async fn sweep<S: QueueStore>(
    store: &S,
    descriptor: &QueueDescriptor,
) -> Result<usize, EngineError> {
    let cutoff = now_unix() - descriptor.ttl.as_secs() as i64;
    let expired = store
        .zrange_by_score(&descriptor.ct_key(), 1, cutoff)
        .await?;

    if expired.is_empty() {
        return Ok(0);
    }

    let ops = vec![
        WriteOp::ZRem {
            key: descriptor.ct_key(),
            members: expired.clone(),
        },
        WriteOp::ZRem {
            key: descriptor.ld_key(),
            members: expired.clone(),
        },
        WriteOp::HDel {
            key: descriptor.data_key(),
            fields: expired.clone(),
        },
    ];
    store.pipelined_write(&ops).await?;
    Ok(expired.len())
}

/// Handle to a spawned cleaner task. Bundles the cancellation token that
/// stops the loop with the join handle that observes it finishing, so a
/// caller can stop the cleaner deterministically with one call instead of
/// juggling both separately.
pub struct CleanerHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl CleanerHandle {
    /// Fires the cancellation token and waits for the in-flight tick (if
    /// any) to finish before returning.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        let _ = self.task.await;
    }
}

/// Spawns the periodic sweeper. The returned handle's `shutdown()` fires
/// `cancel` and joins the task; `cancel` may also be observed/cancelled
/// independently by other components sharing the same token.
pub fn spawn<S: QueueStore>(
    store: Arc<S>,
    descriptor: QueueDescriptor,
    clean_period: Duration,
    cancel: CancellationToken,
) -> CleanerHandle {
    let task = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            let mut interval = tokio::time::interval(clean_period);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => return,
                    _ = interval.tick() => {
                        match sweep(store.as_ref(), &descriptor).await {
                            Ok(n) if n > 0 => {
                                tracing::debug!(queue = %descriptor.name, swept = n, "cleaner removed expired items");
                            }
                            Ok(_) => {}
                            Err(err) => {
                                tracing::error!(queue = %descriptor.name, error = %err, "cleaner tick failed");
                            }
                        }
                    }
                }
            }
        }
    });

    CleanerHandle { cancel, task }
}
