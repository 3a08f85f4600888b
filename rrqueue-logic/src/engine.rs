//! The queue engine: the five queue operations implemented on top of a
//! [`QueueStore`], each namespace materialized as three collections
//! (creation index, last-dequeue index, payload map).

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tonic::Code;

use crate::store::{QueueStore, StoreError, WriteOp};
use crate::transaction::{run_watched, TxAction};

#[derive(Error, Debug, Clone)]
pub enum EngineError {
    #[error("store transport error: {0}")]
    Transport(String),
    #[error("store protocol error: {0}")]
    Protocol(String),
    #[error("optimistic transaction retries exhausted")]
    RetryExhausted,
    #[error("data corruption: {0}")]
    Corruption(String),
    #[error("operation cancelled")]
    Cancelled,
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Transport(msg) => EngineError::Transport(msg),
            StoreError::Protocol(msg) => EngineError::Protocol(msg),
        }
    }
}

impl From<EngineError> for tonic::Status {
    fn from(err: EngineError) -> Self {
        let code = match &err {
            EngineError::Transport(_) => Code::Unavailable,
            EngineError::Protocol(_) => Code::Internal,
            EngineError::RetryExhausted => Code::Aborted,
            EngineError::Corruption(_) => Code::DataLoss,
            EngineError::Cancelled => Code::Cancelled,
        };
        tonic::Status::new(code, err.to_string())
    }
}

/// Identity and tuning of one queue namespace. Immutable after construction.
#[derive(Debug, Clone)]
pub struct QueueDescriptor {
    pub name: String,
    pub dequeue_period: Duration,
    pub ttl: Duration,
}

impl QueueDescriptor {
    pub fn new(name: impl Into<String>, dequeue_period: Duration, ttl: Duration) -> Self {
        Self {
            name: name.into(),
            dequeue_period,
            ttl,
        }
    }

    pub fn ct_key(&self) -> String {
        format!("{}_ct", self.name)
    }

    pub fn ld_key(&self) -> String {
        format!("{}_ld", self.name)
    }

    pub fn data_key(&self) -> String {
        format!("{}_data", self.name)
    }
}

/// An item as handed back across the engine boundary: just enough for a
/// caller to re-deliver the payload. Encoding/validation of `data` is the
/// caller's concern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedItem {
    pub id: String,
    pub data: Vec<u8>,
}

fn now_unix() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before epoch")
        .as_secs() as i64
}

/// Generic over the store implementation, per the same convention
/// `recache`'s cache handlers use: monomorphize the call chain rather than
/// pay for a `dyn` indirection on every store round-trip.
pub struct QueueEngine<S: QueueStore> {
    store: S,
    descriptor: QueueDescriptor,
    max_retries: Option<u32>,
}

impl<S: QueueStore> QueueEngine<S> {
    pub fn new(store: S, descriptor: QueueDescriptor) -> Self {
        Self {
            store,
            descriptor,
            max_retries: None,
        }
    }

    pub fn with_max_retries(mut self, max_retries: Option<u32>) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn descriptor(&self) -> &QueueDescriptor {
        &self.descriptor
    }

    /// Installs the creation/last-dequeue/payload triple only if absent on
    /// all three collections. Idempotent: re-enqueuing an existing id is a
    /// no-op that still returns success.
    pub async fn enqueue(&self, id: &str, data: Vec<u8>) -> Result<(), EngineError> {
        let ops = vec![
            WriteOp::ZAddNx {
                key: self.descriptor.ct_key(),
                score: now_unix(),
                member: id.to_string(),
            },
            WriteOp::ZAddNx {
                key: self.descriptor.ld_key(),
                score: 0,
                member: id.to_string(),
            },
            WriteOp::HSetNx {
                key: self.descriptor.data_key(),
                field: id.to_string(),
                value: data,
            },
        ];
        self.store.pipelined_write(&ops).await?;
        Ok(())
    }

    /// Selects the least-recently-delivered eligible item, refreshes its
    /// last-dequeue score, and returns its payload. Returns `None` if the
    /// queue is empty or the oldest-LD item is still cooling down.
    pub async fn dequeue(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Option<QueuedItem>, EngineError> {
        let descriptor = &self.descriptor;
        let keys = vec![
            descriptor.ld_key(),
            descriptor.ct_key(),
            descriptor.data_key(),
        ];
        let dequeue_period = descriptor.dequeue_period.as_secs() as i64;

        run_watched(&self.store, &keys, cancel, self.max_retries, |watch| {
            let ld_key = descriptor.ld_key();
            let data_key = descriptor.data_key();
            async move {
                let candidates = watch
                    .zrange_by_score_with_scores(&ld_key, i64::MIN, i64::MAX, 1)
                    .await?;

                let Some((id, ld_score)) = candidates.into_iter().next() else {
                    return Ok(TxAction::Done(None));
                };

                let now = now_unix();
                if ld_score > now - dequeue_period {
                    return Ok(TxAction::Done(None));
                }

                let payload = watch.hget(&data_key, &id).await?;
                let Some(payload) = payload else {
                    return Err(EngineError::Corruption(format!(
                        "id {id} present in last-dequeue index but missing from payload map"
                    )));
                };

                let ops = vec![WriteOp::ZAdd {
                    key: ld_key.clone(),
                    score: now,
                    member: id.clone(),
                }];

                Ok(TxAction::Commit(
                    Some(QueuedItem { id, data: payload }),
                    ops,
                ))
            }
        })
        .await
    }

    /// Unconditional delete from all three collections. Removing a
    /// non-existent id succeeds silently.
    pub async fn remove(&self, id: &str) -> Result<(), EngineError> {
        let ops = vec![
            WriteOp::ZRem {
                key: self.descriptor.ct_key(),
                members: vec![id.to_string()],
            },
            WriteOp::ZRem {
                key: self.descriptor.ld_key(),
                members: vec![id.to_string()],
            },
            WriteOp::HDel {
                key: self.descriptor.data_key(),
                fields: vec![id.to_string()],
            },
        ];
        self.store.pipelined_write(&ops).await?;
        Ok(())
    }

    pub async fn exists(&self, id: &str) -> Result<bool, EngineError> {
        let score = self.store.zscore(&self.descriptor.ct_key(), id).await?;
        Ok(score.is_some())
    }

    /// Reflects the creation index; items expired but not yet swept are
    /// still counted until the next cleaner pass.
    pub async fn count(&self) -> Result<i64, EngineError> {
        let count = self.store.zcard(&self.descriptor.ct_key()).await?;
        Ok(count)
    }
}
