//! Store adapter: the capability set the queue engine needs from an
//! external key/value store (sorted sets, hashes, watched transactions).
//!
//! Mirrors `recache`'s generic-bound `AsyncCacheStore<K, V>` convention:
//! engine code is generic over the store type rather than boxing it as a
//! trait object, so a single monomorphized call chain reaches all the way
//! down to the wire.

pub mod redis;

#[cfg(test)]
pub mod fake;

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum StoreError {
    #[error("store transport error: {0}")]
    Transport(String),
    #[error("store protocol error: {0}")]
    Protocol(String),
}

/// One write inside a pipelined or watched-commit batch.
///
/// `ZRem`/`HDel` carry the full member/field list rather than a single
/// scalar: a batch delete must expand every id as a distinct command
/// argument, not forward the list itself as one argument.
#[derive(Debug, Clone)]
pub enum WriteOp {
    ZAddNx {
        key: String,
        score: i64,
        member: String,
    },
    ZAdd {
        key: String,
        score: i64,
        member: String,
    },
    ZRem {
        key: String,
        members: Vec<String>,
    },
    HSetNx {
        key: String,
        field: String,
        value: Vec<u8>,
    },
    HDel {
        key: String,
        fields: Vec<String>,
    },
}

/// Outcome of a commit attempt against a watched key set.
#[derive(Debug)]
pub enum TxOutcome<T> {
    Committed(T),
    Conflict,
}

/// Non-transactional capability set plus the ability to open a watch
/// session. Implementations must be cheap to clone/share (the engine is
/// generic over `S: QueueStore`, held behind an `Arc` by callers).
#[async_trait::async_trait]
pub trait QueueStore: Send + Sync + 'static {
    type Watch: WatchSession;

    /// Score of `member` in `key`, or `None` if absent.
    async fn zscore(&self, key: &str, member: &str) -> Result<Option<i64>, StoreError>;

    /// Cardinality of a sorted set.
    async fn zcard(&self, key: &str) -> Result<i64, StoreError>;

    /// Ids (no scores) with score in `[min, max]`, ascending. Used by the
    /// cleaner, which does not need the scores back.
    async fn zrange_by_score(
        &self,
        key: &str,
        min: i64,
        max: i64,
    ) -> Result<Vec<String>, StoreError>;

    /// Apply a batch of writes as one atomic pipeline. No watch is taken;
    /// callers use this only when no read-modify-write is involved.
    async fn pipelined_write(&self, ops: &[WriteOp]) -> Result<(), StoreError>;

    /// Open a watch session over `keys`. Reads performed through the
    /// returned session observe a consistent snapshot; `commit` aborts
    /// with `TxOutcome::Conflict` if any watched key changed since.
    async fn begin_watch(&self, keys: &[String]) -> Result<Self::Watch, StoreError>;
}

/// A single watched-transaction attempt. Consuming methods (`commit`,
/// `cancel`) end the session; reads may be called any number of times
/// before that.
#[async_trait::async_trait]
pub trait WatchSession: Send {
    /// Ascending range scan with scores, capped at `limit` results.
    async fn zrange_by_score_with_scores(
        &mut self,
        key: &str,
        min: i64,
        max: i64,
        limit: isize,
    ) -> Result<Vec<(String, i64)>, StoreError>;

    async fn hget(&mut self, key: &str, field: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Commit `ops` atomically, conditioned on the watched keys being
    /// unchanged since the session was opened.
    async fn commit(self, ops: Vec<WriteOp>) -> Result<TxOutcome<()>, StoreError>;

    /// Release the watch without writing anything.
    async fn cancel(self) -> Result<(), StoreError>;
}
