//! In-memory `QueueStore` used only by `rrqueue-logic`'s own test suite.
//! Conflict detection is simulated with a per-key generation counter: a
//! watch snapshots the generations of its declared keys, and `commit`
//! aborts if any of them moved since.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::{QueueStore, StoreError, TxOutcome, WatchSession, WriteOp};

#[derive(Default)]
struct Inner {
    zsets: HashMap<String, HashMap<String, i64>>,
    hashes: HashMap<String, HashMap<String, Vec<u8>>>,
    generations: HashMap<String, u64>,
}

impl Inner {
    fn bump(&mut self, key: &str) {
        *self.generations.entry(key.to_string()).or_insert(0) += 1;
    }

    fn apply(&mut self, op: &WriteOp) {
        match op {
            WriteOp::ZAddNx { key, score, member } => {
                let set = self.zsets.entry(key.clone()).or_default();
                if !set.contains_key(member) {
                    set.insert(member.clone(), *score);
                    self.bump(key);
                }
            }
            WriteOp::ZAdd { key, score, member } => {
                self.zsets
                    .entry(key.clone())
                    .or_default()
                    .insert(member.clone(), *score);
                self.bump(key);
            }
            WriteOp::ZRem { key, members } => {
                if let Some(set) = self.zsets.get_mut(key) {
                    for m in members {
                        set.remove(m);
                    }
                }
                self.bump(key);
            }
            WriteOp::HSetNx { key, field, value } => {
                let map = self.hashes.entry(key.clone()).or_default();
                if !map.contains_key(field) {
                    map.insert(field.clone(), value.clone());
                    self.bump(key);
                }
            }
            WriteOp::HDel { key, fields } => {
                if let Some(map) = self.hashes.get_mut(key) {
                    for f in fields {
                        map.remove(f);
                    }
                }
                self.bump(key);
            }
        }
    }

    fn generation_of(&self, key: &str) -> u64 {
        self.generations.get(key).copied().unwrap_or(0)
    }
}

#[derive(Clone, Default)]
pub struct FakeStore {
    inner: Arc<Mutex<Inner>>,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Test-only seam: writes a score into a sorted set directly, bypassing
    /// the `DATA` hash entirely. Used to simulate an id present in `LD`/`CT`
    /// but missing from `DATA` — the corruption case spec.md §9 resolves —
    /// without needing a real race against a Cleaner sweep.
    pub fn seed_zset(&self, key: &str, member: &str, score: i64) {
        let mut inner = self.inner.lock().unwrap();
        inner
            .zsets
            .entry(key.to_string())
            .or_default()
            .insert(member.to_string(), score);
        inner.bump(key);
    }
}

#[async_trait::async_trait]
impl QueueStore for FakeStore {
    type Watch = FakeWatchSession;

    async fn zscore(&self, key: &str, member: &str) -> Result<Option<i64>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.zsets.get(key).and_then(|s| s.get(member)).copied())
    }

    async fn zcard(&self, key: &str) -> Result<i64, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.zsets.get(key).map(|s| s.len()).unwrap_or(0) as i64)
    }

    async fn zrange_by_score(
        &self,
        key: &str,
        min: i64,
        max: i64,
    ) -> Result<Vec<String>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut members: Vec<(String, i64)> = inner
            .zsets
            .get(key)
            .map(|s| s.iter().map(|(m, sc)| (m.clone(), *sc)).collect())
            .unwrap_or_default();
        members.retain(|(_, sc)| *sc >= min && *sc <= max);
        members.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        Ok(members.into_iter().map(|(m, _)| m).collect())
    }

    async fn pipelined_write(&self, ops: &[WriteOp]) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        for op in ops {
            inner.apply(op);
        }
        Ok(())
    }

    async fn begin_watch(&self, keys: &[String]) -> Result<Self::Watch, StoreError> {
        let inner = self.inner.lock().unwrap();
        let snapshot = keys
            .iter()
            .map(|k| (k.clone(), inner.generation_of(k)))
            .collect();
        Ok(FakeWatchSession {
            inner: self.inner.clone(),
            snapshot,
        })
    }
}

pub struct FakeWatchSession {
    inner: Arc<Mutex<Inner>>,
    snapshot: Vec<(String, u64)>,
}

#[async_trait::async_trait]
impl WatchSession for FakeWatchSession {
    async fn zrange_by_score_with_scores(
        &mut self,
        key: &str,
        min: i64,
        max: i64,
        limit: isize,
    ) -> Result<Vec<(String, i64)>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut members: Vec<(String, i64)> = inner
            .zsets
            .get(key)
            .map(|s| s.iter().map(|(m, sc)| (m.clone(), *sc)).collect())
            .unwrap_or_default();
        members.retain(|(_, sc)| *sc >= min && *sc <= max);
        members.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        if limit >= 0 {
            members.truncate(limit as usize);
        }
        Ok(members)
    }

    async fn hget(&mut self, key: &str, field: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.hashes.get(key).and_then(|m| m.get(field)).cloned())
    }

    async fn commit(self, ops: Vec<WriteOp>) -> Result<TxOutcome<()>, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        for (key, gen) in &self.snapshot {
            if inner.generation_of(key) != *gen {
                return Ok(TxOutcome::Conflict);
            }
        }
        for op in &ops {
            inner.apply(op);
        }
        Ok(TxOutcome::Committed(()))
    }

    async fn cancel(self) -> Result<(), StoreError> {
        Ok(())
    }
}
