use super::{QueueStore, StoreError, TxOutcome, WatchSession, WriteOp};
use redis::AsyncCommands;

/// Redis-backed store adapter.
///
/// Simple (non-watched) operations go through a shared, multiplexed
/// [`redis::aio::ConnectionManager`] — cheap to clone, reconnects on its
/// own. Watched transactions cannot safely share that connection: `WATCH`
/// is connection-scoped, and a multiplexed connection interleaves unrelated
/// callers' commands on the same socket. `begin_watch` therefore opens a
/// fresh dedicated connection per attempt.
#[derive(Clone)]
pub struct RedisStore {
    client: redis::Client,
    manager: redis::aio::ConnectionManager,
}

impl RedisStore {
    pub async fn connect(addr: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(format!("redis://{addr}"))
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        let manager = redis::aio::ConnectionManager::new(client.clone())
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        Ok(Self { client, manager })
    }
}

fn map_err(e: redis::RedisError) -> StoreError {
    if e.is_io_error() {
        StoreError::Transport(e.to_string())
    } else {
        StoreError::Protocol(e.to_string())
    }
}

/// Appends one write to `pipe`. Replies are deliberately kept (no
/// `.ignore()`): `commit` needs the whole `EXEC` reply array intact to
/// tell a successful commit from a `WATCH` conflict.
fn push_op(pipe: &mut redis::Pipeline, op: &WriteOp) {
    match op {
        WriteOp::ZAddNx { key, score, member } => {
            pipe.cmd("ZADD").arg(key).arg("NX").arg(*score).arg(member);
        }
        WriteOp::ZAdd { key, score, member } => {
            pipe.zadd(key, member, *score);
        }
        WriteOp::ZRem { key, members } => {
            if !members.is_empty() {
                let mut cmd = redis::cmd("ZREM");
                cmd.arg(key);
                for m in members {
                    cmd.arg(m);
                }
                pipe.add_command(cmd);
            }
        }
        WriteOp::HSetNx { key, field, value } => {
            pipe.hset_nx(key, field, value.as_slice());
        }
        WriteOp::HDel { key, fields } => {
            if !fields.is_empty() {
                let mut cmd = redis::cmd("HDEL");
                cmd.arg(key);
                for f in fields {
                    cmd.arg(f);
                }
                pipe.add_command(cmd);
            }
        }
    }
}

#[async_trait::async_trait]
impl QueueStore for RedisStore {
    type Watch = RedisWatchSession;

    async fn zscore(&self, key: &str, member: &str) -> Result<Option<i64>, StoreError> {
        let mut conn = self.manager.clone();
        conn.zscore(key, member).await.map_err(map_err)
    }

    async fn zcard(&self, key: &str) -> Result<i64, StoreError> {
        let mut conn = self.manager.clone();
        conn.zcard(key).await.map_err(map_err)
    }

    async fn zrange_by_score(
        &self,
        key: &str,
        min: i64,
        max: i64,
    ) -> Result<Vec<String>, StoreError> {
        let mut conn = self.manager.clone();
        conn.zrangebyscore(key, min, max).await.map_err(map_err)
    }

    async fn pipelined_write(&self, ops: &[WriteOp]) -> Result<(), StoreError> {
        let mut pipe = redis::pipe();
        pipe.atomic();
        for op in ops {
            push_op(&mut pipe, op);
        }
        let mut conn = self.manager.clone();
        let _: () = pipe.query_async(&mut conn).await.map_err(map_err)?;
        Ok(())
    }

    async fn begin_watch(&self, keys: &[String]) -> Result<Self::Watch, StoreError> {
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(map_err)?;
        let _: () = redis::cmd("WATCH")
            .arg(keys)
            .query_async(&mut conn)
            .await
            .map_err(map_err)?;
        Ok(RedisWatchSession { conn })
    }
}

pub struct RedisWatchSession {
    conn: redis::aio::MultiplexedConnection,
}

#[async_trait::async_trait]
impl WatchSession for RedisWatchSession {
    async fn zrange_by_score_with_scores(
        &mut self,
        key: &str,
        min: i64,
        max: i64,
        limit: isize,
    ) -> Result<Vec<(String, i64)>, StoreError> {
        self.conn
            .zrangebyscore_limit_withscores(key, min, max, 0, limit)
            .await
            .map_err(map_err)
    }

    async fn hget(&mut self, key: &str, field: &str) -> Result<Option<Vec<u8>>, StoreError> {
        self.conn.hget(key, field).await.map_err(map_err)
    }

    async fn commit(mut self, ops: Vec<WriteOp>) -> Result<TxOutcome<()>, StoreError> {
        let mut pipe = redis::pipe();
        pipe.atomic();
        for op in &ops {
            push_op(&mut pipe, op);
        }
        // `EXEC` replies with a bulk array of per-command results on a
        // successful commit, or a nil array if a watched key changed and
        // the transaction was aborted. `Option<Vec<Value>>` round-trips
        // exactly that distinction.
        let reply: Option<Vec<redis::Value>> =
            pipe.query_async(&mut self.conn).await.map_err(map_err)?;
        match reply {
            None => Ok(TxOutcome::Conflict),
            Some(_) => Ok(TxOutcome::Committed(())),
        }
    }

    async fn cancel(mut self) -> Result<(), StoreError> {
        let _: () = redis::cmd("UNWATCH")
            .query_async(&mut self.conn)
            .await
            .map_err(map_err)?;
        Ok(())
    }
}
