//! Redis backend for the key-value store abstraction.
//!
//! Connections go through a `ConnectionManager`, which multiplexes requests over
//! one connection and reconnects in the background after a failure. Failed
//! calls are reported immediately; nothing here retries.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Script};

use crate::{KeyValueStore, Record, StoreError};

/// Initialise-if-absent, return the current value, then increment, all server side.
const ALLOCATE_ID_SCRIPT: &str = r#"
local v = redis.call('GET', KEYS[1])
if not v then
  redis.call('SET', KEYS[1], '1')
  v = '1'
end
redis.call('INCR', KEYS[1])
return v
"#;

/// `KeyValueStore` backed by a Redis server.
pub struct RedisStore {
    connection: ConnectionManager,
    allocate_id: Script,
}

impl RedisStore {
    /// Connects to the server at `url`, e.g. `redis://localhost:6379/0`.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(url)?;
        let connection = ConnectionManager::new(client).await?;
        Ok(Self {
            connection,
            allocate_id: Script::new(ALLOCATE_ID_SCRIPT),
        })
    }

    fn conn(&self) -> ConnectionManager {
        self.connection.clone()
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn allocate_id(&self, counter_key: &str) -> Result<String, StoreError> {
        let mut conn = self.conn();
        let id: String = self
            .allocate_id
            .key(counter_key)
            .invoke_async(&mut conn)
            .await?;
        Ok(id)
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.conn();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut conn = self.conn();
        let _: () = conn.set(key, value).await?;
        Ok(())
    }

    async fn set_nx(&self, key: &str, value: &str) -> Result<bool, StoreError> {
        let mut conn = self.conn();
        let written: bool = conn.set_nx(key, value).await?;
        Ok(written)
    }

    async fn incr(&self, key: &str) -> Result<i64, StoreError> {
        let mut conn = self.conn();
        let value: i64 = conn.incr(key, 1).await?;
        Ok(value)
    }

    async fn write_hash(
        &self,
        key: &str,
        fields: &[(String, String)],
    ) -> Result<usize, StoreError> {
        let mut conn = self.conn();
        let (len,): (usize,) = redis::pipe()
            .hset_multiple(key, fields)
            .ignore()
            .hlen(key)
            .query_async(&mut conn)
            .await?;
        Ok(len)
    }

    async fn read_hash(&self, key: &str) -> Result<Record, StoreError> {
        let mut conn = self.conn();
        let record: Record = conn.hgetall(key).await?;
        Ok(record)
    }

    async fn scan(
        &self,
        cursor: u64,
        pattern: &str,
        count: usize,
    ) -> Result<(u64, Vec<String>), StoreError> {
        let mut conn = self.conn();
        let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
            .arg(cursor)
            .arg("MATCH")
            .arg(pattern)
            .arg("COUNT")
            .arg(count)
            .query_async(&mut conn)
            .await?;
        Ok((next, keys))
    }

    async fn add_to_set(&self, key: &str, member: &str) -> Result<bool, StoreError> {
        let mut conn = self.conn();
        let added: usize = conn.sadd(key, member).await?;
        Ok(added > 0)
    }

    async fn set_members(&self, key: &str) -> Result<Vec<String>, StoreError> {
        let mut conn = self.conn();
        let members: Vec<String> = conn.smembers(key).await?;
        Ok(members)
    }

    async fn set_len(&self, key: &str) -> Result<usize, StoreError> {
        let mut conn = self.conn();
        let len: usize = conn.scard(key).await?;
        Ok(len)
    }
}
