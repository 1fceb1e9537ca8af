//! Redis-backed key-value store.
//!
//! # Example
//!
//! ```no_run
//! use hydra_cache::{RedisStore, VersionedCache};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = RedisStore::new("redis://127.0.0.1:6379").await?;
//! let cache = VersionedCache::new(store);
//! let token = cache.get_token("hb:venues:ver").await;
//! # Ok(())
//! # }
//! ```

use crate::error::{CacheError, Result};
use crate::store::KeyValueStore;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use std::time::Duration;

/// Redis key-value store.
///
/// One instance is shared per process; `ConnectionManager` reconnects on
/// its own and is cloned per command.
#[derive(Clone)]
pub struct RedisStore {
    /// Connection manager for connection pooling.
    conn_manager: ConnectionManager,
}

impl RedisStore {
    /// Connect to Redis.
    ///
    /// # Arguments
    ///
    /// * `redis_url` - Redis connection URL (e.g., "redis://127.0.0.1:6379")
    ///
    /// # Errors
    ///
    /// Returns error if the URL is invalid or the first connection fails.
    pub async fn new(redis_url: &str) -> Result<Self> {
        let client = Client::open(redis_url).map_err(|e| {
            CacheError::Connection(format!("Failed to create Redis client: {e}"))
        })?;

        let conn_manager = ConnectionManager::new(client).await.map_err(|e| {
            CacheError::Connection(format!("Failed to create Redis connection manager: {e}"))
        })?;

        tracing::info!("Connected to Redis cache backend");

        Ok(Self { conn_manager })
    }

    /// Wrap an existing connection manager.
    #[must_use]
    pub const fn from_manager(conn_manager: ConnectionManager) -> Self {
        Self { conn_manager }
    }
}

impl KeyValueStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn_manager.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let mut conn = self.conn_manager.clone();

        #[allow(clippy::cast_possible_truncation)]
        let ttl_millis = (ttl.as_millis() as u64).max(1);

        let _: () = conn.pset_ex(key, value, ttl_millis).await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<bool> {
        let mut conn = self.conn_manager.clone();
        let removed: i64 = conn.del(key).await?;
        Ok(removed > 0)
    }

    async fn increment(&self, key: &str, initial: i64) -> Result<i64> {
        let mut conn = self.conn_manager.clone();

        // SETNX seeds an absent counter so INCR never starts from zero.
        let (value,): (i64,) = redis::pipe()
            .atomic()
            .set_nx(key, initial)
            .ignore()
            .incr(key, 1)
            .query_async(&mut conn)
            .await?;

        Ok(value)
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.conn_manager.clone();
        let pong: String = redis::cmd("PING").query_async(&mut conn).await?;

        if pong == "PONG" {
            Ok(())
        } else {
            Err(CacheError::Command(format!("Unexpected PING reply: {pong}")))
        }
    }
}
