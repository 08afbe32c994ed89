//! Networked cache engine backed by Redis.

use std::time::Duration;

use async_trait::async_trait;
use deadpool_redis::{Connection, Pool, Runtime};
use redis::{AsyncCommands, LposOptions};

use crate::config::RedisConfig;
use crate::engine::CacheEngine;
use crate::error::{CacheError, CacheResult};

/// Cache engine over a pooled Redis connection.
///
/// The pool is built eagerly at construction and verified with a `PING`;
/// connections are returned to the pool when dropped, so release is
/// guaranteed even on abnormal unwind.
pub struct RedisEngine {
    pool: Pool,
}

impl RedisEngine {
    /// Connects to Redis using the given configuration.
    ///
    /// # Errors
    ///
    /// Returns a connection error if the pool cannot be built or the
    /// initial `PING` fails.
    pub async fn connect(config: &RedisConfig) -> CacheResult<Self> {
        let mut pool_config = deadpool_redis::Config::from_url(config.url());
        pool_config.pool = Some(deadpool_redis::PoolConfig::new(config.pool_size));
        let pool = pool_config.create_pool(Some(Runtime::Tokio1))?;

        let mut conn = pool.get().await?;
        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .map_err(|err| CacheError::connection(err.to_string()))?;
        tracing::info!(host = %config.host, port = config.port, db = config.db, "connected to redis");

        Ok(Self { pool })
    }

    /// Wraps an existing pool, skipping the connectivity check.
    #[must_use]
    pub fn from_pool(pool: Pool) -> Self {
        Self { pool }
    }

    async fn conn(&self) -> CacheResult<Connection> {
        Ok(self.pool.get().await?)
    }
}

#[async_trait]
impl CacheEngine for RedisEngine {
    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> CacheResult<bool> {
        let mut conn = self.conn().await?;
        let stored: bool = conn.set(key, value).await?;
        // TTL is a deliberate follow-up call, not SET EX: a failure between
        // the two leaves the key without a deadline, which callers treat as
        // an acceptable degraded state rather than corruption.
        if stored {
            if let Some(ttl) = ttl {
                let _: bool = conn.expire(key, ttl.as_secs() as i64).await?;
            }
        }
        Ok(stored)
    }

    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let mut conn = self.conn().await?;
        match conn.get::<_, Option<String>>(key).await {
            Ok(value) => Ok(value),
            // A scalar read of a list key answers WRONGTYPE; normalize to a
            // miss, only unexpected errors propagate.
            Err(err) if err.kind() == redis::ErrorKind::TypeError => {
                tracing::debug!(key = %key, "non-scalar value under key, treating as miss");
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn delete(&self, key: &str) -> CacheResult<bool> {
        let mut conn = self.conn().await?;
        let removed: u64 = conn.del(key).await?;
        Ok(removed > 0)
    }

    async fn update_ttl(&self, key: &str, ttl: Duration) -> CacheResult<bool> {
        let mut conn = self.conn().await?;
        Ok(conn.expire(key, ttl.as_secs() as i64).await?)
    }

    async fn list_push(&self, key: &str, value: String) -> CacheResult<()> {
        let mut conn = self.conn().await?;
        let _: u64 = conn.lpush(key, value).await?;
        Ok(())
    }

    async fn list_position(&self, key: &str, value: &str) -> CacheResult<Option<u64>> {
        let mut conn = self.conn().await?;
        Ok(conn
            .lpos::<_, _, Option<u64>>(key, value, LposOptions::default())
            .await?)
    }

    async fn list_range(&self, key: &str, start: isize, end: isize) -> CacheResult<Vec<String>> {
        let mut conn = self.conn().await?;
        Ok(conn.lrange(key, start, end).await?)
    }

    async fn list_remove(&self, key: &str, count: isize, value: &str) -> CacheResult<u64> {
        let mut conn = self.conn().await?;
        Ok(conn.lrem(key, count, value).await?)
    }

    async fn reset(&self) -> CacheResult<()> {
        let mut conn = self.conn().await?;
        redis::cmd("FLUSHDB").query_async::<()>(&mut conn).await?;
        Ok(())
    }
}
