//! Redis-backed storage.
//!
//! Available only when the `redis` cargo feature is enabled.
//!
//! Locks are created with `SET key 1 NX` and carry no expiry, so a crashed
//! holder leaves its lock behind until an operator deletes it. Entries are
//! written with `SET EX` and the server evicts them once their TTL runs out,
//! which is why [`Backend::scan`] reports nothing here and a GC pass over
//! this backend always deletes zero entries.

use std::time::Duration;

use ::redis::AsyncCommands;
use async_trait::async_trait;
use sl_core::{Error, KeyStyle, Result};
use tracing::debug;

use super::{Backend, ScannedKey};

/// Redis backend.
///
/// Uses `redis::aio::ConnectionManager` which automatically reconnects on
/// transient failures and is cheaply cloneable.
pub struct RedisBackend {
    conn: ::redis::aio::ConnectionManager,
}

impl RedisBackend {
    /// Connect to a Redis server, e.g. `redis://127.0.0.1:6379`.
    pub async fn new(redis_url: &str) -> Result<Self> {
        let client = ::redis::Client::open(redis_url).map_err(backend_error)?;
        let conn = ::redis::aio::ConnectionManager::new(client)
            .await
            .map_err(backend_error)?;
        Ok(Self { conn })
    }
}

fn backend_error(e: ::redis::RedisError) -> Error {
    Error::Backend(format!("redis: {e}"))
}

#[async_trait]
impl Backend for RedisBackend {
    fn key_style(&self) -> KeyStyle {
        KeyStyle::Cache
    }

    async fn create_exclusive(&self, key: &str) -> Result<bool> {
        let mut conn = self.conn.clone();
        let reply: Option<String> = ::redis::cmd("SET")
            .arg(key)
            .arg("1")
            .arg("NX")
            .query_async(&mut conn)
            .await
            .map_err(backend_error)?;
        Ok(reply.is_some())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let mut conn = self.conn.clone();
        conn.exists(key).await.map_err(backend_error)
    }

    async fn read(&self, key: &str) -> Result<Vec<u8>> {
        let mut conn = self.conn.clone();
        let data: Option<Vec<u8>> = conn.get(key).await.map_err(backend_error)?;
        Ok(data.unwrap_or_default())
    }

    async fn write(&self, key: &str, data: &[u8], ttl: Duration) -> Result<bool> {
        let mut conn = self.conn.clone();
        let secs = ttl.as_secs();
        if secs == 0 {
            conn.set::<_, _, ()>(key, data).await.map_err(backend_error)?;
        } else {
            conn.set_ex::<_, _, ()>(key, data, secs)
                .await
                .map_err(backend_error)?;
        }
        Ok(true)
    }

    async fn touch(&self, key: &str, ttl: Duration) -> Result<bool> {
        let mut conn = self.conn.clone();
        let secs = ttl.as_secs();

        // Missing keys are created empty, existing ones keep their content.
        let mut create = ::redis::cmd("SET");
        create.arg(key).arg("").arg("NX");
        if secs > 0 {
            create.arg("EX").arg(secs);
        }
        let created: Option<String> = create
            .query_async(&mut conn)
            .await
            .map_err(backend_error)?;
        if created.is_some() || secs == 0 {
            return Ok(true);
        }

        let secs = i64::try_from(secs).unwrap_or(i64::MAX);
        conn.expire(key, secs).await.map_err(backend_error)
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let mut conn = self.conn.clone();
        let removed: i64 = conn.del(key).await.map_err(backend_error)?;
        Ok(removed > 0)
    }

    async fn scan(&self, prefix: &str) -> Result<Vec<ScannedKey>> {
        debug!(prefix, "redis expires entries natively; nothing to scan");
        Ok(Vec::new())
    }
}
