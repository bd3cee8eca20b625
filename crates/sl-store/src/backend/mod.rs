//! Storage backends.
//!
//! A backend is a flat key space with a handful of primitives. It knows
//! nothing about sessions or locks: the only mutual-exclusion guarantee it
//! owes its callers is that [`Backend::create_exclusive`] is atomic.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sl_core::{Error, KeyStyle, Result};

pub mod fs;
pub mod memory;
#[cfg(feature = "redis")]
pub mod redis;

pub use fs::FileBackend;
pub use memory::MemoryBackend;
#[cfg(feature = "redis")]
pub use self::redis::RedisBackend;

/// A key returned by [`Backend::scan`] together with its last modification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedKey {
    pub key: String,
    pub modified: DateTime<Utc>,
}

/// Trait for session storage backends.
#[async_trait]
pub trait Backend: Send + Sync + 'static {
    /// Key convention this backend expects.
    fn key_style(&self) -> KeyStyle;

    /// Create `key` only if it does not exist yet. `Ok(false)` means somebody
    /// else got there first. Must be linearizable per key.
    async fn create_exclusive(&self, key: &str) -> Result<bool>;

    async fn exists(&self, key: &str) -> Result<bool>;

    /// Content of `key`; a missing key reads as empty.
    async fn read(&self, key: &str) -> Result<Vec<u8>>;

    async fn write(&self, key: &str, data: &[u8], ttl: Duration) -> Result<bool>;

    /// Refresh the modification time (and expiry) of `key` without changing
    /// its content.
    async fn touch(&self, key: &str, ttl: Duration) -> Result<bool>;

    /// Remove `key`. Missing keys are not an error and report `Ok(false)`.
    async fn delete(&self, key: &str) -> Result<bool>;

    /// One-shot listing of the keys starting with `prefix`.
    async fn scan(&self, prefix: &str) -> Result<Vec<ScannedKey>>;

    /// Tear down the connection, if there is one.
    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// Open the backend named by a save path.
///
/// - `redis://`, `rediss://` and `tcp://` connect to a Redis server
///   (requires the `redis` feature),
/// - `memory:` creates a fresh in-process backend,
/// - `file://<dir>` or a plain path uses that directory, which must exist.
pub async fn connect(save_path: &str) -> Result<Arc<dyn Backend>> {
    let save_path = save_path.trim();
    if save_path.is_empty() {
        return Err(Error::UnsupportedSavePath(save_path.to_string()));
    }

    if let Some(rest) = save_path.strip_prefix("tcp://") {
        return connect_redis(&format!("redis://{rest}")).await;
    }
    if save_path.starts_with("redis://") || save_path.starts_with("rediss://") {
        return connect_redis(save_path).await;
    }
    if save_path == "memory:" || save_path.starts_with("memory://") {
        return Ok(Arc::new(MemoryBackend::new()));
    }

    let dir = save_path.strip_prefix("file://").unwrap_or(save_path);
    if dir.contains("://") {
        return Err(Error::UnsupportedSavePath(save_path.to_string()));
    }
    Ok(Arc::new(FileBackend::open(dir).await?))
}

#[cfg(feature = "redis")]
async fn connect_redis(url: &str) -> Result<Arc<dyn Backend>> {
    Ok(Arc::new(RedisBackend::new(url).await?))
}

#[cfg(not(feature = "redis"))]
async fn connect_redis(url: &str) -> Result<Arc<dyn Backend>> {
    Err(Error::UnsupportedSavePath(format!(
        "{url} (built without the `redis` feature)"
    )))
}
