//! The operation set a session-management layer drives.
//!
//! One handler instance serves one caller at a time, hence `&mut self`
//! everywhere. Return values follow a single rule: `Err` is a failure the
//! caller must surface, while `Ok(false)` and empty content are ordinary
//! answers (rejected id, no data yet).

use std::time::Duration;

use async_trait::async_trait;
use sl_core::{Result, SessionId};

#[async_trait]
pub trait SessionHandler: Send {
    /// Bind to a backend location. `name` becomes the key namespace.
    async fn open(&mut self, save_path: &str, name: &str) -> Result<bool>;

    /// Release whatever lock is still held and unbind.
    async fn close(&mut self) -> Result<bool>;

    /// Lock `id` (blocking up to the configured budget) and return its
    /// content, which is empty for a new session.
    async fn read(&mut self, id: &str) -> Result<Vec<u8>>;

    /// Persist `data` for the locked `id` and release the lock.
    async fn write(&mut self, id: &str, data: &[u8]) -> Result<bool>;

    /// Delete the entry for `id` and release the lock.
    async fn destroy(&mut self, id: &str) -> Result<bool>;

    /// Evict entries older than `max_lifetime`; returns how many went away.
    async fn gc(&mut self, max_lifetime: Duration) -> Result<usize>;

    /// Handlers that cannot check for collisions fall back to a plain random
    /// id.
    async fn create_sid(&mut self) -> Result<SessionId> {
        Ok(SessionId::random())
    }

    /// `Ok(true)` when an entry for `id` already exists.
    async fn validate_id(&mut self, id: &str) -> Result<bool>;

    /// Refresh the entry's timestamp without rewriting it, then release the
    /// lock. Handlers that cannot do that persist `data` instead.
    async fn update_timestamp(&mut self, id: &str, data: &[u8]) -> Result<bool> {
        self.write(id, data).await
    }
}
