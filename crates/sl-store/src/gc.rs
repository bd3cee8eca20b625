//! Time-based eviction of session entries.
//!
//! A sweep does not coordinate with locks: an entry older than the TTL is
//! deleted even if some caller currently holds its lock. The TTL is expected
//! to be far longer than any single request.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use sl_core::{KeyLayout, Result};
use tracing::{debug, info};

use crate::backend::Backend;

pub struct GcSweeper {
    backend: Arc<dyn Backend>,
    layout: KeyLayout,
}

impl GcSweeper {
    pub fn new(backend: Arc<dyn Backend>, layout: KeyLayout) -> Self {
        Self { backend, layout }
    }

    /// Delete every entry whose age is at least `ttl`; returns how many were
    /// deleted.
    pub async fn collect(&self, ttl: Duration) -> Result<usize> {
        self.collect_at(ttl, Utc::now()).await
    }

    /// Same as [`GcSweeper::collect`] with an explicit notion of "now".
    ///
    /// Lock markers and keys that are not entries of this namespace are never
    /// touched. Failing to delete a single entry (typically because another
    /// sweeper or a `destroy` got there first) is not an error; such entries
    /// are just not counted.
    pub async fn collect_at(&self, ttl: Duration, now: DateTime<Utc>) -> Result<usize> {
        let ttl = chrono::TimeDelta::from_std(ttl).unwrap_or(chrono::TimeDelta::MAX);
        let scanned = self.backend.scan(self.layout.entry_prefix()).await?;

        let mut deleted = 0;
        for entry in scanned {
            if self.layout.is_lock_key(&entry.key) {
                continue;
            }
            if self.layout.parse_entry_key(&entry.key).is_none() {
                debug!(key = %entry.key, "skipping key outside this namespace");
                continue;
            }
            if now.signed_duration_since(entry.modified) < ttl {
                continue;
            }
            match self.backend.delete(&entry.key).await {
                Ok(true) => deleted += 1,
                Ok(false) => debug!(key = %entry.key, "entry vanished before gc could delete it"),
                Err(e) => debug!(key = %entry.key, "gc failed to delete entry: {e}"),
            }
        }

        info!(
            namespace = self.layout.namespace(),
            deleted, "session garbage collection finished"
        );
        Ok(deleted)
    }
}
