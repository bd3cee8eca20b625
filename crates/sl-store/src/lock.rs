//! Advisory per-session locks built on [`Backend::create_exclusive`].
//!
//! Backends are not assumed to offer wait queues or notifications, so
//! acquisition polls the atomic create at a fixed interval until it wins or
//! the budget runs out. Waiters get no fairness guarantee.

use std::sync::Arc;
use std::time::Duration;

use sl_core::{KeyLayout, Result, SessionId};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::backend::Backend;

/// Result of a bounded acquisition attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acquisition {
    Acquired { attempts: u32 },
    TimedOut { attempts: u32, waited: Duration },
}

impl Acquisition {
    pub fn is_acquired(&self) -> bool {
        matches!(self, Self::Acquired { .. })
    }
}

pub struct LockManager {
    backend: Arc<dyn Backend>,
    layout: KeyLayout,
}

impl LockManager {
    pub fn new(backend: Arc<dyn Backend>, layout: KeyLayout) -> Self {
        Self { backend, layout }
    }

    /// Poll for the lock on `id` until it is created or `timeout` elapses.
    ///
    /// At least one attempt is always made. Not reentrant: acquiring a lock
    /// this caller already holds simply waits out the budget.
    pub async fn acquire(
        &self,
        id: &SessionId,
        timeout: Duration,
        poll_interval: Duration,
    ) -> Result<Acquisition> {
        let key = self.layout.lock_key(id);
        let started = Instant::now();
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            if self.backend.create_exclusive(&key).await? {
                debug!(session = %id, attempts, "lock acquired");
                return Ok(Acquisition::Acquired { attempts });
            }

            let waited = started.elapsed();
            if waited >= timeout {
                warn!(session = %id, attempts, ?waited, "gave up waiting for lock");
                return Ok(Acquisition::TimedOut { attempts, waited });
            }
            tokio::time::sleep(poll_interval.min(timeout - waited)).await;
        }
    }

    /// Remove the lock marker. Releasing a lock nobody holds is a no-op.
    pub async fn release(&self, id: &SessionId) -> Result<()> {
        if self.backend.delete(&self.layout.lock_key(id)).await? {
            debug!(session = %id, "lock released");
        }
        Ok(())
    }

    pub async fn is_locked(&self, id: &SessionId) -> Result<bool> {
        self.backend.exists(&self.layout.lock_key(id)).await
    }
}
