//! `SessionStore`: the lock-guarded session lifecycle over any backend.
//!
//! Each store instance belongs to one caller and binds at most one session
//! id at a time. Cross-instance coordination happens only through the lock
//! markers in the shared backend.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sl_core::config::validate_namespace;
use sl_core::{Error, KeyLayout, Result, SessionId, StoreConfig};
use tracing::{debug, warn};

use crate::backend::{self, Backend};
use crate::gc::GcSweeper;
use crate::handler::SessionHandler;
use crate::lock::{Acquisition, LockManager};
use crate::sid::IdGenerator;

// ── Binding ─────────────────────────────────────────────────────────

/// What the store currently knows about its session id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    /// No id bound.
    Idle,
    /// `read` acquired the lock; it is held until write/destroy/close.
    Locked(SessionId),
    /// The id was written (or its timestamp refreshed) and the lock released.
    Released(SessionId),
    /// The entry was deleted and the lock released.
    Destroyed(SessionId),
}

impl Binding {
    pub fn id(&self) -> Option<&SessionId> {
        match self {
            Self::Idle => None,
            Self::Locked(id) | Self::Released(id) | Self::Destroyed(id) => Some(id),
        }
    }
}

/// How a requested id relates to the current binding.
enum Hold {
    Locked,
    Released,
    Destroyed,
    Unrelated,
}

// ── Connection ──────────────────────────────────────────────────────

struct Connection {
    backend: Arc<dyn Backend>,
    layout: KeyLayout,
    locks: LockManager,
    ids: IdGenerator,
    sweeper: GcSweeper,
    /// Whether `open` created the backend (and `close` must tear it down).
    owned: bool,
}

impl Connection {
    fn new(backend: Arc<dyn Backend>, namespace: &str, owned: bool) -> Self {
        let layout = KeyLayout::new(backend.key_style(), namespace);
        Self {
            locks: LockManager::new(backend.clone(), layout.clone()),
            ids: IdGenerator::new(backend.clone(), layout.clone()),
            sweeper: GcSweeper::new(backend.clone(), layout.clone()),
            backend,
            layout,
            owned,
        }
    }
}

// ── SessionStore ────────────────────────────────────────────────────

pub struct SessionStore {
    config: StoreConfig,
    injected: Option<Arc<dyn Backend>>,
    conn: Option<Connection>,
    binding: Binding,
}

impl SessionStore {
    /// A closed store that connects to its save path on `open`.
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            injected: None,
            conn: None,
            binding: Binding::Idle,
        }
    }

    /// A closed store that uses `backend` instead of connecting. The backend
    /// survives `close` so the store can be reopened.
    pub fn with_backend(config: StoreConfig, backend: Arc<dyn Backend>) -> Self {
        let mut store = Self::new(config);
        store.injected = Some(backend);
        store
    }

    pub fn binding(&self) -> &Binding {
        &self.binding
    }

    pub fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    fn hold(&self, id: &SessionId) -> Hold {
        match &self.binding {
            Binding::Locked(held) if held == id => Hold::Locked,
            Binding::Released(held) if held == id => Hold::Released,
            Binding::Destroyed(held) if held == id => Hold::Destroyed,
            _ => Hold::Unrelated,
        }
    }

    async fn acquire(&self, conn: &Connection, id: &SessionId) -> Result<()> {
        let outcome = conn
            .locks
            .acquire(id, self.config.lock_timeout(), self.config.poll_interval())
            .await?;
        match outcome {
            Acquisition::Acquired { .. } => Ok(()),
            Acquisition::TimedOut { attempts, waited } => Err(Error::LockTimeout {
                id: id.to_string(),
                attempts,
                waited,
            }),
        }
    }
}

#[async_trait]
impl SessionHandler for SessionStore {
    async fn open(&mut self, save_path: &str, name: &str) -> Result<bool> {
        self.config.validate()?;
        if self.conn.is_some() {
            self.close().await?;
        }

        let namespace = if name.is_empty() {
            self.config.namespace.clone()
        } else {
            name.to_string()
        };
        validate_namespace(&namespace)?;

        let save_path = if save_path.is_empty() {
            self.config.save_path.as_str()
        } else {
            save_path
        };
        let (backend, owned) = match &self.injected {
            Some(backend) => (backend.clone(), false),
            None => (backend::connect(save_path).await?, true),
        };

        debug!(save_path, namespace = %namespace, "session store opened");
        self.conn = Some(Connection::new(backend, &namespace, owned));
        self.binding = Binding::Idle;
        Ok(true)
    }

    async fn close(&mut self) -> Result<bool> {
        let Some(conn) = self.conn.take() else {
            self.binding = Binding::Idle;
            return Ok(true);
        };

        if let Binding::Locked(id) = &self.binding {
            debug!(session = %id, "releasing lock left behind by read");
            if let Err(e) = conn.locks.release(id).await {
                warn!(session = %id, "failed to release lock on close: {e}");
            }
        }
        self.binding = Binding::Idle;

        if conn.owned {
            conn.backend.close().await?;
        }
        Ok(true)
    }

    async fn read(&mut self, id: &str) -> Result<Vec<u8>> {
        let conn = self.conn.as_ref().ok_or(Error::NotOpen)?;
        let Some(id) = SessionId::parse(id) else {
            debug!(id, "rejecting malformed session id");
            return Ok(Vec::new());
        };
        if let Binding::Locked(held) = &self.binding {
            return Err(Error::SessionBusy {
                held: held.to_string(),
                requested: id.to_string(),
            });
        }

        self.acquire(conn, &id).await?;
        self.binding = Binding::Locked(id.clone());

        // The entry must exist from the first read on, even if nothing is
        // ever written, so that collision checks see it.
        let key = conn.layout.entry_key(&id);
        conn.backend.touch(&key, self.config.entry_ttl()).await?;
        conn.backend.read(&key).await
    }

    async fn write(&mut self, id: &str, data: &[u8]) -> Result<bool> {
        let conn = self.conn.as_ref().ok_or(Error::NotOpen)?;
        let Some(id) = SessionId::parse(id) else {
            return Ok(false);
        };
        match self.hold(&id) {
            Hold::Locked => {}
            Hold::Released | Hold::Destroyed => return Err(Error::LockNotHeld(id.to_string())),
            Hold::Unrelated => return Ok(false),
        }

        let written = conn
            .backend
            .write(&conn.layout.entry_key(&id), data, self.config.entry_ttl())
            .await;
        let released = conn.locks.release(&id).await;
        self.binding = Binding::Released(id);

        let written = written?;
        released?;
        Ok(written)
    }

    async fn destroy(&mut self, id: &str) -> Result<bool> {
        let conn = self.conn.as_ref().ok_or(Error::NotOpen)?;
        let Some(id) = SessionId::parse(id) else {
            return Ok(false);
        };
        match self.hold(&id) {
            Hold::Locked => {}
            Hold::Released => {
                self.acquire(conn, &id).await?;
                self.binding = Binding::Locked(id.clone());
            }
            // Already gone; touching the backend again could delete an entry
            // somebody else has created since.
            Hold::Destroyed => return Ok(true),
            Hold::Unrelated => return Ok(false),
        }

        let deleted = conn.backend.delete(&conn.layout.entry_key(&id)).await;
        let released = conn.locks.release(&id).await;
        self.binding = Binding::Destroyed(id);

        deleted?;
        released?;
        Ok(true)
    }

    async fn gc(&mut self, max_lifetime: Duration) -> Result<usize> {
        let conn = self.conn.as_ref().ok_or(Error::NotOpen)?;
        conn.sweeper.collect(max_lifetime).await
    }

    async fn create_sid(&mut self) -> Result<SessionId> {
        let conn = self.conn.as_ref().ok_or(Error::NotOpen)?;
        conn.ids.generate().await
    }

    async fn validate_id(&mut self, id: &str) -> Result<bool> {
        let conn = self.conn.as_ref().ok_or(Error::NotOpen)?;
        let Some(id) = SessionId::parse(id) else {
            return Ok(false);
        };
        conn.backend.exists(&conn.layout.entry_key(&id)).await
    }

    async fn update_timestamp(&mut self, id: &str, _data: &[u8]) -> Result<bool> {
        let conn = self.conn.as_ref().ok_or(Error::NotOpen)?;
        let Some(id) = SessionId::parse(id) else {
            return Ok(false);
        };
        match self.hold(&id) {
            Hold::Locked => {}
            Hold::Released | Hold::Destroyed => return Err(Error::LockNotHeld(id.to_string())),
            Hold::Unrelated => return Ok(false),
        }
        if !conn.locks.is_locked(&id).await? {
            warn!(session = %id, "lock marker disappeared while held");
            self.binding = Binding::Released(id.clone());
            return Err(Error::LockNotHeld(id.to_string()));
        }

        let touched = conn
            .backend
            .touch(&conn.layout.entry_key(&id), self.config.entry_ttl())
            .await;
        let released = conn.locks.release(&id).await;
        self.binding = Binding::Released(id);

        let touched = touched?;
        released?;
        Ok(touched)
    }
}

impl Drop for SessionStore {
    fn drop(&mut self) {
        if let Binding::Locked(id) = &self.binding {
            if self.conn.is_some() {
                warn!(session = %id, "session store dropped while holding its lock");
            }
        }
    }
}
