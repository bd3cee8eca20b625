//! Exclusive-lock session storage.
//!
//! A [`SessionStore`] runs the per-session lifecycle (open, read, write,
//! destroy, close, update_timestamp) against any [`Backend`] that can create
//! a key atomically. Reading a session locks it; writing, destroying,
//! refreshing or closing releases the lock. Concurrent stores, in one process
//! or many, coordinate only through those lock markers.

pub mod backend;
pub mod gc;
pub mod handler;
pub mod lock;
pub mod logging;
pub mod sid;
pub mod store;

pub use backend::{connect, Backend, FileBackend, MemoryBackend, ScannedKey};
#[cfg(feature = "redis")]
pub use backend::RedisBackend;
pub use gc::GcSweeper;
pub use handler::SessionHandler;
pub use lock::{Acquisition, LockManager};
pub use logging::LoggingHandler;
pub use sid::IdGenerator;
pub use store::{Binding, SessionStore};
