use std::time::Duration;

use thiserror::Error;

/// Fatal outcomes of a session operation.
///
/// Validation rejections (malformed id, id not bound to the store) are not
/// errors: they surface as `Ok(false)` or empty content. Anything returned as
/// `Err` means the operation failed and must not be mistaken for "no data".
#[derive(Error, Debug)]
pub enum Error {
    #[error("Session store is not open")]
    NotOpen,

    #[error("Session {requested} cannot be read while {held} is locked by this store")]
    SessionBusy { held: String, requested: String },

    #[error("Timed out after {waited:?} ({attempts} attempts) waiting for lock on session {id}")]
    LockTimeout {
        id: String,
        attempts: u32,
        waited: Duration,
    },

    #[error("Lock for session {0} is not held by this store")]
    LockNotHeld(String),

    #[error("Unsupported save path: {0}")]
    UnsupportedSavePath(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
