pub mod config;
pub mod error;
pub mod types;

pub use config::StoreConfig;
pub use error::{Error, Result};
pub use types::{KeyLayout, KeyStyle, SessionId, SESSION_ID_LEN};
