pub mod check;
pub mod create_id;
pub mod gc;

use anyhow::{Context, Result};
use sl_core::StoreConfig;
use sl_store::{LoggingHandler, SessionHandler, SessionStore};

/// Open a store on the configured backend, optionally logging every call.
pub async fn open_store(config: &StoreConfig, log_calls: bool) -> Result<Box<dyn SessionHandler>> {
    let store = SessionStore::new(config.clone());
    let mut handler: Box<dyn SessionHandler> = if log_calls {
        Box::new(LoggingHandler::new(store))
    } else {
        Box::new(store)
    };
    handler
        .open("", "")
        .await
        .with_context(|| format!("failed to open session store at {}", config.save_path))?;
    Ok(handler)
}
