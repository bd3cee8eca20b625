use anyhow::Result;
use sl_core::{SessionId, StoreConfig};
use sl_store::SessionHandler;

/// Report whether `id` is well-formed and names an existing entry.
///
/// Never takes the session lock, so it is safe to run against a live store.
pub async fn run(config: &StoreConfig, log_calls: bool, id: &str) -> Result<()> {
    if SessionId::parse(id).is_none() {
        println!("{id}: malformed");
        return Ok(());
    }
    let mut store = super::open_store(config, log_calls).await?;
    let in_use = store.validate_id(id).await?;
    store.close().await?;
    println!("{id}: {}", if in_use { "in use" } else { "free" });
    Ok(())
}
