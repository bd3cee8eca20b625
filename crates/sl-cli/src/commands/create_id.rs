use anyhow::Result;
use sl_core::StoreConfig;
use sl_store::SessionHandler;

pub async fn run(config: &StoreConfig, log_calls: bool) -> Result<()> {
    let mut store = super::open_store(config, log_calls).await?;
    let id = store.create_sid().await?;
    store.close().await?;
    println!("{id}");
    Ok(())
}
