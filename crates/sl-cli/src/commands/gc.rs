use std::time::Duration;

use anyhow::Result;
use sl_core::StoreConfig;
use sl_store::SessionHandler;
use tracing::info;

pub async fn run(
    config: &StoreConfig,
    log_calls: bool,
    ttl: Option<u64>,
    watch: Option<u64>,
) -> Result<()> {
    let ttl = ttl.map(Duration::from_secs).unwrap_or_else(|| config.entry_ttl());
    let mut store = super::open_store(config, log_calls).await?;

    let Some(every) = watch else {
        let removed = store.gc(ttl).await?;
        store.close().await?;
        println!("{removed}");
        return Ok(());
    };

    let mut ticker = tokio::time::interval(Duration::from_secs(every.max(1)));
    info!(ttl_secs = ttl.as_secs(), every_secs = every.max(1), "watching session store");
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let removed = store.gc(ttl).await?;
                println!("{removed}");
            }
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted, stopping sweeper");
                break;
            }
        }
    }
    store.close().await?;
    Ok(())
}
