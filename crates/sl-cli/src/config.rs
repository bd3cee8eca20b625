use std::path::Path;

use anyhow::{Context, Result};
use sl_core::StoreConfig;

/// Layer command-line overrides on top of an optional config file.
pub fn resolve(
    path: Option<&Path>,
    save_path: Option<String>,
    namespace: Option<String>,
) -> Result<StoreConfig> {
    let mut config = match path {
        Some(path) => StoreConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => StoreConfig::default(),
    };
    if let Some(save_path) = save_path {
        config.save_path = save_path;
    }
    if let Some(namespace) = namespace {
        config.namespace = namespace;
    }
    config.validate().context("invalid configuration")?;
    Ok(config)
}
