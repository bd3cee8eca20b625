//! Store configuration.
//!
//! Everything the lock protocol needs from its host is carried in one
//! [`StoreConfig`] value handed to the store at construction time. It can be
//! built in code or loaded from a TOML file:
//!
//! ```toml
//! save_path = "/var/lib/sessions"
//! namespace = "shop"
//! max_execution_time = 30
//! poll_interval_ms = 20
//! entry_ttl_seconds = 1440
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Lock-acquire budget used when `max_execution_time` is zero.
pub const DEFAULT_MAX_EXECUTION_TIME_SECS: u64 = 30;

/// Delay between two lock attempts.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 20;

/// Entry lifetime used for cache TTLs and garbage collection (24 minutes).
pub const DEFAULT_ENTRY_TTL_SECS: u64 = 1440;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Backend location: a directory, `file://<dir>`, `memory:` or a
    /// `redis://` connection string.
    pub save_path: String,

    /// Prefix separating applications that share one backend.
    pub namespace: String,

    /// Lock-acquire budget in seconds. Zero falls back to 30.
    pub max_execution_time: u64,

    pub poll_interval_ms: u64,

    pub entry_ttl_seconds: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            save_path: std::env::temp_dir().to_string_lossy().into_owned(),
            namespace: String::new(),
            max_execution_time: DEFAULT_MAX_EXECUTION_TIME_SECS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            entry_ttl_seconds: DEFAULT_ENTRY_TTL_SECS,
        }
    }
}

impl StoreConfig {
    pub fn new(save_path: impl Into<String>) -> Self {
        Self {
            save_path: save_path.into(),
            ..Self::default()
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn with_max_execution_time(mut self, secs: u64) -> Self {
        self.max_execution_time = secs;
        self
    }

    pub fn with_poll_interval_ms(mut self, ms: u64) -> Self {
        self.poll_interval_ms = ms;
        self
    }

    pub fn with_entry_ttl_seconds(mut self, secs: u64) -> Self {
        self.entry_ttl_seconds = secs;
        self
    }

    /// How long `read` may poll for a lock before giving up.
    pub fn lock_timeout(&self) -> Duration {
        match self.max_execution_time {
            0 => Duration::from_secs(DEFAULT_MAX_EXECUTION_TIME_SECS),
            secs => Duration::from_secs(secs),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn entry_ttl(&self) -> Duration {
        Duration::from_secs(self.entry_ttl_seconds)
    }

    pub fn validate(&self) -> Result<()> {
        if self.save_path.trim().is_empty() {
            return Err(Error::Config("save_path must not be empty".into()));
        }
        if self.poll_interval_ms == 0 {
            return Err(Error::Config("poll_interval_ms must be positive".into()));
        }
        validate_namespace(&self.namespace)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| Error::Config(format!("failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}

/// Namespaces end up inside file names and cache keys, so only a
/// conservative alphabet is accepted.
pub fn validate_namespace(namespace: &str) -> Result<()> {
    let ok = namespace
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if ok {
        Ok(())
    } else {
        Err(Error::Config(format!(
            "namespace {namespace:?} may only contain ASCII letters, digits, '_' and '-'"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StoreConfig::default();
        assert_eq!(config.lock_timeout(), Duration::from_secs(30));
        assert_eq!(config.poll_interval(), Duration::from_millis(20));
        assert_eq!(config.entry_ttl(), Duration::from_secs(1440));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_execution_time_falls_back() {
        let config = StoreConfig::new("/tmp").with_max_execution_time(0);
        assert_eq!(config.lock_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_from_toml_partial_uses_defaults() {
        let config = StoreConfig::from_toml_str(
            r#"
            save_path = "redis://127.0.0.1:6379"
            namespace = "shop"
            poll_interval_ms = 100
            "#,
        )
        .unwrap();
        assert_eq!(config.save_path, "redis://127.0.0.1:6379");
        assert_eq!(config.namespace, "shop");
        assert_eq!(config.poll_interval(), Duration::from_millis(100));
        assert_eq!(config.entry_ttl_seconds, DEFAULT_ENTRY_TTL_SECS);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(StoreConfig::from_toml_str("poll_interval_ms = 0").is_err());
        assert!(StoreConfig::from_toml_str("namespace = \"a/b\"").is_err());
        assert!(StoreConfig::from_toml_str("save_path = \"\"").is_err());
        assert!(StoreConfig::from_toml_str("save_path = [").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sesslock.toml");
        std::fs::write(&path, "namespace = \"app\"\nentry_ttl_seconds = 60\n").unwrap();

        let config = StoreConfig::load(&path).unwrap();
        assert_eq!(config.namespace, "app");
        assert_eq!(config.entry_ttl(), Duration::from_secs(60));
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = StoreConfig::load(&dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
