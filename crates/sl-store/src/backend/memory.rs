//! In-process backend backed by `DashMap`.
//!
//! Clones share the same map, so several `SessionStore`s built from clones of
//! one `MemoryBackend` contend for locks exactly as separate processes would
//! against a shared directory.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use sl_core::{KeyStyle, Result};

use super::{Backend, ScannedKey};

struct Slot {
    data: Vec<u8>,
    modified: DateTime<Utc>,
}

impl Slot {
    fn empty() -> Self {
        Self {
            data: Vec::new(),
            modified: Utc::now(),
        }
    }
}

#[derive(Clone, Default)]
pub struct MemoryBackend {
    slots: Arc<DashMap<String, Slot>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backdate (or postdate) the modification time of an existing key.
    /// Returns `false` if the key does not exist.
    pub fn set_modified(&self, key: &str, at: DateTime<Utc>) -> bool {
        match self.slots.get_mut(key) {
            Some(mut slot) => {
                slot.modified = at;
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    fn key_style(&self) -> KeyStyle {
        KeyStyle::Cache
    }

    async fn create_exclusive(&self, key: &str) -> Result<bool> {
        match self.slots.entry(key.to_string()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(vacant) => {
                vacant.insert(Slot::empty());
                Ok(true)
            }
        }
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.slots.contains_key(key))
    }

    async fn read(&self, key: &str) -> Result<Vec<u8>> {
        Ok(self
            .slots
            .get(key)
            .map(|slot| slot.data.clone())
            .unwrap_or_default())
    }

    async fn write(&self, key: &str, data: &[u8], _ttl: Duration) -> Result<bool> {
        self.slots.insert(
            key.to_string(),
            Slot {
                data: data.to_vec(),
                modified: Utc::now(),
            },
        );
        Ok(true)
    }

    async fn touch(&self, key: &str, _ttl: Duration) -> Result<bool> {
        self.slots
            .entry(key.to_string())
            .and_modify(|slot| slot.modified = Utc::now())
            .or_insert_with(Slot::empty);
        Ok(true)
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        Ok(self.slots.remove(key).is_some())
    }

    async fn scan(&self, prefix: &str) -> Result<Vec<ScannedKey>> {
        Ok(self
            .slots
            .iter()
            .filter(|entry| entry.key().starts_with(prefix))
            .map(|entry| ScannedKey {
                key: entry.key().clone(),
                modified: entry.value().modified,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(60);

    #[tokio::test]
    async fn memory_backend_clones_share_state() {
        let a = MemoryBackend::new();
        let b = a.clone();

        assert!(a.create_exclusive("k-lock").await.unwrap());
        assert!(!b.create_exclusive("k-lock").await.unwrap());
        assert!(b.delete("k-lock").await.unwrap());
        assert!(a.create_exclusive("k-lock").await.unwrap());
    }

    #[tokio::test]
    async fn memory_backend_touch_keeps_content() {
        let backend = MemoryBackend::new();
        backend.write("k", b"v", TTL).await.unwrap();
        let old = Utc::now() - chrono::TimeDelta::hours(1);
        assert!(backend.set_modified("k", old));

        backend.touch("k", TTL).await.unwrap();
        assert_eq!(backend.read("k").await.unwrap(), b"v");
        let scanned = backend.scan("k").await.unwrap();
        assert!(scanned[0].modified > old);
    }

    #[tokio::test]
    async fn memory_backend_touch_creates_missing() {
        let backend = MemoryBackend::new();
        backend.touch("k", TTL).await.unwrap();
        assert!(backend.exists("k").await.unwrap());
        assert!(backend.read("k").await.unwrap().is_empty());
        assert!(!backend.set_modified("missing", Utc::now()));
    }

    #[tokio::test]
    async fn memory_backend_concurrent_create_has_single_winner() {
        let backend = MemoryBackend::new();
        let mut handles = Vec::new();
        for _ in 0..32 {
            let backend = backend.clone();
            handles.push(tokio::spawn(async move {
                backend.create_exclusive("contended").await.unwrap()
            }));
        }
        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }
}
