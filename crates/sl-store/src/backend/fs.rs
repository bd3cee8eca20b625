//! Directory-backed storage.
//!
//! Entries are plain files. Locks are directories: `mkdir` is atomic on
//! local and network filesystems alike, which `flock` is not.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sl_core::{Error, KeyStyle, Result};

use super::{Backend, ScannedKey};

/// Local (or shared) filesystem backend rooted at one directory.
pub struct FileBackend {
    root: PathBuf,
}

impl FileBackend {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Like [`FileBackend::new`] but fails unless `root` is an existing
    /// directory.
    pub async fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let meta = tokio::fs::metadata(&root).await?;
        if !meta.is_dir() {
            return Err(Error::UnsupportedSavePath(format!(
                "{} is not a directory",
                root.display()
            )));
        }
        Ok(Self::new(root))
    }

    fn path(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

#[async_trait]
impl Backend for FileBackend {
    fn key_style(&self) -> KeyStyle {
        KeyStyle::Files
    }

    async fn create_exclusive(&self, key: &str) -> Result<bool> {
        match tokio::fs::create_dir(self.path(key)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(tokio::fs::try_exists(self.path(key)).await?)
    }

    async fn read(&self, key: &str) -> Result<Vec<u8>> {
        match tokio::fs::read(self.path(key)).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, key: &str, data: &[u8], _ttl: Duration) -> Result<bool> {
        tokio::fs::write(self.path(key), data).await?;
        Ok(true)
    }

    async fn touch(&self, key: &str, _ttl: Duration) -> Result<bool> {
        let path = self.path(key);
        tokio::task::spawn_blocking(move || -> std::io::Result<()> {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .truncate(false)
                .write(true)
                .open(&path)?;
            file.set_modified(SystemTime::now())
        })
        .await
        .map_err(|e| Error::Backend(format!("touch task failed: {e}")))??;
        Ok(true)
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let path = self.path(key);
        let meta = match tokio::fs::symlink_metadata(&path).await {
            Ok(meta) => meta,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e.into()),
        };
        let removed = if meta.is_dir() {
            tokio::fs::remove_dir(&path).await
        } else {
            tokio::fs::remove_file(&path).await
        };
        match removed {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn scan(&self, prefix: &str) -> Result<Vec<ScannedKey>> {
        let mut keys = Vec::new();
        let mut read_dir = tokio::fs::read_dir(&self.root).await?;
        while let Some(entry) = read_dir.next_entry().await? {
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if !name.starts_with(prefix) {
                continue;
            }
            // Entries can vanish between listing and stat.
            let meta = match entry.metadata().await {
                Ok(meta) => meta,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };
            if !meta.is_file() {
                continue;
            }
            keys.push(ScannedKey {
                key: name,
                modified: DateTime::<Utc>::from(meta.modified()?),
            });
        }
        Ok(keys)
    }
}
