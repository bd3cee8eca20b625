use std::sync::Arc;

use sl_core::{KeyLayout, Result, SessionId};
use tracing::warn;

use crate::backend::Backend;

/// Issues session ids that do not collide with any existing entry.
pub struct IdGenerator {
    backend: Arc<dyn Backend>,
    layout: KeyLayout,
}

impl IdGenerator {
    pub fn new(backend: Arc<dyn Backend>, layout: KeyLayout) -> Self {
        Self { backend, layout }
    }

    /// Draw random ids until one has no entry in the backend.
    ///
    /// There is no retry cap; with 128 random bits a second draw is already
    /// a curiosity.
    pub async fn generate(&self) -> Result<SessionId> {
        loop {
            let id = SessionId::random();
            if !self.backend.exists(&self.layout.entry_key(&id)).await? {
                return Ok(id);
            }
            warn!(session = %id, "generated session id collides with an existing entry");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use sl_core::KeyStyle;
    use std::collections::HashSet;
    use std::time::Duration;

    #[tokio::test]
    async fn generated_ids_are_unique_and_free() {
        let backend = MemoryBackend::new();
        let layout = KeyLayout::new(KeyStyle::Cache, "app");
        let ids = IdGenerator::new(Arc::new(backend.clone()), layout.clone());

        let mut seen = HashSet::new();
        for _ in 0..100 {
            let id = ids.generate().await.unwrap();
            assert!(!backend.exists(&layout.entry_key(&id)).await.unwrap());
            backend
                .write(&layout.entry_key(&id), b"", Duration::from_secs(60))
                .await
                .unwrap();
            assert!(seen.insert(id));
        }
    }
}
