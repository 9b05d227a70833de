//! In-memory backend adapter.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{Backend, BackendKind, StorageResult};
use crate::cache::CacheEntry;

// == Memory Backend ==
/// HashMap storage that lives as long as the process.
#[derive(Debug)]
pub struct MemoryBackend {
    entries: RwLock<HashMap<String, CacheEntry>>,
    kind: BackendKind,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::with_kind(BackendKind::Memory)
    }

    /// Creates a memory backend that reports itself as `kind`.
    ///
    /// Used for session-scoped storage, which has the same lifetime as the process.
    pub fn with_kind(kind: BackendKind) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            kind,
        }
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    async fn get(&self, key: &str) -> StorageResult<Option<CacheEntry>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, entry: CacheEntry) -> StorageResult<()> {
        self.entries.write().await.insert(key.to_string(), entry);
        Ok(())
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn clear(&self) -> StorageResult<()> {
        self.entries.write().await.clear();
        Ok(())
    }

    async fn size(&self) -> StorageResult<usize> {
        Ok(self.entries.read().await.len())
    }

    async fn list_all(&self) -> StorageResult<Vec<CacheEntry>> {
        Ok(self.entries.read().await.values().cloned().collect())
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn entry(key: &str) -> CacheEntry {
        CacheEntry::new(key, b"v".to_vec(), 0, 1)
    }

    #[tokio::test]
    async fn test_memory_crud() {
        let backend = MemoryBackend::new();

        backend.set("a", entry("a")).await.unwrap();
        backend.set("b", entry("b")).await.unwrap();
        assert_eq!(backend.size().await.unwrap(), 2);
        assert_eq!(backend.get("a").await.unwrap().unwrap().key, "a");

        backend.delete("a").await.unwrap();
        assert!(backend.get("a").await.unwrap().is_none());
        assert_eq!(backend.list_all().await.unwrap().len(), 1);

        backend.clear().await.unwrap();
        assert_eq!(backend.size().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_memory_delete_absent_is_noop() {
        let backend = MemoryBackend::new();
        assert!(backend.delete("missing").await.is_ok());
        assert!(backend.delete("missing").await.is_ok());
    }
}
