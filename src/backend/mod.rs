//! Backend Module
//!
//! Pluggable storage adapters behind a uniform async CRUD contract.
//!
//! # Adapters
//! - `MemoryBackend`: process-lifetime HashMap storage
//! - `FileBackend`: JSON document per cache, written through to disk

mod file;
mod memory;

use std::fmt;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::cache::CacheEntry;
use crate::error::StorageError;

pub use file::FileBackend;
pub use memory::MemoryBackend;

/// Result type for backend operations.
pub type StorageResult<T> = std::result::Result<T, StorageError>;

// == Backend Kind ==
/// Storage technology behind a named cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendKind {
    #[default]
    Memory,
    Persistent,
    BrowserLocal,
    BrowserSession,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BackendKind::Memory => "memory",
            BackendKind::Persistent => "persistent",
            BackendKind::BrowserLocal => "browser-local",
            BackendKind::BrowserSession => "browser-session",
        };
        f.write_str(name)
    }
}

// == Backend Trait ==
/// Uniform storage contract implemented once per storage technology.
///
/// Deleting an absent key is a no-op. Every failure is reported as a
/// [`StorageError`] carrying the backend kind and the failing key.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Storage technology, used for error reporting.
    fn kind(&self) -> BackendKind;

    async fn get(&self, key: &str) -> StorageResult<Option<CacheEntry>>;

    async fn set(&self, key: &str, entry: CacheEntry) -> StorageResult<()>;

    async fn delete(&self, key: &str) -> StorageResult<()>;

    async fn clear(&self) -> StorageResult<()>;

    async fn size(&self) -> StorageResult<usize>;

    async fn list_all(&self) -> StorageResult<Vec<CacheEntry>>;
}

// == Backend Factory ==
/// Builds a fresh adapter for a named cache.
///
/// Every call must return a new instance; Entry Stores never share adapters.
pub trait BackendFactory: Send + Sync {
    fn create(&self, cache_name: &str, kind: BackendKind) -> Box<dyn Backend>;
}

/// Default mapping from [`BackendKind`] to the bundled adapters.
///
/// `Persistent` and `BrowserLocal` are durable and land on disk under
/// `data_dir`; `Memory` and `BrowserSession` live as long as the process.
#[derive(Debug, Clone)]
pub struct DefaultBackendFactory {
    data_dir: PathBuf,
}

impl DefaultBackendFactory {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }
}

impl BackendFactory for DefaultBackendFactory {
    fn create(&self, cache_name: &str, kind: BackendKind) -> Box<dyn Backend> {
        match kind {
            BackendKind::Memory | BackendKind::BrowserSession => {
                Box::new(MemoryBackend::with_kind(kind))
            }
            BackendKind::Persistent | BackendKind::BrowserLocal => {
                let file = format!("{}.{}.json", cache_name, kind);
                Box::new(FileBackend::new(self.data_dir.join(file), kind))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_kind_serde_names() {
        let json = serde_json::to_string(&BackendKind::BrowserSession).unwrap();
        assert_eq!(json, "\"browser-session\"");

        let kind: BackendKind = serde_json::from_str("\"browser-local\"").unwrap();
        assert_eq!(kind, BackendKind::BrowserLocal);
        assert_eq!(kind.to_string(), "browser-local");
    }

    #[test]
    fn test_factory_maps_kinds() {
        let dir = tempfile::tempdir().unwrap();
        let factory = DefaultBackendFactory::new(dir.path());

        assert_eq!(
            factory.create("a", BackendKind::Memory).kind(),
            BackendKind::Memory
        );
        assert_eq!(
            factory.create("a", BackendKind::BrowserSession).kind(),
            BackendKind::BrowserSession
        );
        assert_eq!(
            factory.create("a", BackendKind::Persistent).kind(),
            BackendKind::Persistent
        );
        assert_eq!(
            factory.create("a", BackendKind::BrowserLocal).kind(),
            BackendKind::BrowserLocal
        );
    }
}
