//! File-backed persistent adapter.
//!
//! Each cache is one JSON document mapping keys to entries. The document is
//! loaded on first access and rewritten atomically (temp file + rename) after
//! every mutation, so the file on disk always holds a complete snapshot.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use super::{Backend, BackendKind, StorageResult};
use crate::cache::CacheEntry;
use crate::error::StorageError;

type Document = HashMap<String, CacheEntry>;

// == File Backend ==
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
    kind: BackendKind,
    /// None until the document has been read from disk
    state: Mutex<Option<Document>>,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>, kind: BackendKind) -> Self {
        Self {
            path: path.into(),
            kind,
            state: Mutex::new(None),
        }
    }

    /// Location of the backing document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn error(&self, key: Option<&str>, message: impl Into<String>) -> StorageError {
        StorageError::new(self.kind, key, message)
    }

    async fn load(&self, key: Option<&str>) -> StorageResult<Document> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                self.error(key, format!("corrupt document {}: {}", self.path.display(), e))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(self.error(key, format!("read {}: {}", self.path.display(), e))),
        }
    }

    async fn persist(&self, doc: &Document, key: Option<&str>) -> StorageResult<()> {
        let bytes = serde_json::to_vec(doc).map_err(|e| self.error(key, e.to_string()))?;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.error(key, format!("create {}: {}", parent.display(), e)))?;
        }

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(|e| self.error(key, format!("write {}: {}", tmp.display(), e)))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| self.error(key, format!("rename {}: {}", tmp.display(), e)))?;

        debug!(path = %self.path.display(), entries = doc.len(), "persisted cache document");
        Ok(())
    }

    async fn loaded<'a>(
        &self,
        state: &'a mut Option<Document>,
        key: Option<&str>,
    ) -> StorageResult<&'a mut Document> {
        if state.is_none() {
            *state = Some(self.load(key).await?);
        }
        Ok(state.get_or_insert_with(HashMap::new))
    }

    /// Runs a read-only `op` against the loaded document.
    async fn read_document<T>(
        &self,
        key: Option<&str>,
        op: impl FnOnce(&Document) -> T,
    ) -> StorageResult<T> {
        let mut state = self.state.lock().await;
        let doc = self.loaded(&mut state, key).await?;
        Ok(op(doc))
    }

    /// Runs `op` against a copy of the document. If `op` reports a change, the
    /// copy is persisted and only then replaces the in-memory document, so a
    /// failed write leaves no trace.
    async fn write_document(
        &self,
        key: Option<&str>,
        op: impl FnOnce(&mut Document) -> bool,
    ) -> StorageResult<()> {
        let mut state = self.state.lock().await;
        let doc = self.loaded(&mut state, key).await?;

        let mut next = doc.clone();
        if op(&mut next) {
            self.persist(&next, key).await?;
            *doc = next;
        }
        Ok(())
    }
}

#[async_trait]
impl Backend for FileBackend {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    async fn get(&self, key: &str) -> StorageResult<Option<CacheEntry>> {
        self.read_document(Some(key), |doc| doc.get(key).cloned())
            .await
    }

    async fn set(&self, key: &str, entry: CacheEntry) -> StorageResult<()> {
        self.write_document(Some(key), |doc| {
            doc.insert(key.to_string(), entry);
            true
        })
        .await
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        self.write_document(Some(key), |doc| doc.remove(key).is_some())
            .await
    }

    async fn clear(&self) -> StorageResult<()> {
        self.write_document(None, |doc| {
            doc.clear();
            true
        })
        .await
    }

    async fn size(&self) -> StorageResult<usize> {
        self.read_document(None, |doc| doc.len()).await
    }

    async fn list_all(&self) -> StorageResult<Vec<CacheEntry>> {
        self.read_document(None, |doc| doc.values().cloned().collect())
            .await
    }
}
