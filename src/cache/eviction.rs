//! Eviction Module
//!
//! Keeps a backend within its configured entry bound.
//!
//! This is an approximate LRU driven by the `last_accessed_at` timestamps
//! stored on each entry instead of an ordered structure. A pass enumerates
//! the whole backend and sorts it, which is O(n log n), but a pass only runs
//! when a write pushed the backend over its bound.

use tracing::debug;

use crate::backend::{Backend, StorageResult};
use crate::cache::CacheEntry;

// == Select Victims ==
/// Picks the `excess` least recently accessed keys.
///
/// Ordering is ascending `(last_accessed_at, access_seq)`, so entries read or
/// written in the same millisecond still evict in a deterministic order.
pub fn select_victims(mut entries: Vec<CacheEntry>, excess: usize) -> Vec<String> {
    entries.sort_by_key(|e| (e.last_accessed_at, e.access_seq));
    entries.into_iter().take(excess).map(|e| e.key).collect()
}

// == Enforce Bound ==
/// Deletes least recently accessed entries until `backend.size() <= max_size`.
///
/// Returns the evicted keys in eviction order.
pub async fn enforce_bound(backend: &dyn Backend, max_size: usize) -> StorageResult<Vec<String>> {
    let size = backend.size().await?;
    if size <= max_size {
        return Ok(Vec::new());
    }

    let victims = select_victims(backend.list_all().await?, size - max_size);
    for key in &victims {
        backend.delete(key).await?;
        debug!(key = %key, backend = %backend.kind(), "evicted entry");
    }

    Ok(victims)
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;

    fn entry(key: &str, last_accessed_at: u64, access_seq: u64) -> CacheEntry {
        let mut e = CacheEntry::new_at(key, Vec::new(), 0, access_seq, 0);
        e.last_accessed_at = last_accessed_at;
        e
    }

    #[test]
    fn test_select_oldest_access_first() {
        let entries = vec![entry("c", 30, 3), entry("a", 10, 1), entry("b", 20, 2)];
        assert_eq!(select_victims(entries, 2), vec!["a", "b"]);
    }

    #[test]
    fn test_ties_broken_by_sequence() {
        let entries = vec![entry("late", 5, 9), entry("early", 5, 2)];
        assert_eq!(select_victims(entries, 1), vec!["early"]);
    }

    #[test]
    fn test_select_zero_excess() {
        assert!(select_victims(vec![entry("a", 1, 1)], 0).is_empty());
    }

    #[tokio::test]
    async fn test_enforce_bound_within_limit_is_noop() {
        let backend = MemoryBackend::new();
        backend.set("a", entry("a", 1, 1)).await.unwrap();

        let evicted = enforce_bound(&backend, 1).await.unwrap();
        assert!(evicted.is_empty());
        assert_eq!(backend.size().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_enforce_bound_trims_to_max() {
        let backend = MemoryBackend::new();
        for (i, key) in ["a", "b", "c", "d"].iter().enumerate() {
            backend.set(key, entry(key, 100, i as u64)).await.unwrap();
        }

        let evicted = enforce_bound(&backend, 2).await.unwrap();
        assert_eq!(evicted, vec!["a", "b"]);
        assert_eq!(backend.size().await.unwrap(), 2);
        assert!(backend.get("c").await.unwrap().is_some());
        assert!(backend.get("d").await.unwrap().is_some());
    }
}
