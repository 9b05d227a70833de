//! Cache Entry Module
//!
//! Defines a stored entry together with its access metadata.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

// == Cache Entry ==
/// Represents a single cache entry with value and metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Key, unique within its cache
    pub key: String,
    /// The stored payload, after encoding
    pub value: Vec<u8>,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: u64,
    /// Time to live in milliseconds, 0 = never expires
    pub ttl_ms: u64,
    /// Successful reads since the entry was written
    pub hit_count: u64,
    /// Last successful read (Unix milliseconds), equals `created_at` until read
    pub last_accessed_at: u64,
    /// Store-wide monotonic stamp of the last write or read, breaks timestamp ties
    pub access_seq: u64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new entry stamped with the current time.
    pub fn new(key: impl Into<String>, value: Vec<u8>, ttl_ms: u64, access_seq: u64) -> Self {
        Self::new_at(key, value, ttl_ms, access_seq, current_timestamp_ms())
    }

    /// Creates a new entry as if written at `now` (Unix milliseconds).
    pub fn new_at(
        key: impl Into<String>,
        value: Vec<u8>,
        ttl_ms: u64,
        access_seq: u64,
        now: u64,
    ) -> Self {
        Self {
            key: key.into(),
            value,
            created_at: now,
            ttl_ms,
            hit_count: 0,
            last_accessed_at: now,
            access_seq,
        }
    }

    // == Touch ==
    /// Records a successful read.
    pub fn touch(&mut self, now: u64, access_seq: u64) {
        self.hit_count += 1;
        self.last_accessed_at = now;
        self.access_seq = access_seq;
    }

    /// Milliseconds since the entry was written.
    pub fn age_ms(&self, now: u64) -> u64 {
        now.saturating_sub(self.created_at)
    }

    // == Time To Live ==
    /// Returns remaining TTL in milliseconds, or None if the entry never expires.
    ///
    /// # Returns
    /// - `Some(0)` if the entry has expired (TTL elapsed)
    /// - `Some(remaining_ms)` if the entry has TTL and hasn't expired
    /// - `None` if the entry has no TTL (never expires)
    pub fn ttl_remaining_ms(&self, now: u64) -> Option<u64> {
        if self.ttl_ms == 0 {
            return None;
        }
        Some(self.ttl_ms.saturating_sub(self.age_ms(now)))
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_creation() {
        let entry = CacheEntry::new_at("k", b"v".to_vec(), 500, 7, 1_000);

        assert_eq!(entry.key, "k");
        assert_eq!(entry.created_at, 1_000);
        assert_eq!(entry.last_accessed_at, 1_000);
        assert_eq!(entry.hit_count, 0);
        assert_eq!(entry.access_seq, 7);
    }

    #[test]
    fn test_touch_updates_metadata() {
        let mut entry = CacheEntry::new_at("k", Vec::new(), 0, 1, 1_000);
        entry.touch(1_250, 9);
        entry.touch(1_300, 10);

        assert_eq!(entry.hit_count, 2);
        assert_eq!(entry.last_accessed_at, 1_300);
        assert_eq!(entry.access_seq, 10);
        assert_eq!(entry.created_at, 1_000);
    }

    #[test]
    fn test_ttl_remaining() {
        let entry = CacheEntry::new_at("k", Vec::new(), 10_000, 1, 0);

        assert_eq!(entry.ttl_remaining_ms(1_000), Some(9_000));
        assert_eq!(entry.ttl_remaining_ms(20_000), Some(0));
    }

    #[test]
    fn test_ttl_remaining_no_expiration() {
        let entry = CacheEntry::new_at("k", Vec::new(), 0, 1, 0);
        assert!(entry.ttl_remaining_ms(u64::MAX).is_none());
    }

    #[test]
    fn test_current_timestamp_is_monotonic_enough() {
        let a = current_timestamp_ms();
        let b = current_timestamp_ms();
        assert!(b >= a);
        assert!(a > 0);
    }
}
