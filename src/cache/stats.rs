//! Cache Statistics Module
//!
//! Tracks read outcomes and builds per-cache snapshots from backend contents.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::cache::expiration::is_expired;
use crate::cache::CacheEntry;

// == Counters ==
/// Running counters of one Entry Store.
#[derive(Debug, Default)]
pub struct StatsCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl StatsCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Counts a read that found no usable entry (absent or expired).
    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_evictions(&self, count: usize) {
        self.evictions.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn evictions(&self) -> u64 {
        self.evictions.load(Ordering::Relaxed)
    }
}

// == Entry Info ==
/// Per-entry line of a statistics snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryInfo {
    pub key: String,
    pub hit_count: u64,
    pub age_ms: u64,
    pub ttl_ms: u64,
    pub created_at: u64,
    pub last_accessed_at: u64,
    /// Expired but not yet reaped by a read
    pub expired: bool,
}

impl EntryInfo {
    fn from_entry(entry: &CacheEntry, now: u64) -> Self {
        Self {
            key: entry.key.clone(),
            hit_count: entry.hit_count,
            age_ms: entry.age_ms(now),
            ttl_ms: entry.ttl_ms,
            created_at: entry.created_at,
            last_accessed_at: entry.last_accessed_at,
            expired: is_expired(entry, now),
        }
    }
}

// == Cache Stats ==
/// Snapshot of one named cache.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub name: String,
    /// Entries physically present in the backend, expired ones included
    pub total_items: usize,
    pub max_size: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    /// hits / (hits + misses), 0.0 before the first read
    pub hit_rate: f64,
    /// Mean of per-entry hit counters over the entries currently stored
    pub average_hits_per_entry: f64,
    /// Entries whose TTL elapsed but that no read has reaped yet
    pub expired_items: usize,
    /// Entry with the smallest `created_at`
    pub oldest_entry: Option<EntryInfo>,
    /// Entry with the largest `created_at`
    pub newest_entry: Option<EntryInfo>,
    /// Sorted by key
    pub entries: Vec<EntryInfo>,
}

impl CacheStats {
    // == Build ==
    /// Builds a snapshot from backend contents at time `now`.
    pub fn build(
        name: &str,
        max_size: usize,
        counters: &StatsCounters,
        entries: &[CacheEntry],
        now: u64,
    ) -> Self {
        let mut infos: Vec<EntryInfo> = entries
            .iter()
            .map(|e| EntryInfo::from_entry(e, now))
            .collect();
        infos.sort_by(|a, b| a.key.cmp(&b.key));

        let hits = counters.hits();
        let misses = counters.misses();
        let total_hits: u64 = infos.iter().map(|e| e.hit_count).sum();

        Self {
            name: name.to_string(),
            total_items: infos.len(),
            max_size,
            hits,
            misses,
            evictions: counters.evictions(),
            hit_rate: ratio(hits, hits + misses),
            average_hits_per_entry: ratio(total_hits, infos.len() as u64),
            expired_items: infos.iter().filter(|e| e.expired).count(),
            oldest_entry: infos
                .iter()
                .min_by_key(|e| (e.created_at, e.key.clone()))
                .cloned(),
            newest_entry: infos
                .iter()
                .max_by_key(|e| (e.created_at, e.key.clone()))
                .cloned(),
            entries: infos,
        }
    }
}

fn ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}
