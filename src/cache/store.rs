//! Entry Store Module
//!
//! Full read/write lifecycle of one named cache on top of its backend adapter:
//! encoding, TTL checks on read, hit bookkeeping and eviction after writes.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use crate::backend::Backend;
use crate::cache::codec::CodecPipeline;
use crate::cache::entry::current_timestamp_ms;
use crate::cache::eviction::enforce_bound;
use crate::cache::expiration::is_expired;
use crate::cache::stats::{CacheStats, StatsCounters};
use crate::cache::{CacheConfig, CacheEntry, MAX_KEY_LENGTH, MAX_VALUE_SIZE};
use crate::error::{CacheError, Result};

// == Entry Store ==
/// One named cache. Exclusively owns its backend adapter.
pub struct EntryStore {
    config: CacheConfig,
    backend: Box<dyn Backend>,
    codecs: CodecPipeline,
    counters: StatsCounters,
    access_seq: AtomicU64,
    /// Serializes read-modify-write of entry metadata against writes, so a
    /// read's hit bookkeeping never overwrites a newer value
    write_lock: Mutex<()>,
}

impl EntryStore {
    // == Constructor ==
    pub fn new(config: CacheConfig, backend: Box<dyn Backend>, codecs: CodecPipeline) -> Self {
        Self {
            config,
            backend,
            codecs,
            counters: StatsCounters::new(),
            access_seq: AtomicU64::new(0),
            write_lock: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    fn next_seq(&self) -> u64 {
        self.access_seq.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn effective_ttl_ms(&self, ttl: Option<Duration>) -> u64 {
        ttl.unwrap_or(self.config.default_ttl).as_millis() as u64
    }

    fn validate_key(key: &str) -> Result<()> {
        if key.is_empty() {
            return Err(CacheError::InvalidRequest(
                "Key cannot be empty".to_string(),
            ));
        }
        if key.len() > MAX_KEY_LENGTH {
            return Err(CacheError::InvalidRequest(format!(
                "Key exceeds maximum length of {} bytes",
                MAX_KEY_LENGTH
            )));
        }
        Ok(())
    }

    // == Put ==
    /// Encodes and stores `value` under `key`, then enforces the size bound.
    ///
    /// Overwriting a key resets its timestamps and hit counter. `ttl` of
    /// `None` applies the cache's default TTL; `Some(Duration::ZERO)` stores
    /// an entry that never expires.
    pub async fn put<V: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &V,
        ttl: Option<Duration>,
    ) -> Result<()> {
        Self::validate_key(key)?;

        let bytes = self.codecs.encode(value)?;
        if bytes.len() > MAX_VALUE_SIZE {
            return Err(CacheError::InvalidRequest(format!(
                "Value exceeds maximum size of {} bytes",
                MAX_VALUE_SIZE
            )));
        }

        let _guard = self.write_lock.lock().await;
        let entry = CacheEntry::new(key, bytes, self.effective_ttl_ms(ttl), self.next_seq());
        self.backend.set(key, entry).await?;

        // Under the lock so concurrent writers never pick the same victims
        let evicted = enforce_bound(self.backend.as_ref(), self.config.max_size).await?;
        if !evicted.is_empty() {
            self.counters.record_evictions(evicted.len());
            debug!(cache = %self.config.name, evicted = evicted.len(), "size bound enforced");
        }

        Ok(())
    }

    // == Fetch Entry ==
    /// Reads and decodes the value under `key`.
    ///
    /// Returns `None` when the key is absent or expired; an expired entry is
    /// deleted before returning. A hit increments the entry's hit counter and
    /// refreshes its last-access time in the backend.
    pub async fn fetch_entry<V: DeserializeOwned>(&self, key: &str) -> Result<Option<V>> {
        let bytes = {
            let _guard = self.write_lock.lock().await;

            let Some(mut entry) = self.backend.get(key).await? else {
                self.counters.record_miss();
                return Ok(None);
            };

            let now = current_timestamp_ms();
            if is_expired(&entry, now) {
                self.backend.delete(key).await?;
                self.counters.record_miss();
                debug!(cache = %self.config.name, key = %key, "reaped expired entry");
                return Ok(None);
            }

            entry.touch(now, self.next_seq());
            let bytes = entry.value.clone();
            self.backend.set(key, entry).await?;
            bytes
        };

        self.counters.record_hit();
        Ok(Some(self.codecs.decode(bytes)?))
    }

    // == Contains Fresh ==
    /// Returns true if an unexpired entry exists, without recording a hit.
    ///
    /// An expired entry found here is reaped like on a normal read.
    pub async fn contains_fresh(&self, key: &str) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let Some(entry) = self.backend.get(key).await? else {
            return Ok(false);
        };
        if is_expired(&entry, current_timestamp_ms()) {
            self.backend.delete(key).await?;
            return Ok(false);
        }
        Ok(true)
    }

    // == Remove ==
    /// Deletes `key`. Deleting an absent key is not an error.
    pub async fn remove(&self, key: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.backend.delete(key).await?;
        Ok(())
    }

    // == Clear ==
    pub async fn clear(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.backend.clear().await?;
        Ok(())
    }

    // == Length ==
    /// Entries physically present, expired-but-unread ones included.
    pub async fn len(&self) -> Result<usize> {
        Ok(self.backend.size().await?)
    }

    pub async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    // == Stats ==
    pub async fn stats(&self) -> Result<CacheStats> {
        let entries = self.backend.list_all().await?;
        Ok(CacheStats::build(
            &self.config.name,
            self.config.max_size,
            &self.counters,
            &entries,
            current_timestamp_ms(),
        ))
    }

    // == Purge Expired ==
    /// Removes every expired entry. Returns the number removed.
    pub async fn purge_expired(&self) -> Result<usize> {
        let _guard = self.write_lock.lock().await;
        let now = current_timestamp_ms();

        let expired: Vec<String> = self
            .backend
            .list_all()
            .await?
            .into_iter()
            .filter(|e| is_expired(e, now))
            .map(|e| e.key)
            .collect();

        for key in &expired {
            self.backend.delete(key).await?;
        }
        Ok(expired.len())
    }
}

impl std::fmt::Debug for EntryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntryStore")
            .field("config", &self.config)
            .field("backend", &self.backend.kind())
            .field("codecs", &self.codecs)
            .finish()
    }
}
