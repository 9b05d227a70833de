//! Expiration rule for cache entries.
//!
//! Expiration is lazy: nothing sweeps a backend on a timer unless the caller
//! asks for it ([`EntryStore::purge_expired`](crate::cache::EntryStore::purge_expired)).
//! A backend may therefore hold expired entries that no read has touched yet;
//! they are reported as `expired_items` in the cache statistics and removed by
//! the first read that finds them.

use crate::cache::CacheEntry;

/// Returns true once the entry's TTL has fully elapsed at `now` (Unix ms).
///
/// An entry with `ttl_ms == 0` never expires. The boundary is inclusive: at
/// exactly `created_at + ttl_ms` the entry is already expired.
pub fn is_expired(entry: &CacheEntry, now: u64) -> bool {
    entry.ttl_ms > 0 && entry.age_ms(now) >= entry.ttl_ms
}
