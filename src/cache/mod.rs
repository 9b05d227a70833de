//! Cache Module
//!
//! Entry storage for one named cache: entries, TTL expiration, size-bound
//! eviction, value codecs and statistics.

pub mod codec;
mod config;
mod entry;
pub mod eviction;
pub mod expiration;
mod stats;
mod store;


// Re-export public types
pub use codec::{Codec, CodecPipeline, ZstdCodec};
pub use config::{CacheConfig, FetchStrategy, DEFAULT_MAX_SIZE};
pub use entry::{current_timestamp_ms, CacheEntry};
pub use stats::{CacheStats, EntryInfo, StatsCounters};
pub use store::EntryStore;

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;

/// Maximum allowed encoded value size in bytes
pub const MAX_VALUE_SIZE: usize = 1024 * 1024; // 1 MB
