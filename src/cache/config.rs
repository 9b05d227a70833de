//! Cache Configuration Module
//!
//! Identity and policy of one named cache.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::backend::BackendKind;
use crate::error::{CacheError, Result};

/// Default maximum number of entries per cache
pub const DEFAULT_MAX_SIZE: usize = 1000;

// == Fetch Strategy ==
/// How a value is obtained when read through a strategy entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FetchStrategy {
    /// Serve from cache, fetch on miss
    #[default]
    CacheFirst,
    /// Fetch first, fall back to cache when the fetch fails
    NetworkFirst,
    /// Always fetch, never touch the cache
    NetworkOnly,
    /// Serve from cache only, never fetch
    CacheOnly,
    /// Serve from cache immediately, refresh in the background
    StaleWhileRevalidate,
}

// == Cache Config ==
/// Configuration of one named cache.
///
/// Durations travel as milliseconds when serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Unique name within a registry
    pub name: String,
    #[serde(default)]
    pub backend: BackendKind,
    #[serde(default = "default_max_size")]
    pub max_size: usize,
    /// Zero means entries never expire
    #[serde(default, rename = "default_ttl_ms", with = "duration_ms")]
    pub default_ttl: Duration,
    /// Default strategy hint used by `CacheRegistry::resolve`
    #[serde(default)]
    pub strategy: FetchStrategy,
    #[serde(default)]
    pub compression_enabled: bool,
    #[serde(default)]
    pub encryption_enabled: bool,
}

fn default_max_size() -> usize {
    DEFAULT_MAX_SIZE
}

impl CacheConfig {
    // == Constructor ==
    /// Creates a memory-backed config with default policy.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            backend: BackendKind::default(),
            max_size: DEFAULT_MAX_SIZE,
            default_ttl: Duration::ZERO,
            strategy: FetchStrategy::default(),
            compression_enabled: false,
            encryption_enabled: false,
        }
    }

    pub fn with_backend(mut self, backend: BackendKind) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }

    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    pub fn with_strategy(mut self, strategy: FetchStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_compression(mut self, enabled: bool) -> Self {
        self.compression_enabled = enabled;
        self
    }

    pub fn with_encryption(mut self, enabled: bool) -> Self {
        self.encryption_enabled = enabled;
        self
    }

    // == Validate ==
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(CacheError::InvalidConfig(
                "Cache name cannot be empty".to_string(),
            ));
        }
        // Names become file names under the data directory
        let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.');
        if self.name.starts_with('.') || !self.name.chars().all(allowed) {
            return Err(CacheError::InvalidConfig(format!(
                "cache name '{}' may only contain ASCII letters, digits, '_', '-' and '.', and may not start with '.'",
                self.name.escape_debug()
            )));
        }
        if self.max_size == 0 {
            return Err(CacheError::InvalidConfig(format!(
                "max_size of cache '{}' must be positive",
                self.name
            )));
        }
        Ok(())
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
