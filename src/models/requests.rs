//! Request DTOs for the cache server API
//!
//! Defines the structure of incoming HTTP request bodies.

use std::time::Duration;

use serde::Deserialize;

use crate::backend::BackendKind;
use crate::cache::{CacheConfig, FetchStrategy};

/// Request body for creating a cache (POST /caches)
///
/// Omitted policy fields fall back to the server defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCacheRequest {
    pub name: String,
    #[serde(default)]
    pub backend: BackendKind,
    #[serde(default)]
    pub max_size: Option<usize>,
    #[serde(default)]
    pub default_ttl_ms: Option<u64>,
    #[serde(default)]
    pub strategy: FetchStrategy,
    #[serde(default)]
    pub compression_enabled: bool,
    #[serde(default)]
    pub encryption_enabled: bool,
}

impl CreateCacheRequest {
    /// Builds the cache config, filling gaps from the server defaults.
    pub fn into_config(self, default_max_size: usize, default_ttl_ms: u64) -> CacheConfig {
        CacheConfig::new(self.name)
            .with_backend(self.backend)
            .with_max_size(self.max_size.unwrap_or(default_max_size))
            .with_default_ttl(Duration::from_millis(
                self.default_ttl_ms.unwrap_or(default_ttl_ms),
            ))
            .with_strategy(self.strategy)
            .with_compression(self.compression_enabled)
            .with_encryption(self.encryption_enabled)
    }
}

/// Request body for storing an entry (PUT /caches/:name/entries)
///
/// # Fields
/// - `key`: The cache key to store the value under
/// - `value`: Any JSON value
/// - `ttl_ms`: Optional TTL in milliseconds (uses the cache default if not specified)
#[derive(Debug, Clone, Deserialize)]
pub struct SetRequest {
    /// The cache key
    pub key: String,
    /// The value to store
    pub value: serde_json::Value,
    /// Optional TTL in milliseconds, 0 = never expires
    #[serde(default)]
    pub ttl_ms: Option<u64>,
}

impl SetRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.key.is_empty() {
            return Some("Key cannot be empty".to_string());
        }
        None
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl_ms.map(Duration::from_millis)
    }
}
