//! Cache Registry Module
//!
//! Owns every named cache of an application. One registry is constructed at
//! startup and shared by reference (usually `Arc<CacheRegistry>`); there is no
//! global instance.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use serde::{de::DeserializeOwned, Serialize};
use tracing::{info, warn};

use crate::backend::{BackendFactory, DefaultBackendFactory};
use crate::cache::{CacheConfig, CacheStats, Codec, CodecPipeline, EntryStore, ZstdCodec};
use crate::error::{CacheError, Result};
use crate::strategy::InFlight;

// == Cache Registry ==
pub struct CacheRegistry {
    caches: RwLock<HashMap<String, Arc<EntryStore>>>,
    factory: Arc<dyn BackendFactory>,
    compression: Arc<dyn Codec>,
    encryption: Option<Arc<dyn Codec>>,
    pub(crate) in_flight: InFlight,
}

impl CacheRegistry {
    // == Constructor ==
    /// Creates a registry that builds adapters through `factory`.
    ///
    /// Compression defaults to zstd; no encryption codec is installed.
    pub fn new(factory: Arc<dyn BackendFactory>) -> Self {
        Self {
            caches: RwLock::new(HashMap::new()),
            factory,
            compression: Arc::new(ZstdCodec::default()),
            encryption: None,
            in_flight: InFlight::default(),
        }
    }

    /// Creates a registry using the bundled adapters, storing durable caches under `data_dir`.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self::new(Arc::new(DefaultBackendFactory::new(data_dir)))
    }

    pub fn with_compression_codec(mut self, codec: Arc<dyn Codec>) -> Self {
        self.compression = codec;
        self
    }

    pub fn with_encryption_codec(mut self, codec: Arc<dyn Codec>) -> Self {
        self.encryption = Some(codec);
        self
    }

    // == Create Cache ==
    /// Registers a named cache and builds its backend.
    ///
    /// Idempotent: if the name is taken the existing config is returned
    /// unchanged and the new one is ignored.
    pub fn create_cache(&self, config: CacheConfig) -> Result<CacheConfig> {
        config.validate()?;
        if config.encryption_enabled && self.encryption.is_none() {
            return Err(CacheError::InvalidConfig(format!(
                "cache '{}' enables encryption but no encryption codec is installed",
                config.name
            )));
        }

        let mut caches = self.caches.write();
        if let Some(existing) = caches.get(&config.name) {
            if existing.config() != &config {
                warn!(cache = %config.name, "cache already exists, keeping original config");
            }
            return Ok(existing.config().clone());
        }

        let codecs = CodecPipeline::new(
            config.compression_enabled.then(|| self.compression.clone()),
            if config.encryption_enabled {
                self.encryption.clone()
            } else {
                None
            },
        );
        let backend = self.factory.create(&config.name, config.backend);
        let store = EntryStore::new(config.clone(), backend, codecs);
        caches.insert(config.name.clone(), Arc::new(store));

        info!(
            cache = %config.name,
            backend = %config.backend,
            max_size = config.max_size,
            "cache created"
        );
        Ok(config)
    }

    // == Get Cache ==
    pub fn get_cache(&self, name: &str) -> Result<CacheConfig> {
        Ok(self.store(name)?.config().clone())
    }

    /// Entry Store of a named cache.
    pub fn store(&self, name: &str) -> Result<Arc<EntryStore>> {
        self.caches
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| CacheError::NotFound(name.to_string()))
    }

    /// Registered cache names, sorted.
    pub fn list_caches(&self) -> Vec<String> {
        let mut names: Vec<String> = self.caches.read().keys().cloned().collect();
        names.sort();
        names
    }

    // == Delete Cache ==
    /// Clears a cache's backend and unregisters it.
    pub async fn delete_cache(&self, name: &str) -> Result<()> {
        let store = self.store(name)?;
        store.clear().await?;
        self.caches.write().remove(name);
        info!(cache = %name, "cache deleted");
        Ok(())
    }

    // == Entry Operations ==
    pub async fn set<V: Serialize + ?Sized>(
        &self,
        cache: &str,
        key: &str,
        value: &V,
        ttl: Option<Duration>,
    ) -> Result<()> {
        self.store(cache)?.put(key, value, ttl).await
    }

    pub async fn get<V: DeserializeOwned>(&self, cache: &str, key: &str) -> Result<Option<V>> {
        self.store(cache)?.fetch_entry(key).await
    }

    pub async fn delete(&self, cache: &str, key: &str) -> Result<()> {
        self.store(cache)?.remove(key).await
    }

    pub async fn clear(&self, cache: &str) -> Result<()> {
        self.store(cache)?.clear().await
    }

    pub async fn stats(&self, cache: &str) -> Result<CacheStats> {
        self.store(cache)?.stats().await
    }

    // == Purge Expired ==
    /// Reaps expired entries in every cache. Returns the total removed.
    pub async fn purge_expired(&self) -> Result<usize> {
        let stores: Vec<Arc<EntryStore>> = self.caches.read().values().cloned().collect();
        let mut removed = 0;
        for store in stores {
            removed += store.purge_expired().await?;
        }
        Ok(removed)
    }
}

impl std::fmt::Debug for CacheRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheRegistry")
            .field("caches", &self.list_caches())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendKind;
    use crate::error::CodecError;

    fn registry() -> (tempfile::TempDir, CacheRegistry) {
        let dir = tempfile::tempdir().unwrap();
        let registry = CacheRegistry::with_data_dir(dir.path());
        (dir, registry)
    }

    struct XorCodec(u8);

    impl Codec for XorCodec {
        fn name(&self) -> &str {
            "xor"
        }

        fn encode(&self, data: Vec<u8>) -> std::result::Result<Vec<u8>, CodecError> {
            Ok(data.into_iter().map(|b| b ^ self.0).collect())
        }

        fn decode(&self, data: Vec<u8>) -> std::result::Result<Vec<u8>, CodecError> {
            self.encode(data)
        }
    }

    #[test]
    fn test_create_cache_is_idempotent() {
        let (_dir, registry) = registry();

        let first = registry
            .create_cache(CacheConfig::new("users").with_max_size(10))
            .unwrap();
        let second = registry
            .create_cache(CacheConfig::new("users").with_max_size(99))
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(registry.get_cache("users").unwrap().max_size, 10);
        assert_eq!(registry.list_caches(), vec!["users"]);
    }

    #[test]
    fn test_get_unknown_cache() {
        let (_dir, registry) = registry();
        assert!(matches!(
            registry.get_cache("nope"),
            Err(CacheError::NotFound(_))
        ));
    }

    #[test]
    fn test_encryption_requires_codec() {
        let (_dir, registry) = registry();
        let result = registry.create_cache(CacheConfig::new("secrets").with_encryption(true));
        assert!(matches!(result, Err(CacheError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_unknown_cache_operations_fail() {
        let (_dir, registry) = registry();
        assert!(matches!(
            registry.set("ghost", "k", &1, None).await,
            Err(CacheError::NotFound(_))
        ));
        assert!(matches!(
            registry.get::<i32>("ghost", "k").await,
            Err(CacheError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_codecs_round_trip_through_registry() {
        let (_dir, registry) = registry();
        let registry = registry.with_encryption_codec(Arc::new(XorCodec(0x5a)));
        registry
            .create_cache(
                CacheConfig::new("vault")
                    .with_compression(true)
                    .with_encryption(true),
            )
            .unwrap();

        registry
            .set("vault", "token", &"s3cr3t".repeat(100), None)
            .await
            .unwrap();
        let value: Option<String> = registry.get("vault", "token").await.unwrap();
        assert_eq!(value, Some("s3cr3t".repeat(100)));
    }

    #[tokio::test]
    async fn test_persistent_cache_survives_new_registry() {
        let dir = tempfile::tempdir().unwrap();
        let config = CacheConfig::new("profiles").with_backend(BackendKind::Persistent);

        let registry = CacheRegistry::with_data_dir(dir.path());
        registry.create_cache(config.clone()).unwrap();
        registry.set("profiles", "p1", &"alice", None).await.unwrap();

        let reopened = CacheRegistry::with_data_dir(dir.path());
        reopened.create_cache(config).unwrap();
        let value: Option<String> = reopened.get("profiles", "p1").await.unwrap();
        assert_eq!(value.as_deref(), Some("alice"));
    }

    #[tokio::test]
    async fn test_persistent_cache_name_cannot_leave_data_dir() {
        let root = tempfile::tempdir().unwrap();
        let data_dir = root.path().join("data");
        let registry = CacheRegistry::with_data_dir(&data_dir);

        let result = registry
            .create_cache(CacheConfig::new("../escaped").with_backend(BackendKind::Persistent));

        assert!(matches!(result, Err(CacheError::InvalidConfig(_))));
        assert!(registry.list_caches().is_empty());
        assert!(!root.path().join("escaped.persistent.json").exists());
    }

    #[tokio::test]
    async fn test_clear_empties_cache() {
        let (_dir, registry) = registry();
        registry.create_cache(CacheConfig::new("c")).unwrap();
        registry.set("c", "a", &1, None).await.unwrap();
        registry.set("c", "b", &2, None).await.unwrap();

        registry.clear("c").await.unwrap();
        assert_eq!(registry.stats("c").await.unwrap().total_items, 0);
    }

    #[tokio::test]
    async fn test_delete_cache_unregisters() {
        let (_dir, registry) = registry();
        registry.create_cache(CacheConfig::new("tmp")).unwrap();
        registry.set("tmp", "a", &1, None).await.unwrap();

        registry.delete_cache("tmp").await.unwrap();
        assert!(registry.list_caches().is_empty());
        assert!(registry.delete_cache("tmp").await.is_err());
    }

    #[tokio::test]
    async fn test_purge_expired_across_caches() {
        let (_dir, registry) = registry();
        registry.create_cache(CacheConfig::new("a")).unwrap();
        registry.create_cache(CacheConfig::new("b")).unwrap();
        let short = Some(Duration::from_millis(10));
        registry.set("a", "x", &1, short).await.unwrap();
        registry.set("b", "y", &2, short).await.unwrap();
        registry.set("b", "z", &3, None).await.unwrap();

        tokio::time::sleep(Duration::from_millis(30)).await;

        assert_eq!(registry.purge_expired().await.unwrap(), 2);
        assert_eq!(registry.stats("b").await.unwrap().total_items, 1);
    }
}
