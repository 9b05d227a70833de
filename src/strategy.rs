//! Strategy Module
//!
//! Access strategies layered over the Entry Store and a caller-supplied fetch
//! function. Each strategy is an entry point on [`CacheRegistry`].
//!
//! Failure semantics: cache-first and network-first surface the caller's fetch
//! error only when no usable cached value exists; stale-while-revalidate never
//! surfaces background failures, it logs them.

use std::collections::HashMap;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::cache::FetchStrategy;
use crate::error::{Result, StrategyError};
use crate::registry::CacheRegistry;

type FlightKey = (String, String);

// == In-Flight Registry ==
/// Cache-first fetches currently running, keyed by `(cache, key)`.
///
/// A second caller missing on the same key waits for the running fetch to
/// finish and re-reads the cache instead of fetching again.
#[derive(Debug, Default)]
pub(crate) struct InFlight {
    flights: Mutex<HashMap<FlightKey, watch::Receiver<()>>>,
}

enum Flight<'a> {
    Leader(FlightGuard<'a>),
    Follower(watch::Receiver<()>),
}

/// Held by the caller performing the fetch. Dropping it (on success, error or
/// cancellation) unregisters the flight and wakes every follower.
struct FlightGuard<'a> {
    in_flight: &'a InFlight,
    id: FlightKey,
    _done: watch::Sender<()>,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.in_flight.flights.lock().remove(&self.id);
    }
}

impl InFlight {
    fn join(&self, cache: &str, key: &str) -> Flight<'_> {
        let id = (cache.to_string(), key.to_string());
        let mut flights = self.flights.lock();
        if let Some(rx) = flights.get(&id) {
            return Flight::Follower(rx.clone());
        }

        let (tx, rx) = watch::channel(());
        flights.insert(id.clone(), rx);
        Flight::Leader(FlightGuard {
            in_flight: self,
            id,
            _done: tx,
        })
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.flights.lock().len()
    }
}

impl CacheRegistry {
    // == Cache First ==
    /// Serves the cached value; on a miss calls `fetch`, stores and returns its result.
    ///
    /// Concurrent misses on the same key share one fetch.
    pub async fn cache_first<V, F, Fut, E>(
        &self,
        cache: &str,
        key: &str,
        fetch: F,
        ttl: Option<Duration>,
    ) -> std::result::Result<V, StrategyError<E>>
    where
        V: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<V, E>>,
    {
        let store = self.store(cache)?;

        let _flight = loop {
            if let Some(value) = store.fetch_entry(key).await? {
                return Ok(value);
            }
            match self.in_flight.join(cache, key) {
                Flight::Leader(guard) => break guard,
                Flight::Follower(mut done) => {
                    debug!(cache = %cache, key = %key, "awaiting in-flight fetch");
                    // Err only means the leader is gone, which is the signal
                    let _ = done.changed().await;
                }
            }
        };

        // A previous leader may have stored the value between our miss and join
        if store.contains_fresh(key).await? {
            if let Some(value) = store.fetch_entry(key).await? {
                return Ok(value);
            }
        }

        let value = fetch().await.map_err(StrategyError::Fetch)?;
        store.put(key, &value, ttl).await?;
        Ok(value)
    }

    // == Network Only ==
    /// Always calls `fetch`; the cache is neither read nor written.
    pub async fn network_only<V, F, Fut, E>(
        &self,
        cache: &str,
        fetch: F,
    ) -> std::result::Result<V, StrategyError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<V, E>>,
    {
        self.store(cache)?;
        fetch().await.map_err(StrategyError::Fetch)
    }

    // == Cache Only ==
    /// Serves the cached value if present and unexpired; never fetches.
    pub async fn cache_only<V: DeserializeOwned>(&self, cache: &str, key: &str) -> Result<Option<V>> {
        self.store(cache)?.fetch_entry(key).await
    }

    // == Network First ==
    /// Calls `fetch` and stores its result. If the fetch fails, falls back to
    /// the cached value; with nothing cached the original fetch error is returned.
    pub async fn network_first<V, F, Fut, E>(
        &self,
        cache: &str,
        key: &str,
        fetch: F,
        ttl: Option<Duration>,
    ) -> std::result::Result<V, StrategyError<E>>
    where
        V: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<V, E>>,
    {
        let store = self.store(cache)?;

        match fetch().await {
            Ok(value) => {
                store.put(key, &value, ttl).await?;
                Ok(value)
            }
            Err(fetch_err) => match store.fetch_entry(key).await {
                Ok(Some(value)) => {
                    warn!(cache = %cache, key = %key, "fetch failed, serving cached value");
                    Ok(value)
                }
                Ok(None) => Err(StrategyError::Fetch(fetch_err)),
                Err(cache_err) => {
                    warn!(
                        cache = %cache,
                        key = %key,
                        error = %cache_err,
                        "fetch failed and cache fallback failed"
                    );
                    Err(StrategyError::Fetch(fetch_err))
                }
            },
        }
    }

    // == Stale While Revalidate ==
    /// Returns the cached value (possibly `None`) without waiting, and refreshes
    /// the entry from `fetch` on a detached task.
    ///
    /// The background task only writes back to the cache; its failures are
    /// logged and never reach this caller.
    pub async fn stale_while_revalidate<V, F, Fut, E>(
        &self,
        cache: &str,
        key: &str,
        fetch: F,
        ttl: Option<Duration>,
    ) -> Result<Option<V>>
    where
        V: Serialize + DeserializeOwned + Send + Sync + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = std::result::Result<V, E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        let store = self.store(cache)?;
        let cached = store.fetch_entry(key).await?;

        let key = key.to_string();
        tokio::spawn(async move {
            match fetch().await {
                Ok(value) => match store.put(&key, &value, ttl).await {
                    Ok(()) => debug!(cache = %store.name(), key = %key, "revalidated entry"),
                    Err(err) => warn!(
                        cache = %store.name(),
                        key = %key,
                        error = %err,
                        "failed to store revalidated value"
                    ),
                },
                Err(err) => warn!(
                    cache = %store.name(),
                    key = %key,
                    error = %err,
                    "background revalidation failed"
                ),
            }
        });

        Ok(cached)
    }

    // == Resolve ==
    /// Reads `key` with the cache's configured default strategy.
    pub async fn resolve<V, F, Fut, E>(
        &self,
        cache: &str,
        key: &str,
        fetch: F,
        ttl: Option<Duration>,
    ) -> std::result::Result<Option<V>, StrategyError<E>>
    where
        V: Serialize + DeserializeOwned + Send + Sync + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = std::result::Result<V, E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        match self.get_cache(cache)?.strategy {
            FetchStrategy::CacheFirst => self.cache_first(cache, key, fetch, ttl).await.map(Some),
            FetchStrategy::NetworkFirst => {
                self.network_first(cache, key, fetch, ttl).await.map(Some)
            }
            FetchStrategy::NetworkOnly => self.network_only(cache, fetch).await.map(Some),
            FetchStrategy::CacheOnly => Ok(self.cache_only(cache, key).await?),
            FetchStrategy::StaleWhileRevalidate => Ok(self
                .stale_while_revalidate(cache, key, fetch, ttl)
                .await?),
        }
    }
}
