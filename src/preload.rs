//! Preloader Module
//!
//! Priority-ordered warm-up of caches ahead of demand. Queued items are drained
//! one at a time: every `High` item before any `Normal`, every `Normal` before
//! any `Low`, first-in-first-out within a tier.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::registry::CacheRegistry;

type PreloadFuture = Pin<Box<dyn Future<Output = anyhow::Result<serde_json::Value>> + Send>>;
type PreloadFetch = Box<dyn FnOnce() -> PreloadFuture + Send>;

// == Priority ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreloadPriority {
    High,
    #[default]
    Normal,
    Low,
}

impl PreloadPriority {
    fn tier(self) -> usize {
        match self {
            PreloadPriority::High => 0,
            PreloadPriority::Normal => 1,
            PreloadPriority::Low => 2,
        }
    }
}

struct PreloadTask {
    cache: String,
    key: String,
    fetch: PreloadFetch,
}

// == Summary ==
/// Outcome of one drain of the queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PreloadSummary {
    /// Items fetched and stored
    pub fetched: usize,
    /// Items whose key was already cached and unexpired
    pub skipped: usize,
    /// Items whose fetch or store failed
    pub failed: usize,
}

/// Resets the preloading flag even if the drain is cancelled.
struct DrainGuard<'a>(&'a AtomicBool);

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

// == Preloader ==
pub struct Preloader {
    registry: Arc<CacheRegistry>,
    /// One FIFO per priority tier, highest first
    queues: Mutex<[VecDeque<PreloadTask>; 3]>,
    preloading: AtomicBool,
}

impl Preloader {
    pub fn new(registry: Arc<CacheRegistry>) -> Self {
        Self {
            registry,
            queues: Mutex::new(Default::default()),
            preloading: AtomicBool::new(false),
        }
    }

    // == Add To Queue ==
    /// Queues `fetch` to warm `key` in `cache`. Nothing runs until a drain starts.
    pub fn add_to_preload_queue<V, F, Fut, E>(
        &self,
        cache: impl Into<String>,
        key: impl Into<String>,
        fetch: F,
        priority: PreloadPriority,
    ) where
        V: Serialize + Send + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
        E: Into<anyhow::Error>,
    {
        let fetch: PreloadFetch = Box::new(move || -> PreloadFuture {
            Box::pin(async move {
                let value = fetch().await.map_err(Into::<anyhow::Error>::into)?;
                Ok::<_, anyhow::Error>(serde_json::to_value(value)?)
            })
        });

        let task = PreloadTask {
            cache: cache.into(),
            key: key.into(),
            fetch,
        };
        self.queues.lock()[priority.tier()].push_back(task);
    }

    /// Items waiting across all tiers.
    pub fn queue_len(&self) -> usize {
        self.queues.lock().iter().map(VecDeque::len).sum()
    }

    pub fn is_preloading(&self) -> bool {
        self.preloading.load(Ordering::Acquire)
    }

    // == Clear Queue ==
    /// Drops every item not yet picked up. Already stored values are untouched.
    ///
    /// Returns the number of items discarded.
    pub fn clear_preload_queue(&self) -> usize {
        let mut queues = self.queues.lock();
        let discarded = queues.iter().map(VecDeque::len).sum();
        queues.iter_mut().for_each(VecDeque::clear);
        discarded
    }

    fn next_task(&self) -> Option<PreloadTask> {
        self.queues.lock().iter_mut().find_map(VecDeque::pop_front)
    }

    // == Start Preloading ==
    /// Drains the queue sequentially until it is empty.
    ///
    /// Items queued while the drain runs are picked up by the same drain.
    /// Returns `None` without doing anything if another drain is running.
    pub async fn start_preloading(&self) -> Option<PreloadSummary> {
        if self
            .preloading
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("preload drain already running");
            return None;
        }
        let _guard = DrainGuard(&self.preloading);

        let mut summary = PreloadSummary::default();
        while let Some(task) = self.next_task() {
            let (cache, key) = (task.cache.clone(), task.key.clone());
            match self.process(task).await {
                Ok(true) => summary.fetched += 1,
                Ok(false) => summary.skipped += 1,
                Err(err) => {
                    summary.failed += 1;
                    warn!(cache = %cache, key = %key, error = %err, "preload item failed");
                }
            }
        }

        info!(
            fetched = summary.fetched,
            skipped = summary.skipped,
            failed = summary.failed,
            "preload pass finished"
        );
        Some(summary)
    }

    /// Runs [`start_preloading`](Self::start_preloading) on a detached task.
    pub fn spawn(self: &Arc<Self>) -> JoinHandle<Option<PreloadSummary>> {
        let preloader = Arc::clone(self);
        tokio::spawn(async move { preloader.start_preloading().await })
    }

    /// Returns Ok(true) if a value was fetched and stored, Ok(false) if skipped.
    async fn process(&self, task: PreloadTask) -> anyhow::Result<bool> {
        let store = self.registry.store(&task.cache)?;
        if store.contains_fresh(&task.key).await? {
            debug!(cache = %task.cache, key = %task.key, "preload skipped, already cached");
            return Ok(false);
        }

        let value = (task.fetch)().await?;
        store.put(&task.key, &value, None).await?;
        debug!(cache = %task.cache, key = %task.key, "preloaded entry");
        Ok(true)
    }
}

impl std::fmt::Debug for Preloader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Preloader")
            .field("queued", &self.queue_len())
            .field("preloading", &self.is_preloading())
            .finish()
    }
}
