//! Expired-Entry Sweep Task
//!
//! Reads already reap expired entries lazily. This task is the opt-in eager
//! complement for deployments where expired-but-unread entries would
//! otherwise occupy a backend for long.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::registry::CacheRegistry;

/// Spawns a task that calls [`CacheRegistry::purge_expired`] every `interval`.
///
/// A failed sweep is logged and retried on the next tick.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
///
/// # Example
/// ```ignore
/// let registry = Arc::new(CacheRegistry::with_data_dir("./cache-data"));
/// let sweep_handle = spawn_sweep_task(registry.clone(), Duration::from_secs(1));
/// // Later, during shutdown:
/// sweep_handle.abort();
/// ```
pub fn spawn_sweep_task(registry: Arc<CacheRegistry>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Starting expired-entry sweep with interval of {:?}", interval);

        loop {
            tokio::time::sleep(interval).await;

            match registry.purge_expired().await {
                Ok(0) => debug!("Sweep: no expired entries found"),
                Ok(removed) => info!("Sweep: removed {} expired entries", removed),
                Err(err) => warn!(error = %err, "Sweep failed"),
            }
        }
    })
}
