//! Strata Cache - A multi-backend cache engine
//!
//! Named caches over pluggable storage adapters, with TTL expiration,
//! size-bound eviction, fetch strategies (cache-first, network-first,
//! network-only, cache-only, stale-while-revalidate) and a priority-ordered
//! preloader.

pub mod api;
pub mod backend;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod preload;
pub mod registry;
pub mod strategy;
pub mod tasks;

pub use api::AppState;
pub use backend::{Backend, BackendFactory, BackendKind, DefaultBackendFactory};
pub use cache::{CacheConfig, CacheStats, Codec, FetchStrategy};
pub use config::Config;
pub use error::{CacheError, CodecError, StorageError, StrategyError};
pub use preload::{PreloadPriority, PreloadSummary, Preloader};
pub use registry::CacheRegistry;
pub use tasks::spawn_sweep_task;
