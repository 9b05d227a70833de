//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::cache::DEFAULT_MAX_SIZE;

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Max entries for caches created over HTTP without an explicit `max_size`
    pub default_max_size: usize,
    /// TTL in milliseconds for caches created over HTTP without one, 0 = never expires
    pub default_ttl_ms: u64,
    /// HTTP server port
    pub server_port: u16,
    /// Interval of the expired-entry sweep in milliseconds, 0 = disabled
    pub sweep_interval_ms: u64,
    /// Directory holding durable cache documents
    pub data_dir: PathBuf,
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `DEFAULT_MAX_SIZE` - Max entries per cache (default: 1000)
    /// - `DEFAULT_TTL_MS` - Default TTL in milliseconds (default: 0, never expires)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `SWEEP_INTERVAL_MS` - Expired-entry sweep period (default: 0, disabled)
    /// - `DATA_DIR` - Durable cache directory (default: ./cache-data)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            default_max_size: env_or("DEFAULT_MAX_SIZE", defaults.default_max_size),
            default_ttl_ms: env_or("DEFAULT_TTL_MS", defaults.default_ttl_ms),
            server_port: env_or("SERVER_PORT", defaults.server_port),
            sweep_interval_ms: env_or("SWEEP_INTERVAL_MS", defaults.sweep_interval_ms),
            data_dir: env::var_os("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_max_size: DEFAULT_MAX_SIZE,
            default_ttl_ms: 0,
            server_port: 3000,
            sweep_interval_ms: 0,
            data_dir: PathBuf::from("./cache-data"),
        }
    }
}
