//! API Handlers
//!
//! HTTP request handlers for each cache server endpoint.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};

use crate::cache::{CacheConfig, CacheStats};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::{
    CacheListResponse, CreateCacheRequest, DeleteResponse, GetResponse, HealthResponse,
    SetRequest, SetResponse,
};
use crate::registry::CacheRegistry;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<CacheRegistry>,
    /// Applied to caches created without an explicit `max_size`
    pub default_max_size: usize,
    /// Applied to caches created without an explicit `default_ttl_ms`
    pub default_ttl_ms: u64,
}

impl AppState {
    /// Creates a new AppState around an existing registry.
    pub fn new(registry: Arc<CacheRegistry>, config: &Config) -> Self {
        Self {
            registry,
            default_max_size: config.default_max_size,
            default_ttl_ms: config.default_ttl_ms,
        }
    }

    /// Creates a new AppState from configuration.
    ///
    /// Durable caches are stored under `config.data_dir`.
    pub fn from_config(config: &Config) -> Self {
        let registry = CacheRegistry::with_data_dir(&config.data_dir);
        Self::new(Arc::new(registry), config)
    }
}

/// Handler for POST /caches
///
/// Creating an existing cache returns its current config.
pub async fn create_cache_handler(
    State(state): State<AppState>,
    Json(req): Json<CreateCacheRequest>,
) -> Result<Json<CacheConfig>> {
    let config = req.into_config(state.default_max_size, state.default_ttl_ms);
    Ok(Json(state.registry.create_cache(config)?))
}

/// Handler for GET /caches
pub async fn list_caches_handler(State(state): State<AppState>) -> Json<CacheListResponse> {
    Json(CacheListResponse {
        caches: state.registry.list_caches(),
    })
}

/// Handler for GET /caches/:name
pub async fn get_cache_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<CacheConfig>> {
    Ok(Json(state.registry.get_cache(&name)?))
}

/// Handler for DELETE /caches/:name
pub async fn delete_cache_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<DeleteResponse>> {
    state.registry.delete_cache(&name).await?;
    Ok(Json(DeleteResponse::cache(&name)))
}

/// Handler for PUT /caches/:name/entries
pub async fn set_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    state
        .registry
        .set(&name, &req.key, &req.value, req.ttl())
        .await?;

    Ok(Json(SetResponse::new(req.key)))
}

/// Handler for GET /caches/:name/entries/:key
pub async fn get_handler(
    State(state): State<AppState>,
    Path((name, key)): Path<(String, String)>,
) -> Result<Json<GetResponse>> {
    match state.registry.get::<serde_json::Value>(&name, &key).await? {
        Some(value) => Ok(Json(GetResponse::new(name, key, value))),
        None => Err(CacheError::KeyNotFound { cache: name, key }),
    }
}

/// Handler for DELETE /caches/:name/entries/:key
pub async fn delete_handler(
    State(state): State<AppState>,
    Path((name, key)): Path<(String, String)>,
) -> Result<Json<DeleteResponse>> {
    state.registry.delete(&name, &key).await?;
    Ok(Json(DeleteResponse::key(&key)))
}

/// Handler for DELETE /caches/:name/entries
pub async fn clear_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<DeleteResponse>> {
    state.registry.clear(&name).await?;
    Ok(Json(DeleteResponse::cleared(&name)))
}

/// Handler for GET /caches/:name/stats
pub async fn stats_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<CacheStats>> {
    Ok(Json(state.registry.stats(&name).await?))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_state() -> (tempfile::TempDir, AppState) {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            data_dir: dir.path().to_path_buf(),
            ..Config::default()
        };
        (dir, AppState::from_config(&config))
    }

    async fn create(state: &AppState, name: &str) {
        let req: CreateCacheRequest =
            serde_json::from_value(serde_json::json!({ "name": name })).unwrap();
        create_cache_handler(State(state.clone()), Json(req))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_set_and_get_handler() {
        let (_dir, state) = test_state();
        create(&state, "api").await;

        let req = SetRequest {
            key: "test_key".to_string(),
            value: serde_json::json!("test_value"),
            ttl_ms: None,
        };
        let result = set_handler(State(state.clone()), Path("api".to_string()), Json(req)).await;
        assert!(result.is_ok());

        let response = get_handler(
            State(state.clone()),
            Path(("api".to_string(), "test_key".to_string())),
        )
        .await
        .unwrap();
        assert_eq!(response.value, "test_value");
    }

    #[tokio::test]
    async fn test_get_nonexistent_key() {
        let (_dir, state) = test_state();
        create(&state, "api").await;

        let result = get_handler(
            State(state),
            Path(("api".to_string(), "nonexistent".to_string())),
        )
        .await;
        assert!(matches!(result, Err(CacheError::KeyNotFound { .. })));
    }

    #[tokio::test]
    async fn test_set_on_unknown_cache() {
        let (_dir, state) = test_state();
        let req = SetRequest {
            key: "k".to_string(),
            value: serde_json::json!(1),
            ttl_ms: None,
        };
        let result = set_handler(State(state), Path("ghost".to_string()), Json(req)).await;
        assert!(matches!(result, Err(CacheError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_create_uses_state_defaults() {
        let (_dir, mut state) = test_state();
        state.default_max_size = 7;
        create(&state, "small").await;

        let config = get_cache_handler(State(state), Path("small".to_string()))
            .await
            .unwrap();
        assert_eq!(config.max_size, 7);
    }

    #[tokio::test]
    async fn test_stats_handler() {
        let (_dir, state) = test_state();
        create(&state, "api").await;

        let response = stats_handler(State(state), Path("api".to_string()))
            .await
            .unwrap();
        assert_eq!(response.hits, 0);
        assert_eq!(response.total_items, 0);
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await;
        assert_eq!(response.status, "healthy");
    }

    #[tokio::test]
    async fn test_set_invalid_request() {
        let (_dir, state) = test_state();
        create(&state, "api").await;

        let req = SetRequest {
            key: "".to_string(),
            value: serde_json::json!("value"),
            ttl_ms: None,
        };
        let result = set_handler(State(state), Path("api".to_string()), Json(req)).await;
        assert!(matches!(result, Err(CacheError::InvalidRequest(_))));
    }
}
