//! API Routes
//!
//! Configures the Axum router with all cache server endpoints.

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    clear_handler, create_cache_handler, delete_cache_handler, delete_handler, get_cache_handler,
    get_handler, health_handler, list_caches_handler, set_handler, stats_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `POST /caches` - Create a named cache
/// - `GET /caches` - List cache names
/// - `GET /caches/:name` - Cache config
/// - `DELETE /caches/:name` - Clear and remove a cache
/// - `PUT /caches/:name/entries` - Store an entry
/// - `DELETE /caches/:name/entries` - Clear a cache
/// - `GET /caches/:name/entries/:key` - Read an entry
/// - `DELETE /caches/:name/entries/:key` - Delete an entry
/// - `GET /caches/:name/stats` - Cache statistics
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/caches", post(create_cache_handler).get(list_caches_handler))
        .route(
            "/caches/:name",
            get(get_cache_handler).delete(delete_cache_handler),
        )
        .route(
            "/caches/:name/entries",
            put(set_handler).delete(clear_handler),
        )
        .route(
            "/caches/:name/entries/:key",
            get(get_handler).delete(delete_handler),
        )
        .route("/caches/:name/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::util::ServiceExt;

    fn create_test_app() -> (tempfile::TempDir, Router) {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            data_dir: dir.path().to_path_buf(),
            ..Config::default()
        };
        (dir, create_router(AppState::from_config(&config)))
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let (_dir, app) = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_create_cache_endpoint() {
        let (_dir, app) = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/caches")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"name":"api"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_stats_unknown_cache() {
        let (_dir, app) = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/caches/nope/stats")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
