//! Error types for the cache engine
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::backend::BackendKind;
use crate::models::ErrorResponse;

// == Storage Error ==
/// A backend adapter failed to perform an I/O operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{backend} backend failed{}: {message}", key_suffix(.key))]
pub struct StorageError {
    /// Which storage technology failed
    pub backend: BackendKind,
    /// The key being accessed, None for cache-wide operations (clear, list)
    pub key: Option<String>,
    /// Underlying failure description
    pub message: String,
}

impl StorageError {
    pub fn new(backend: BackendKind, key: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            backend,
            key: key.map(str::to_string),
            message: message.into(),
        }
    }
}

fn key_suffix(key: &Option<String>) -> String {
    key.as_deref()
        .map(|k| format!(" on key '{}'", k))
        .unwrap_or_default()
}

// == Codec Error ==
/// Encoding or decoding a value failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{codec} codec failed: {message}")]
pub struct CodecError {
    /// Name of the failing codec ("json", "zstd", ...)
    pub codec: String,
    pub message: String,
}

impl CodecError {
    pub fn new(codec: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            codec: codec.into(),
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for CodecError {
    fn from(err: serde_json::Error) -> Self {
        CodecError::new("json", err.to_string())
    }
}

// == Cache Error Enum ==
/// Unified error type for cache operations.
#[derive(Error, Debug)]
pub enum CacheError {
    /// No cache registered under this name
    #[error("Cache not found: {0}")]
    NotFound(String),

    /// No live entry under this key, returned by the HTTP layer only
    #[error("Key not found in cache '{cache}': {key}")]
    KeyNotFound { cache: String, key: String },

    /// Cache configuration rejected at creation
    #[error("Invalid cache config: {0}")]
    InvalidConfig(String),

    /// Invalid key or value
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Codec(#[from] CodecError),
}

// == Strategy Error ==
/// Failure of a strategy call.
///
/// The caller's own fetch error is carried unwrapped in `Fetch` so it can be
/// matched on without downcasting.
#[derive(Error, Debug)]
pub enum StrategyError<E> {
    #[error("fetch failed: {0}")]
    Fetch(E),

    #[error(transparent)]
    Cache(#[from] CacheError),
}

impl<E> StrategyError<E> {
    /// Returns the fetch error if this failure came from the fetch function.
    pub fn into_fetch_error(self) -> Option<E> {
        match self {
            StrategyError::Fetch(err) => Some(err),
            StrategyError::Cache(_) => None,
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(_) | CacheError::KeyNotFound { .. } => StatusCode::NOT_FOUND,
            CacheError::InvalidConfig(_) | CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::Storage(_) | CacheError::Codec(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;
