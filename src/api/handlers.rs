//! API Handlers
//!
//! HTTP request handlers for each quality backend endpoint. Handlers only read
//! from the cache; the refresh scheduler is its sole writer.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::{Html, IntoResponse, Response},
    Json,
};
use serde_json::Value;

use super::docs::{openapi_document, SWAGGER_UI};
use crate::cache::{CacheStore, REPOSITORIES_KEY};
use crate::config::ServerConfig;
use crate::error::Result;
use crate::models::{RepositoryQuality, VersionResponse};

/// Application state shared across all handlers.
///
/// Both members are constructed once at startup and passed in explicitly.
#[derive(Clone)]
pub struct AppState {
    /// Concurrent cache store, synchronized internally
    pub cache: Arc<CacheStore>,
    /// Immutable process configuration
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Creates a new AppState from its shared parts.
    pub fn new(cache: Arc<CacheStore>, config: Arc<ServerConfig>) -> Self {
        Self { cache, config }
    }

    /// Creates a new AppState from configuration.
    ///
    /// Initializes the cache store with the configured construction parameters.
    pub fn from_config(config: ServerConfig) -> Self {
        let cache = CacheStore::new(&config.cache);
        Self::new(Arc::new(cache), Arc::new(config))
    }
}

/// Handler for GET /version
pub async fn version_handler() -> Json<VersionResponse> {
    Json(VersionResponse::current())
}

/// Handler for GET /quality/repositories
///
/// Serves the cached repository data set, or an empty list before the first
/// successful rotation. Cached data that no longer decodes is a 500.
pub async fn repositories_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<RepositoryQuality>>> {
    let repositories = match state.cache.get(REPOSITORIES_KEY) {
        Some(value) => serde_json::from_value(value)?,
        None => Vec::new(),
    };

    Ok(Json(repositories))
}

/// Handler for GET /swagger.json
pub async fn swagger_json_handler() -> Json<Value> {
    Json(openapi_document())
}

/// Handler for GET /swagger/
pub async fn swagger_ui_handler() -> Html<&'static str> {
    Html(SWAGGER_UI)
}

/// Handler for GET /swagger/*path
///
/// `doc.json` is the document itself; any other path renders the UI.
pub async fn swagger_asset_handler(Path(path): Path<String>) -> Response {
    if path == "doc.json" {
        Json(openapi_document()).into_response()
    } else {
        Html(SWAGGER_UI).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CacheConfig;
    use crate::error::ApiError;
    use serde_json::json;

    fn test_state() -> AppState {
        let config = ServerConfig {
            cache: CacheConfig {
                num_counters: 1024,
                max_cost: 1 << 20,
                buffer_items: 4,
            },
            ..ServerConfig::default()
        };
        AppState::from_config(config)
    }

    #[tokio::test]
    async fn test_version_handler() {
        let response = version_handler().await;
        assert_eq!(response.version, env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn test_repositories_handler_empty_cache() {
        let state = test_state();

        let response = repositories_handler(State(state)).await.unwrap();
        assert!(response.is_empty());
    }

    #[tokio::test]
    async fn test_repositories_handler_reads_cache() {
        let state = test_state();
        let repos = crate::rotation::builtin_repositories();
        state
            .cache
            .set(REPOSITORIES_KEY, serde_json::to_value(&repos).unwrap(), 100);

        let response = repositories_handler(State(state)).await.unwrap();
        assert_eq!(response.0, repos);
    }

    #[tokio::test]
    async fn test_repositories_handler_malformed_cache() {
        let state = test_state();
        state.cache.set(REPOSITORIES_KEY, json!({"not": "a list"}), 10);

        let result = repositories_handler(State(state)).await;
        assert!(matches!(result, Err(ApiError::Serialization(_))));
    }

    #[tokio::test]
    async fn test_swagger_asset_handler() {
        let doc = swagger_asset_handler(Path("doc.json".to_string())).await;
        let content_type = doc.headers().get("content-type").unwrap();
        assert_eq!(content_type, "application/json");

        let ui = swagger_asset_handler(Path("index.html".to_string())).await;
        let content_type = ui.headers().get("content-type").unwrap();
        assert!(content_type.to_str().unwrap().starts_with("text/html"));
    }
}
