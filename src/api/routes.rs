//! API Routes
//!
//! Configures the Axum router with all quality backend endpoints.

use axum::{http::Method, middleware::from_fn, routing::get, Router};
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use super::handlers::{
    repositories_handler, swagger_asset_handler, swagger_json_handler, swagger_ui_handler,
    version_handler, AppState,
};
use super::middleware::{random_error, version_headers};

/// Creates the main router with all endpoints configured.
///
/// # Middleware (outermost first)
/// - Tracing: Logs all requests
/// - CORS: Any origin with credentials (the request origin is mirrored back)
/// - Timeout: Per-request deadline from `http_server_timeout`
/// - Version headers
/// - Random errors, only when `random_error` is enabled
pub fn create_router(state: AppState) -> Router {
    // Wildcard origins cannot be combined with credentials, so mirror instead
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::HEAD])
        .allow_headers(AllowHeaders::mirror_request());

    let mut router = Router::new()
        .route("/version", get(version_handler))
        .route("/quality/repositories", get(repositories_handler))
        .route("/swagger.json", get(swagger_json_handler))
        .route("/swagger/", get(swagger_ui_handler))
        .route("/swagger/*path", get(swagger_asset_handler));

    if state.config.random_error {
        router = router.layer(from_fn(random_error));
    }

    router
        .layer(from_fn(version_headers))
        .layer(TimeoutLayer::new(state.config.http_server_timeout))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
