//! Response middleware: version headers and optional fault injection.

use axum::{
    extract::Request,
    http::{HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

use crate::models::ErrorResponse;

pub const VERSION_HEADER: &str = "x-api-version";
pub const REVISION_HEADER: &str = "x-api-revision";

/// Stamps every response with the service version and revision.
pub async fn version_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(
        VERSION_HEADER,
        HeaderValue::from_static(env!("CARGO_PKG_VERSION")),
    );
    if let Ok(revision) = HeaderValue::from_str(option_env!("GIT_COMMIT").unwrap_or("unknown")) {
        headers.insert(REVISION_HEADER, revision);
    }
    response
}

/// Fails roughly one request in three with a random 500, 400 or 409.
///
/// Only installed when `RANDOM_ERROR` is enabled; used to exercise clients.
pub async fn random_error(request: Request, next: Next) -> Response {
    const ERRORS: [StatusCode; 3] = [
        StatusCode::INTERNAL_SERVER_ERROR,
        StatusCode::BAD_REQUEST,
        StatusCode::CONFLICT,
    ];

    if fastrand::u8(0..3) == 0 {
        let status = ERRORS[fastrand::usize(..ERRORS.len())];
        return (status, Json(ErrorResponse::new("Injected random error"))).into_response();
    }
    next.run(request).await
}
