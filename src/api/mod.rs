//! API Module
//!
//! HTTP handlers, middleware and routing for the quality backend.
//!
//! # Endpoints
//! - `GET /version` - Service version metadata
//! - `GET /quality/repositories` - Cached repository quality data
//! - `GET /swagger.json`, `GET /swagger/*` - API documentation

pub mod docs;
pub mod handlers;
pub mod middleware;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
