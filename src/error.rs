//! Error types for the quality backend
//!
//! Provides unified error handling using thiserror.

use std::io;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == API Error Enum ==
/// Failures surfaced to HTTP clients.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Cached data could not be turned into a response body
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

// == IntoResponse Implementation ==
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

// == Rotation Error Enum ==
/// Failures producing a new data set. Never fatal: the scheduler keeps the
/// previous cache contents and retries on the next tick.
#[derive(Error, Debug)]
pub enum RotationError {
    /// Data source temporarily cannot produce data
    #[error("Data source unavailable: {0}")]
    Unavailable(String),

    /// Reading the data source failed
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Data source returned malformed data
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

// == Server Error Enum ==
/// Fatal lifecycle failures.
#[derive(Error, Debug)]
pub enum ServerError {
    /// The listener could not be bound at startup
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    /// The accept loop stopped without a shutdown being requested
    #[error("HTTP server crashed: {0}")]
    ListenerCrashed(String),
}

// == Result Type Alias ==
/// Convenience Result type for HTTP handlers.
pub type Result<T> = std::result::Result<T, ApiError>;
