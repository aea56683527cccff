//! Response models for the quality backend API
//!
//! This module defines the DTOs (Data Transfer Objects) serialized into
//! HTTP response bodies and cached by the rotation strategies.

pub mod responses;

// Re-export commonly used types
pub use responses::{ErrorResponse, RepositoryQuality, VersionResponse};
