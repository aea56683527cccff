//! Quality Backend - repository quality metadata over HTTP
//!
//! Serves a read-mostly data set from a cost-bounded in-memory cache that a
//! background scheduler refreshes on the schedule chosen by a pluggable
//! rotation strategy, with graceful shutdown under termination signals.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod rotation;
pub mod server;
pub mod tasks;

pub use api::AppState;
pub use cache::CacheStore;
pub use config::{CacheConfig, ServerConfig};
pub use server::Server;
