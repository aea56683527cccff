//! Cache Module
//!
//! Provides a bounded, concurrent in-memory store with cost accounting and
//! frequency-based admission.

mod entry;
mod sketch;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use sketch::FrequencySketch;
pub use stats::CacheStats;
pub use store::CacheStore;

// == Public Constants ==
/// Cache key holding the repository quality data set
pub const REPOSITORIES_KEY: &str = "repositories";
