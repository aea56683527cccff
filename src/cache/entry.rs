//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with cost accounting.

use chrono::{DateTime, Utc};
use serde_json::Value;

// == Cache Entry ==
/// Represents a single cache entry with value and admission metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The stored payload
    pub value: Value,
    /// Weight charged against the store's cost budget
    pub cost: u64,
    /// Wall-clock time the entry was committed
    pub inserted_at: DateTime<Utc>,
    /// Monotonic insertion sequence, used to break frequency ties
    pub(crate) seq: u64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new cache entry stamped with the current time.
    ///
    /// # Arguments
    /// * `value` - The payload to store
    /// * `cost` - Admission weight of the payload
    /// * `seq` - Insertion sequence assigned by the store
    pub fn new(value: Value, cost: u64, seq: u64) -> Self {
        Self {
            value,
            cost,
            inserted_at: Utc::now(),
            seq,
        }
    }

    // == Age ==
    /// Returns how long ago the entry was committed.
    pub fn age(&self) -> chrono::Duration {
        Utc::now().signed_duration_since(self.inserted_at)
    }
}
