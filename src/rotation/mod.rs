//! Rotation Module
//!
//! A rotation regenerates the cached data set and decides how long to wait
//! before the next one. Strategies are interchangeable behind
//! [`RotationStrategy`]; the refresh scheduler only sees that trait.

mod file;
mod static_data;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::error::RotationError;

pub use file::FileRotationStrategy;
pub use static_data::{builtin_repositories, StaticRotationStrategy};

// == Rotation Entry ==
/// One key to install into the cache.
#[derive(Debug, Clone, PartialEq)]
pub struct RotationEntry {
    pub key: String,
    pub value: Value,
    /// Admission weight, the serialized size in bytes for JSON payloads
    pub cost: u64,
}

impl RotationEntry {
    /// Serializes `payload` and weighs it by its encoded length.
    pub fn json<T: Serialize>(key: impl Into<String>, payload: &T) -> Result<Self, RotationError> {
        let value = serde_json::to_value(payload)?;
        let cost = serde_json::to_vec(&value)?.len() as u64;
        Ok(Self {
            key: key.into(),
            value,
            cost,
        })
    }
}

// == Rotation Result ==
/// Output of one rotation: the data to install and the delay until the next.
///
/// Consumed once by the scheduler and then dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct RotationResult {
    pub entries: Vec<RotationEntry>,
    pub next_delay: Duration,
}

// == Rotation Strategy ==
/// Produces cache contents for a point in time.
#[async_trait]
pub trait RotationStrategy: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Builds the data set for `now`. Errors are absorbed by the caller,
    /// which keeps serving the previous contents.
    async fn produce(&self, now: DateTime<Utc>) -> Result<RotationResult, RotationError>;
}
