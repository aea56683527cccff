//! Static rotation: the same data set on a fixed interval.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{RotationEntry, RotationResult, RotationStrategy};
use crate::cache::REPOSITORIES_KEY;
use crate::error::RotationError;
use crate::models::RepositoryQuality;

/// Returns a fixed data set and interval, ignoring time and history.
///
/// Calling `produce` any number of times yields equal results.
#[derive(Debug, Clone)]
pub struct StaticRotationStrategy {
    entries: Vec<RotationEntry>,
    interval: Duration,
}

impl StaticRotationStrategy {
    pub fn new(entries: Vec<RotationEntry>, interval: Duration) -> Self {
        Self { entries, interval }
    }

    /// Serves the built-in repository quality snapshot.
    pub fn builtin(interval: Duration) -> Result<Self, RotationError> {
        let entry = RotationEntry::json(REPOSITORIES_KEY, &builtin_repositories())?;
        Ok(Self::new(vec![entry], interval))
    }
}

#[async_trait]
impl RotationStrategy for StaticRotationStrategy {
    fn name(&self) -> &str {
        "static"
    }

    async fn produce(&self, _now: DateTime<Utc>) -> Result<RotationResult, RotationError> {
        Ok(RotationResult {
            entries: self.entries.clone(),
            next_delay: self.interval,
        })
    }
}

/// Repository quality snapshot shipped with the binary.
pub fn builtin_repositories() -> Vec<RepositoryQuality> {
    [
        ("e2e-tests", "End-to-end test suites", 61.4),
        ("infra-deployments", "Cluster deployment manifests", 0.0),
        ("application-service", "Application and component controller", 78.2),
        ("build-service", "Build pipeline controller", 72.9),
    ]
    .into_iter()
    .map(|(name, description, coverage)| RepositoryQuality {
        git_organization: "redhat-appstudio".to_string(),
        repository_name: name.to_string(),
        git_url: format!("https://github.com/redhat-appstudio/{}", name),
        description: description.to_string(),
        code_coverage: coverage,
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[tokio::test]
    async fn test_static_strategy_is_idempotent() {
        let strategy = StaticRotationStrategy::builtin(Duration::from_secs(60)).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();

        let first = strategy.produce(now).await.unwrap();
        let second = strategy.produce(now).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.next_delay, Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_static_strategy_ignores_time() {
        let strategy = StaticRotationStrategy::builtin(Duration::from_secs(60)).unwrap();
        let early = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();

        assert_eq!(
            strategy.produce(early).await.unwrap(),
            strategy.produce(late).await.unwrap()
        );
    }

    #[tokio::test]
    async fn test_builtin_data_set() {
        let strategy = StaticRotationStrategy::builtin(Duration::from_secs(1)).unwrap();
        let result = strategy.produce(Utc::now()).await.unwrap();

        assert_eq!(result.entries.len(), 1);
        let entry = &result.entries[0];
        assert_eq!(entry.key, REPOSITORIES_KEY);
        let repos: Vec<RepositoryQuality> = serde_json::from_value(entry.value.clone()).unwrap();
        assert_eq!(repos, builtin_repositories());
        assert!(entry.cost > 0);
    }
}
