//! File-backed rotation: re-reads a JSON data set from disk on every rotation.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;

use super::{RotationEntry, RotationResult, RotationStrategy};
use crate::cache::REPOSITORIES_KEY;
use crate::error::RotationError;
use crate::models::RepositoryQuality;

/// Loads a JSON array of [`RepositoryQuality`] records from `path`.
///
/// A missing or malformed file fails the rotation; the previous cache
/// contents stay in place until the file becomes readable again.
#[derive(Debug, Clone)]
pub struct FileRotationStrategy {
    path: PathBuf,
    interval: Duration,
}

impl FileRotationStrategy {
    pub fn new(path: impl Into<PathBuf>, interval: Duration) -> Self {
        Self {
            path: path.into(),
            interval,
        }
    }
}

#[async_trait]
impl RotationStrategy for FileRotationStrategy {
    fn name(&self) -> &str {
        "file"
    }

    async fn produce(&self, _now: DateTime<Utc>) -> Result<RotationResult, RotationError> {
        let raw = tokio::fs::read(&self.path).await?;
        let repositories: Vec<RepositoryQuality> = serde_json::from_slice(&raw)?;
        debug!(path = %self.path.display(), count = repositories.len(), "Loaded repository data");

        Ok(RotationResult {
            entries: vec![RotationEntry::json(REPOSITORIES_KEY, &repositories)?],
            next_delay: self.interval,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tokio_test::{assert_err, assert_ok};

    #[tokio::test]
    async fn test_file_strategy_reads_repositories() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"git_organization":"org","repository_name":"repo","git_url":"https://example.com/org/repo","code_coverage":12.5}}]"#
        )
        .unwrap();

        let strategy = FileRotationStrategy::new(file.path(), Duration::from_secs(30));
        let result = assert_ok!(strategy.produce(Utc::now()).await);

        assert_eq!(result.next_delay, Duration::from_secs(30));
        assert_eq!(result.entries[0].key, REPOSITORIES_KEY);
        assert_eq!(result.entries[0].value[0]["repository_name"], "repo");
        assert_eq!(result.entries[0].value[0]["code_coverage"], 12.5);
    }

    #[tokio::test]
    async fn test_file_strategy_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let strategy = FileRotationStrategy::new(dir.path().join("absent.json"), Duration::from_secs(1));

        let err = assert_err!(strategy.produce(Utc::now()).await);
        assert!(matches!(err, RotationError::Io(_)));
    }

    #[tokio::test]
    async fn test_file_strategy_malformed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();

        let strategy = FileRotationStrategy::new(file.path(), Duration::from_secs(1));
        let err = assert_err!(strategy.produce(Utc::now()).await);
        assert!(matches!(err, RotationError::Decode(_)));
    }
}
