//! Response DTOs for the quality backend API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::{Deserialize, Serialize};

/// Response body for the version endpoint (GET /version)
#[derive(Debug, Clone, Serialize)]
pub struct VersionResponse {
    /// Crate version
    pub version: String,
    /// Source revision the binary was built from
    pub commit: String,
}

impl VersionResponse {
    /// Creates a VersionResponse describing the running binary.
    ///
    /// The revision is taken from `GIT_COMMIT` at build time.
    pub fn current() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            commit: option_env!("GIT_COMMIT").unwrap_or("unknown").to_string(),
        }
    }
}

/// Quality metadata for a single source repository.
///
/// Element type of the GET /quality/repositories response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryQuality {
    /// Owning GitHub organization
    pub git_organization: String,
    /// Repository name within the organization
    pub repository_name: String,
    /// Clone URL
    pub git_url: String,
    #[serde(default)]
    pub description: String,
    /// Line coverage percentage reported by the last test run
    #[serde(default)]
    pub code_coverage: f64,
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_response_serialize() {
        let resp = VersionResponse::current();
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
        assert!(json["commit"].is_string());
    }

    #[test]
    fn test_repository_defaults_optional_fields() {
        let json = r#"{
            "git_organization": "redhat-appstudio",
            "repository_name": "e2e-tests",
            "git_url": "https://github.com/redhat-appstudio/e2e-tests"
        }"#;
        let repo: RepositoryQuality = serde_json::from_str(json).unwrap();
        assert_eq!(repo.repository_name, "e2e-tests");
        assert_eq!(repo.description, "");
        assert_eq!(repo.code_coverage, 0.0);
    }

    #[test]
    fn test_repository_requires_name() {
        let json = r#"{"git_organization": "redhat-appstudio"}"#;
        assert!(serde_json::from_str::<RepositoryQuality>(json).is_err());
    }

    #[test]
    fn test_error_response_serialize() {
        let resp = ErrorResponse::new("Something went wrong");
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("error"));
        assert!(json.contains("Something went wrong"));
    }
}
