//! GitHub API client trait definition.

use portfolio_types::error::GitHubError;

/// GitHub REST API base URL.
pub const GITHUB_API_BASE: &str = "https://api.github.com";

/// GitHub raw content base URL.
pub const GITHUB_RAW_BASE: &str = "https://raw.githubusercontent.com";

/// Thin authenticated HTTP client for the GitHub REST API.
///
/// Implementations must refuse any URL outside the two known GitHub hosts
/// (API and raw content), since listing responses contain URLs that the
/// remote side controls.
pub trait GitHubClient: Send + Sync {
    /// GET a URL and parse the body as JSON.
    fn fetch_json(
        &self,
        url: &str,
    ) -> impl std::future::Future<Output = Result<serde_json::Value, GitHubError>> + Send;

    /// GET a URL and return the body as text (raw file content).
    fn fetch_text(
        &self,
        url: &str,
    ) -> impl std::future::Future<Output = Result<String, GitHubError>> + Send;
}

impl<T: GitHubClient> GitHubClient for std::sync::Arc<T> {
    fn fetch_json(
        &self,
        url: &str,
    ) -> impl std::future::Future<Output = Result<serde_json::Value, GitHubError>> + Send {
        (**self).fetch_json(url)
    }

    fn fetch_text(
        &self,
        url: &str,
    ) -> impl std::future::Future<Output = Result<String, GitHubError>> + Send {
        (**self).fetch_text(url)
    }
}
