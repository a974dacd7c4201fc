//! reqwest-backed [`GitHubClient`].
//!
//! Every URL is checked against the host allow-list before a request is
//! built, because directory listings hand back `download_url`s the remote
//! side controls. The token is wrapped in [`secrecy::SecretString`] and only
//! exposed while building the `Authorization` header.

use std::time::Duration;

use reqwest::Url;
use secrecy::ExposeSecret;
use serde_json::Value;
use tracing::debug;

use portfolio_core::repository::github::GitHubClient;
use portfolio_core::repository::token::TokenProvider;
use portfolio_types::config::GitHubSettings;
use portfolio_types::error::GitHubError;

use super::response::{RateLimitHeaders, classify_status};

/// Hosts requests may be sent to.
const ALLOWED_HOSTS: [&str; 2] = ["api.github.com", "raw.githubusercontent.com"];

const USER_AGENT: &str = concat!("pfolio/", env!("CARGO_PKG_VERSION"));
const API_VERSION: &str = "2022-11-28";
const ACCEPT_JSON: &str = "application/vnd.github+json";
const ACCEPT_RAW: &str = "application/vnd.github.raw";

/// Base delay before the first retry; doubled on each further attempt.
const RETRY_BASE_DELAY: Duration = Duration::from_millis(250);

/// GitHub REST client.
pub struct HttpGitHubClient<T> {
    http: reqwest::Client,
    tokens: T,
    max_retries: u32,
    retry_base_delay: Duration,
}

impl<T: TokenProvider> HttpGitHubClient<T> {
    pub fn new(tokens: T, timeout: Duration, max_retries: u32) -> Result<Self, GitHubError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| GitHubError::Transport(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            http,
            tokens,
            max_retries,
            retry_base_delay: RETRY_BASE_DELAY,
        })
    }

    pub fn from_settings(tokens: T, settings: &GitHubSettings) -> Result<Self, GitHubError> {
        Self::new(tokens, settings.request_timeout(), settings.max_retries)
    }

    /// GET with retries on transient failures.
    async fn get(&self, raw_url: &str, accept: &str) -> Result<reqwest::Response, GitHubError> {
        let url = validate_url(raw_url)?;
        let mut attempt = 0u32;
        loop {
            match self.send_once(&url, accept).await {
                Ok(response) => return Ok(response),
                Err(err) if err.is_transient() && attempt < self.max_retries => {
                    let delay = backoff_delay(self.retry_base_delay, attempt);
                    debug!(
                        url = %url,
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Retrying GitHub request"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn send_once(&self, url: &Url, accept: &str) -> Result<reqwest::Response, GitHubError> {
        let mut request = self
            .http
            .get(url.clone())
            .header("accept", accept)
            .header("x-github-api-version", API_VERSION);
        if let Some(token) = self.tokens.get_token().await {
            request = request.bearer_auth(token.expose_secret());
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                GitHubError::Timeout(url.to_string())
            } else {
                GitHubError::Transport(format!("request to {url} failed: {e}"))
            }
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let rate = RateLimitHeaders::from_headers(response.headers());
        let body = response.text().await.unwrap_or_default();
        Err(classify_status(status.as_u16(), &rate, url.as_str(), &body))
    }
}

impl<T: TokenProvider> GitHubClient for HttpGitHubClient<T> {
    async fn fetch_json(&self, url: &str) -> Result<Value, GitHubError> {
        let response = self.get(url, ACCEPT_JSON).await?;
        response
            .json::<Value>()
            .await
            .map_err(|e| GitHubError::InvalidResponse(format!("{url}: {e}")))
    }

    async fn fetch_text(&self, url: &str) -> Result<String, GitHubError> {
        let response = self.get(url, ACCEPT_RAW).await?;
        response.text().await.map_err(|e| {
            if e.is_timeout() {
                GitHubError::Timeout(url.to_string())
            } else {
                GitHubError::Transport(format!("failed to read body of {url}: {e}"))
            }
        })
    }
}

/// Parse `raw` and accept it only if it is plain `https` to an allowed host.
///
/// Userinfo and non-default ports are refused so that a URL cannot smuggle
/// a different destination past the host check.
pub fn validate_url(raw: &str) -> Result<Url, GitHubError> {
    let disallowed = |why: &str| GitHubError::DisallowedUrl(format!("{raw}: {why}"));
    let url = Url::parse(raw).map_err(|e| disallowed(&e.to_string()))?;

    if url.scheme() != "https" {
        return Err(disallowed("only https is allowed"));
    }
    if !url.username().is_empty() || url.password().is_some() {
        return Err(disallowed("credentials in URL"));
    }
    if url.port().is_some_and(|p| p != 443) {
        return Err(disallowed("non-standard port"));
    }
    match url.host_str() {
        Some(host) if ALLOWED_HOSTS.contains(&host) => Ok(url),
        _ => Err(disallowed("host is not a GitHub API host")),
    }
}

fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(2u32.saturating_pow(attempt))
}
