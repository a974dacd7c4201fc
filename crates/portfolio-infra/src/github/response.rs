//! Mapping of non-success GitHub responses onto [`GitHubError`].

use chrono::{DateTime, Utc};
use reqwest::header::HeaderMap;

use portfolio_types::error::GitHubError;

/// Rate-limit headers GitHub attaches to every API response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RateLimitHeaders {
    /// `x-ratelimit-remaining`
    pub remaining: Option<u64>,
    /// `x-ratelimit-reset`, seconds since the epoch.
    pub reset: Option<i64>,
    /// `retry-after`, seconds. Sent with secondary rate limits.
    pub retry_after: Option<u64>,
}

impl RateLimitHeaders {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        fn parse<T: std::str::FromStr>(headers: &HeaderMap, name: &str) -> Option<T> {
            headers.get(name)?.to_str().ok()?.trim().parse().ok()
        }
        Self {
            remaining: parse(headers, "x-ratelimit-remaining"),
            reset: parse(headers, "x-ratelimit-reset"),
            retry_after: parse(headers, "retry-after"),
        }
    }

    fn exhausted(&self) -> bool {
        self.remaining == Some(0) || self.retry_after.is_some()
    }

    /// When the limit lifts: the reset header, else now + retry-after.
    fn reset_at(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.reset
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .or_else(|| {
                self.retry_after
                    .map(|secs| now + chrono::Duration::seconds(secs as i64))
            })
    }
}

/// Classify a non-success status.
///
/// 403 is ambiguous on GitHub: it is a rate limit when the limit headers say
/// so and a permission failure otherwise.
pub fn classify_status(
    status: u16,
    rate: &RateLimitHeaders,
    url: &str,
    body: &str,
) -> GitHubError {
    let message = summarize_body(body);
    match status {
        401 => GitHubError::AuthenticationFailed(message),
        429 => GitHubError::RateLimited {
            reset_at: rate.reset_at(Utc::now()),
        },
        403 if rate.exhausted() => GitHubError::RateLimited {
            reset_at: rate.reset_at(Utc::now()),
        },
        403 => GitHubError::AuthenticationFailed(message),
        404 => GitHubError::NotFound(url.to_string()),
        _ => GitHubError::Status { status, message },
    }
}

/// GitHub error bodies are JSON with a `message` field; fall back to the
/// first line of the raw body.
fn summarize_body(body: &str) -> String {
    #[derive(serde::Deserialize)]
    struct ErrorBody {
        message: String,
    }
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        return parsed.message;
    }
    let line = body.lines().next().unwrap_or_default().trim();
    line.chars().take(200).collect()
}
