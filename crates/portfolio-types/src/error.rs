use std::fmt;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::element::Source;

/// Errors from the GitHub API client.
#[derive(Debug, Clone, Error)]
pub enum GitHubError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("GitHub rate limit exceeded (resets at {reset_at:?})")]
    RateLimited { reset_at: Option<DateTime<Utc>> },

    #[error("GitHub authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("URL not allowed: {0}")]
    DisallowedUrl(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("GitHub returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("unsupported operation: {0}")]
    Unsupported(String),
}

impl GitHubError {
    /// Whether retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Timeout(_) => true,
            Self::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Errors from a single source's index operations.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("local index error: {0}")]
    Local(String),

    #[error("collection index error: {0}")]
    Collection(String),

    #[error("remote index error: {0}")]
    Remote(#[from] GitHubError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(String),
}

/// One reason a source priority list was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PriorityIssue {
    EmptyPriority,
    DuplicateSource(Source),
    UnknownSource(String),
}

impl fmt::Display for PriorityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyPriority => write!(f, "priority list cannot be empty"),
            Self::DuplicateSource(source) => {
                write!(f, "duplicate source in priority list: '{source}'")
            }
            Self::UnknownSource(name) => write!(f, "unknown source in priority list: '{name}'"),
        }
    }
}

/// Caller misconfiguration. The only error class raised synchronously.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("invalid source priority: {}", join_issues(.issues))]
    InvalidSourcePriority { issues: Vec<PriorityIssue> },

    #[error("invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

fn join_issues(issues: &[PriorityIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
