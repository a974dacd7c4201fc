//! GitHub REST access.
//!
//! [`HttpGitHubClient`] implements the core `GitHubClient` trait on top of
//! reqwest. Requests are limited to the GitHub API and raw-content hosts.

pub mod client;
pub mod response;

pub use client::{HttpGitHubClient, validate_url};
