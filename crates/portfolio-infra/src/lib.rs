//! Infrastructure layer for the portfolio index.
//!
//! Contains implementations of the collaborator traits defined in
//! `portfolio-core`: the reqwest-backed GitHub client, the environment token
//! provider, the filesystem local index and the cached collection index,
//! plus config loading and data-directory resolution.

pub mod collection;
pub mod config;
pub mod filesystem;
pub mod github;
pub mod local;
pub mod token;
