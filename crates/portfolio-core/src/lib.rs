//! Business logic and collaborator trait definitions for the federated
//! element portfolio.
//!
//! This crate defines the "ports" (collaborator traits) that the
//! infrastructure layer implements, plus the two core components built on
//! them: the remote portfolio cache and the unified search orchestrator. It
//! depends only on `portfolio-types` -- never on `portfolio-infra` or any
//! HTTP/filesystem crate.

pub mod portfolio;
pub mod repository;
pub mod search;

#[cfg(test)]
pub(crate) mod test_support;
