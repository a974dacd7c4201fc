//! Collaborator traits consumed by the core.
//!
//! Implementations live in `portfolio-infra`; tests use the fakes in
//! `crate::test_support`.

pub mod collection;
pub mod github;
pub mod local;
pub mod token;
