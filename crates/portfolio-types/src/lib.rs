//! Shared domain types for the federated element portfolio.
//!
//! Element types, index records from the three sources (local, GitHub,
//! collection), the unified entry shape used for ranking, configuration, and
//! the error enums shared by the core and infrastructure crates.
//!
//! Zero infrastructure dependencies -- only serde, chrono, thiserror.

pub mod config;
pub mod element;
pub mod error;
pub mod index;
pub mod unified;
