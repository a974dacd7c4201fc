//! Unified search across the local, GitHub and collection sources.

pub mod convert;
pub mod rank;
pub mod unified;
pub mod version;

pub use unified::UnifiedIndexManager;
