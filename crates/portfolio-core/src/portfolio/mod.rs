//! Remote portfolio indexing.

pub mod frontmatter;
pub mod remote_cache;

pub use remote_cache::{RemoteCacheConfig, RemotePortfolioCache, UNKNOWN_USERNAME};
