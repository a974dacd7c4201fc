//! Collection index provider trait definition.

use std::sync::Arc;

use portfolio_types::error::IndexError;
use portfolio_types::index::{CacheStats, CollectionIndex};

/// Cached snapshot of the community collection's flat index.
///
/// The collection is not expected to reflect local or remote portfolio
/// writes, so the orchestrator never invalidates it after an action.
pub trait CollectionIndexProvider: Send + Sync {
    /// Return the current snapshot, fetching it if needed.
    fn get_index(
        &self,
    ) -> impl std::future::Future<Output = Result<Arc<CollectionIndex>, IndexError>> + Send;

    fn cache_stats(&self) -> CacheStats;

    /// Drop every cached copy of the index.
    fn clear_cache(&self) -> impl std::future::Future<Output = ()> + Send;
}
