//! Local index provider trait definition.

use portfolio_types::element::ElementType;
use portfolio_types::error::IndexError;
use portfolio_types::index::{
    LocalIndexEntry, LocalIndexStats, LocalSearchOptions, LocalSearchResult,
};

/// Index over the element files in the user's local portfolio directory.
///
/// This is the authoritative source: its results are never discounted during
/// ranking, and its versions are the baseline for update checks.
pub trait LocalIndexProvider: Send + Sync {
    /// Search local elements. Scores are in `[0, 1]`.
    fn search(
        &self,
        query: &str,
        options: &LocalSearchOptions,
    ) -> impl std::future::Future<Output = Result<Vec<LocalSearchResult>, IndexError>> + Send;

    /// Find one element by name (case-insensitive).
    fn find_by_name(
        &self,
        name: &str,
    ) -> impl std::future::Future<Output = Result<Option<LocalIndexEntry>, IndexError>> + Send;

    /// All elements of one type.
    fn elements_by_type(
        &self,
        element_type: ElementType,
    ) -> impl std::future::Future<Output = Result<Vec<LocalIndexEntry>, IndexError>> + Send;

    fn stats(&self) -> impl std::future::Future<Output = Result<LocalIndexStats, IndexError>> + Send;

    /// Discard the current snapshot and rescan.
    fn rebuild(&self) -> impl std::future::Future<Output = Result<(), IndexError>> + Send;
}
