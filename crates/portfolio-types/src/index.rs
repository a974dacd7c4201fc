//! Per-source index records.
//!
//! Each backend produces its own record shape: `LocalIndexEntry` from the
//! on-disk portfolio, `RemoteIndexEntry` from the user's GitHub portfolio
//! repository, and `CollectionIndexEntry` from the community collection.
//! They are converted into `UnifiedEntry` before ranking.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::element::ElementType;

// ---------------------------------------------------------------------------
// Local index
// ---------------------------------------------------------------------------

/// Frontmatter-derived metadata of a local element file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementMetadata {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub triggers: Vec<String>,
}

/// An element file found in the local portfolio directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalIndexEntry {
    /// Absolute path to the element file.
    pub file_path: PathBuf,
    pub element_type: ElementType,
    pub metadata: ElementMetadata,
    pub last_modified: DateTime<Utc>,
    /// File name including extension (e.g. `"creative-writer.md"`).
    pub filename: String,
}

/// A local search hit with the provider's own relevance score in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalSearchResult {
    pub entry: LocalIndexEntry,
    pub score: f64,
}

/// Options forwarded to the local provider's search.
#[derive(Debug, Clone, Default)]
pub struct LocalSearchOptions {
    pub element_type: Option<ElementType>,
    pub limit: Option<usize>,
}

/// Statistics reported by the local provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocalIndexStats {
    pub total_elements: usize,
    pub elements_by_type: BTreeMap<ElementType, usize>,
    pub last_built: Option<DateTime<Utc>>,
    pub is_stale: bool,
}

// ---------------------------------------------------------------------------
// Remote (GitHub portfolio) index
// ---------------------------------------------------------------------------

/// One element file in the user's GitHub portfolio repository.
///
/// Built while parsing a directory listing; immutable afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteIndexEntry {
    /// Repository-relative path (e.g. `"personas/creative-writer.md"`).
    pub path: String,
    pub name: String,
    pub description: Option<String>,
    pub version: Option<String>,
    pub author: Option<String>,
    pub element_type: ElementType,
    /// Git blob sha of the file.
    pub sha: String,
    pub html_url: String,
    pub download_url: Option<String>,
    pub last_modified: DateTime<Utc>,
    pub size: u64,
}

/// Snapshot of one user's remote portfolio listing. This is the unit of
/// caching: it is rebuilt wholesale on refresh and never mutated while
/// visible to readers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemotePortfolioIndex {
    pub username: String,
    pub repository: String,
    pub last_updated: DateTime<Utc>,
    /// Always holds a key for all six element types.
    pub elements: BTreeMap<ElementType, Vec<RemoteIndexEntry>>,
    pub total_elements: usize,
    pub head_commit_sha: Option<String>,
}

impl RemotePortfolioIndex {
    /// A well-formed index with every type key present and no elements.
    pub fn empty(username: impl Into<String>, repository: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            repository: repository.into(),
            last_updated: Utc::now(),
            elements: ElementType::ALL.into_iter().map(|t| (t, Vec::new())).collect(),
            total_elements: 0,
            head_commit_sha: None,
        }
    }

    /// Assemble an index from per-type listings, filling in missing types
    /// and computing the total.
    pub fn from_listings(
        username: impl Into<String>,
        repository: impl Into<String>,
        head_commit_sha: Option<String>,
        mut elements: BTreeMap<ElementType, Vec<RemoteIndexEntry>>,
    ) -> Self {
        for t in ElementType::ALL {
            elements.entry(t).or_default();
        }
        let total_elements = elements.values().map(Vec::len).sum();
        Self {
            username: username.into(),
            repository: repository.into(),
            last_updated: Utc::now(),
            elements,
            total_elements,
            head_commit_sha,
        }
    }

    /// Entries for one element type (empty slice if none).
    pub fn entries(&self, element_type: ElementType) -> &[RemoteIndexEntry] {
        self.elements
            .get(&element_type)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// All entries across every type, in type order.
    pub fn iter_entries(&self) -> impl Iterator<Item = &RemoteIndexEntry> {
        self.elements.values().flatten()
    }
}

// ---------------------------------------------------------------------------
// Collection index
// ---------------------------------------------------------------------------

/// One element published in the community collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionIndexEntry {
    /// Collection-relative path (e.g. `"library/personas/creative-writer.md"`).
    pub path: String,
    pub element_type: ElementType,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub sha: Option<String>,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
}

/// Snapshot of the community collection's flat index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionIndex {
    pub version: String,
    pub generated: Option<DateTime<Utc>>,
    pub total_elements: usize,
    pub elements: BTreeMap<ElementType, Vec<CollectionIndexEntry>>,
}

impl CollectionIndex {
    pub fn entries(&self, element_type: ElementType) -> &[CollectionIndexEntry] {
        self.elements
            .get(&element_type)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn iter_entries(&self) -> impl Iterator<Item = &CollectionIndexEntry> {
        self.elements.values().flatten()
    }
}

// ---------------------------------------------------------------------------
// Cache introspection
// ---------------------------------------------------------------------------

/// Read-only view of a cache's state. Used by both the remote portfolio
/// cache and the collection index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    pub has_cached_data: bool,
    pub last_fetch_time: Option<DateTime<Utc>>,
    pub is_stale: bool,
    pub recent_user_action: bool,
    pub total_elements: usize,
}
