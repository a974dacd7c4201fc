//! The unified, source-agnostic view used for ranking and deduplication.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::element::{ElementType, Source};

// ---------------------------------------------------------------------------
// Entries
// ---------------------------------------------------------------------------

/// Where a unified entry came from. Exactly one provenance exists per entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "lowercase")]
pub enum Provenance {
    Local {
        file_path: PathBuf,
    },
    #[serde(rename = "github")]
    GitHub {
        path: String,
        sha: String,
    },
    Collection {
        path: String,
    },
}

impl Provenance {
    pub fn source(&self) -> Source {
        match self {
            Self::Local { .. } => Source::Local,
            Self::GitHub { .. } => Source::GitHub,
            Self::Collection { .. } => Source::Collection,
        }
    }
}

/// An element from any source, normalized into one shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnifiedEntry {
    pub name: String,
    pub element_type: ElementType,
    pub description: Option<String>,
    pub version: Option<String>,
    pub author: Option<String>,
    pub tags: Vec<String>,
    pub last_modified: Option<DateTime<Utc>>,
    pub provenance: Provenance,
}

impl UnifiedEntry {
    pub fn source(&self) -> Source {
        self.provenance.source()
    }

    /// `lowercase(name) + "::" + element_type`: case-insensitive on the name,
    /// sensitive to the type.
    pub fn dedup_key(&self) -> String {
        dedup_key(&self.name, self.element_type)
    }
}

/// Build the deduplication key for a name and element type.
pub fn dedup_key(name: &str, element_type: ElementType) -> String {
    format!("{}::{}", name.to_lowercase(), element_type)
}

/// A ranked search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnifiedSearchResult {
    pub entry: UnifiedEntry,
    pub source: Source,
    /// Source-weighted relevance.
    pub score: f64,
    /// Set on every result that shares a dedup key with another result.
    pub is_duplicate: bool,
}

// ---------------------------------------------------------------------------
// Search options
// ---------------------------------------------------------------------------

/// Ordering applied to search results before pagination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    /// Weighted score, descending.
    #[default]
    Relevance,
    /// Element name, case-insensitive ascending.
    Name,
    /// Effective source priority, then score.
    Source,
}

impl std::str::FromStr for SortBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "relevance" | "score" => Ok(Self::Relevance),
            "name" => Ok(Self::Name),
            "source" => Ok(Self::Source),
            _ => Err(format!("unknown sort order: '{s}'")),
        }
    }
}

/// Options for a unified search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchOptions {
    pub query: String,
    pub include_local: bool,
    pub include_github: bool,
    pub include_collection: bool,
    /// Query every enabled source, ignoring stop-on-first.
    pub include_all: bool,
    /// Source tried first, ahead of the configured order.
    pub preferred_source: Option<Source>,
    /// Replaces the configured ordering for this search only.
    pub source_priority: Option<Vec<Source>>,
    pub element_type: Option<ElementType>,
    /// 1-based page number; only used together with `page_size`.
    pub page: Option<usize>,
    pub page_size: Option<usize>,
    pub sort: SortBy,
}

impl SearchOptions {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    pub fn include_all(mut self) -> Self {
        self.include_all = true;
        self
    }

    pub fn includes(&self, source: Source) -> bool {
        match source {
            Source::Local => self.include_local,
            Source::GitHub => self.include_github,
            Source::Collection => self.include_collection,
        }
    }
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            query: String::new(),
            include_local: true,
            include_github: true,
            include_collection: true,
            include_all: false,
            preferred_source: None,
            source_priority: None,
            element_type: None,
            page: None,
            page_size: None,
            sort: SortBy::Relevance,
        }
    }
}

// ---------------------------------------------------------------------------
// Update checks
// ---------------------------------------------------------------------------

/// Version information for one source that has the element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceVersion {
    pub version: Option<String>,
    pub last_modified: Option<DateTime<Utc>>,
}

/// Result of comparing an element's versions across sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionComparison {
    pub name: String,
    pub versions_by_source: BTreeMap<Source, SourceVersion>,
    pub update_available: bool,
    pub update_from_source: Option<Source>,
}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// One source's contribution to the aggregate stats.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceStats {
    pub available: bool,
    pub total_elements: usize,
    pub elements_by_type: BTreeMap<ElementType, usize>,
    pub last_updated: Option<DateTime<Utc>>,
    pub is_stale: bool,
}

impl SourceStats {
    /// Zeroed stats for a source whose stats call failed.
    pub fn unavailable() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CombinedStats {
    /// Plain sum of the per-source totals. Elements present in several
    /// sources are counted once per source.
    pub total_elements: usize,
    pub sources_available: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UnifiedStats {
    pub local: SourceStats,
    pub github: SourceStats,
    pub collection: SourceStats,
    pub combined: CombinedStats,
}

// ---------------------------------------------------------------------------
// Cache invalidation
// ---------------------------------------------------------------------------

/// A write the caller performed that the caches cannot observe on their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Submit,
    Create,
    Update,
    Delete,
    Sync,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Submit => "submit",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Sync => "sync",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for ActionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "submit" => Ok(Self::Submit),
            "create" => Ok(Self::Create),
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            "sync" => Ok(Self::Sync),
            _ => Err(format!("unknown action: '{s}'")),
        }
    }
}
