//! Community collection index client.
//!
//! Fetches the collection's published `collection-index.json` through the
//! GitHub client and caches it in memory and on disk under
//! `{data_dir}/cache/collection-index.json`.
//!
//! Lookup order: fresh memory, fresh disk cache, network, then whatever is
//! left (stale memory, stale disk) when the network fails.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use portfolio_core::repository::collection::CollectionIndexProvider;
use portfolio_core::repository::github::GitHubClient;
use portfolio_types::config::CollectionSettings;
use portfolio_types::element::ElementType;
use portfolio_types::error::IndexError;
use portfolio_types::index::{CacheStats, CollectionIndex, CollectionIndexEntry};

#[derive(Debug, Clone)]
struct CachedIndex {
    fetched_at: DateTime<Utc>,
    index: Arc<CollectionIndex>,
}

/// On-disk cache record.
#[derive(Serialize)]
struct DiskRecordRef<'a> {
    fetched_at: DateTime<Utc>,
    index: &'a CollectionIndex,
}

#[derive(Deserialize)]
struct DiskRecord {
    fetched_at: DateTime<Utc>,
    index: CollectionIndex,
}

pub struct HttpCollectionIndex<G> {
    github: G,
    index_url: String,
    ttl: Duration,
    cache_path: PathBuf,
    memory: RwLock<Option<CachedIndex>>,
    fetch_lock: Mutex<()>,
}

impl<G: GitHubClient> HttpCollectionIndex<G> {
    pub fn new(github: G, index_url: impl Into<String>, ttl: Duration, cache_path: PathBuf) -> Self {
        Self {
            github,
            index_url: index_url.into(),
            ttl,
            cache_path,
            memory: RwLock::new(None),
            fetch_lock: Mutex::new(()),
        }
    }

    pub fn from_settings(github: G, settings: &CollectionSettings, cache_path: PathBuf) -> Self {
        Self::new(github, settings.index_url.clone(), settings.cache_ttl(), cache_path)
    }

    fn is_fresh(&self, cached: &CachedIndex) -> bool {
        Utc::now()
            .signed_duration_since(cached.fetched_at)
            .to_std()
            .is_ok_and(|age| age < self.ttl)
    }

    fn from_memory(&self) -> Option<CachedIndex> {
        self.memory
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn store(&self, cached: CachedIndex) {
        *self.memory.write().unwrap_or_else(PoisonError::into_inner) = Some(cached);
    }

    /// Load the disk cache regardless of age. Unreadable caches are ignored.
    async fn load_cache(&self) -> Option<CachedIndex> {
        let content = tokio::fs::read_to_string(&self.cache_path).await.ok()?;
        match serde_json::from_str::<DiskRecord>(&content) {
            Ok(record) => Some(CachedIndex {
                fetched_at: record.fetched_at,
                index: Arc::new(record.index),
            }),
            Err(e) => {
                debug!(
                    path = %self.cache_path.display(),
                    error = %e,
                    "Ignoring corrupt collection cache"
                );
                None
            }
        }
    }

    async fn save_cache(&self, cached: &CachedIndex) -> anyhow::Result<()> {
        if let Some(dir) = self.cache_path.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .with_context(|| format!("Failed to create cache dir: {}", dir.display()))?;
        }
        let record = DiskRecordRef {
            fetched_at: cached.fetched_at,
            index: &cached.index,
        };
        let content =
            serde_json::to_string_pretty(&record).context("Failed to serialize collection index")?;
        tokio::fs::write(&self.cache_path, content)
            .await
            .with_context(|| format!("Failed to write cache: {}", self.cache_path.display()))?;
        Ok(())
    }

    async fn fetch(&self) -> Result<CollectionIndex, IndexError> {
        let value = self.github.fetch_json(&self.index_url).await?;
        let raw: RawCollectionIndex = serde_json::from_value(value)
            .map_err(|e| IndexError::Parse(format!("collection index: {e}")))?;
        Ok(raw.into_index())
    }
}

impl<G: GitHubClient> CollectionIndexProvider for HttpCollectionIndex<G> {
    async fn get_index(&self) -> Result<Arc<CollectionIndex>, IndexError> {
        if let Some(cached) = self.from_memory().filter(|c| self.is_fresh(c)) {
            return Ok(cached.index);
        }

        let _guard = self.fetch_lock.lock().await;
        if let Some(cached) = self.from_memory().filter(|c| self.is_fresh(c)) {
            return Ok(cached.index);
        }

        let disk = self.load_cache().await;
        if let Some(cached) = disk.as_ref().filter(|c| self.is_fresh(c)) {
            debug!(total = cached.index.total_elements, "Using cached collection index");
            self.store(cached.clone());
            return Ok(cached.index.clone());
        }

        match self.fetch().await {
            Ok(index) => {
                let cached = CachedIndex {
                    fetched_at: Utc::now(),
                    index: Arc::new(index),
                };
                if let Err(e) = self.save_cache(&cached).await {
                    warn!(error = %e, "Failed to persist collection index");
                }
                debug!(total = cached.index.total_elements, "Collection index fetched");
                let index = cached.index.clone();
                self.store(cached);
                Ok(index)
            }
            Err(e) => {
                let stale = self.from_memory().or(disk);
                match stale {
                    Some(cached) => {
                        warn!(error = %e, "Collection fetch failed, serving stale index");
                        let index = cached.index.clone();
                        self.store(cached);
                        Ok(index)
                    }
                    None => Err(e),
                }
            }
        }
    }

    fn cache_stats(&self) -> CacheStats {
        match self.from_memory() {
            Some(cached) => CacheStats {
                has_cached_data: true,
                last_fetch_time: Some(cached.fetched_at),
                is_stale: !self.is_fresh(&cached),
                recent_user_action: false,
                total_elements: cached.index.total_elements,
            },
            None => CacheStats {
                is_stale: true,
                ..CacheStats::default()
            },
        }
    }

    async fn clear_cache(&self) {
        *self.memory.write().unwrap_or_else(PoisonError::into_inner) = None;
        match tokio::fs::remove_file(&self.cache_path).await {
            Ok(()) => debug!("Collection cache cleared"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                path = %self.cache_path.display(),
                error = %e,
                "Failed to remove collection cache"
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Published JSON shape
// ---------------------------------------------------------------------------

/// `collection-index.json` as published: entries grouped under plural
/// directory names (`"personas"`, `"skills"`, ...).
#[derive(Debug, Deserialize)]
struct RawCollectionIndex {
    #[serde(default)]
    version: String,
    #[serde(default)]
    generated: Option<DateTime<Utc>>,
    #[serde(alias = "elements")]
    index: BTreeMap<String, Vec<RawCollectionEntry>>,
}

#[derive(Debug, Deserialize)]
struct RawCollectionEntry {
    path: String,
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    sha: Option<String>,
    #[serde(default)]
    created: Option<DateTime<Utc>>,
}

impl RawCollectionIndex {
    fn into_index(self) -> CollectionIndex {
        let mut elements: BTreeMap<ElementType, Vec<CollectionIndexEntry>> = BTreeMap::new();
        for (group, raw_entries) in self.index {
            let Some(element_type) = ElementType::from_dir_name(&group)
                .or_else(|| group.parse().ok())
            else {
                debug!(%group, "Skipping unknown collection group");
                continue;
            };
            elements
                .entry(element_type)
                .or_default()
                .extend(raw_entries.into_iter().map(|raw| CollectionIndexEntry {
                    path: raw.path,
                    element_type,
                    name: raw.name,
                    description: raw.description,
                    version: raw.version,
                    author: raw.author,
                    tags: raw.tags,
                    sha: raw.sha,
                    created: raw.created,
                }));
        }
        let total_elements = elements.values().map(Vec::len).sum();
        CollectionIndex {
            version: self.version,
            generated: self.generated,
            total_elements,
            elements,
        }
    }
}
