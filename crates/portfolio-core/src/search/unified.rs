//! Unified index manager.
//!
//! Queries the three sources in priority order, applies the stop-on-first
//! and fallback policies, then merges, flags duplicates and ranks. A failing
//! source is logged and contributes nothing; only configuration errors are
//! returned to the caller.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use tracing::{debug, info, warn};

use portfolio_types::config::{
    PortfolioConfig, SearchSettings, SourcePriorityConfig, validate_priority,
};
use portfolio_types::element::{ElementType, Source};
use portfolio_types::error::{ConfigError, IndexError};
use portfolio_types::index::LocalSearchOptions;
use portfolio_types::unified::{
    ActionKind, CombinedStats, SearchOptions, SourceStats, SourceVersion, UnifiedEntry,
    UnifiedSearchResult, UnifiedStats, VersionComparison,
};

use super::convert::{convert_collection_entry, convert_local_entry, convert_remote_entry};
use super::rank::{
    apply_source_weights, mark_duplicates, names_match, paginate, sort_results, text_score,
};
use super::version::newest_update;
use crate::portfolio::RemotePortfolioCache;
use crate::repository::collection::CollectionIndexProvider;
use crate::repository::github::GitHubClient;
use crate::repository::local::LocalIndexProvider;
use crate::repository::token::TokenProvider;

/// Source whose version is treated as the installed one in update checks.
const AUTHORITATIVE_SOURCE: Source = Source::Local;

/// Orchestrates search over the local index, the remote portfolio cache and
/// the collection index.
///
/// Generic over the collaborator traits so the core never depends on the
/// infrastructure crate. The remote cache is shared through an `Arc` so the
/// same instance can be handed to other consumers.
pub struct UnifiedIndexManager<L, C, G, T> {
    local: L,
    collection: C,
    remote: Arc<RemotePortfolioCache<G, T>>,
    priority: SourcePriorityConfig,
    settings: SearchSettings,
}

impl<L, C, G, T> UnifiedIndexManager<L, C, G, T>
where
    L: LocalIndexProvider,
    C: CollectionIndexProvider,
    G: GitHubClient,
    T: TokenProvider,
{
    pub fn new(
        local: L,
        collection: C,
        remote: Arc<RemotePortfolioCache<G, T>>,
        priority: SourcePriorityConfig,
        settings: SearchSettings,
    ) -> Result<Self, ConfigError> {
        settings.validate()?;
        Ok(Self {
            local,
            collection,
            remote,
            priority,
            settings,
        })
    }

    /// Build from a loaded config, validating it first.
    pub fn from_config(
        local: L,
        collection: C,
        remote: Arc<RemotePortfolioCache<G, T>>,
        config: &PortfolioConfig,
    ) -> Result<Self, ConfigError> {
        let priority = config.validate()?;
        Self::new(local, collection, remote, priority, config.search.clone())
    }

    pub fn remote(&self) -> &RemotePortfolioCache<G, T> {
        &self.remote
    }

    pub fn priority_config(&self) -> &SourcePriorityConfig {
        &self.priority
    }

    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    // -- search -----------------------------------------------------------

    /// Search every enabled source in priority order.
    ///
    /// Fails only when `options.source_priority` is an invalid ordering.
    pub async fn search(
        &self,
        options: &SearchOptions,
    ) -> Result<Vec<UnifiedSearchResult>, ConfigError> {
        let order = self.effective_order(options)?;
        let mut results = self.collect(options, &order).await;

        sort_results(&mut results, options.sort, &order);

        let page_size = options
            .page_size
            .or(options.page.map(|_| self.settings.default_page_size));
        if let Some(page_size) = page_size {
            results = paginate(results, options.page.unwrap_or(1), page_size);
        }
        Ok(results)
    }

    /// Source order for one search: the override list or the configured
    /// priority, with the preferred source moved to the front, restricted
    /// to the enabled sources.
    fn effective_order(&self, options: &SearchOptions) -> Result<Vec<Source>, ConfigError> {
        let mut order = match &options.source_priority {
            Some(custom) => {
                validate_priority(custom)?;
                custom.clone()
            }
            None => self.priority.priority().to_vec(),
        };
        if let Some(preferred) = options.preferred_source {
            order.retain(|s| *s != preferred);
            order.insert(0, preferred);
        }
        order.retain(|s| options.includes(*s));
        Ok(order)
    }

    /// Query sources in `order`, then flag duplicates and weight scores.
    async fn collect(
        &self,
        options: &SearchOptions,
        order: &[Source],
    ) -> Vec<UnifiedSearchResult> {
        if order.is_empty() {
            debug!("All sources disabled, returning no results");
            return Vec::new();
        }

        let mut results = Vec::new();
        let mut queried = 0usize;
        for &source in order {
            match self.query_source(source, options).await {
                Ok(found) => {
                    queried += 1;
                    let produced = !found.is_empty();
                    debug!(%source, count = found.len(), "Source searched");
                    results.extend(found);
                    if produced && self.priority.stop_on_first && !options.include_all {
                        break;
                    }
                }
                Err(e) => {
                    warn!(%source, error = %e, query = %options.query, "Source search failed");
                    if !self.priority.fallback_on_error {
                        break;
                    }
                }
            }
        }

        if queried > 1 {
            mark_duplicates(&mut results);
        }
        apply_source_weights(&mut results, &self.settings);
        results
    }

    async fn query_source(
        &self,
        source: Source,
        options: &SearchOptions,
    ) -> Result<Vec<UnifiedSearchResult>, IndexError> {
        let query = options.query.trim();
        let wanted = |t: ElementType| options.element_type.is_none_or(|w| w == t);

        let results = match source {
            Source::Local => {
                let local_options = LocalSearchOptions {
                    element_type: options.element_type,
                    limit: None,
                };
                self.local
                    .search(query, &local_options)
                    .await?
                    .into_iter()
                    .filter(|r| wanted(r.entry.element_type))
                    .map(|r| tagged(convert_local_entry(&r.entry), r.score))
                    .collect()
            }
            Source::GitHub => {
                let index = self.remote.get_index().await;
                index
                    .iter_entries()
                    .filter(|e| wanted(e.element_type))
                    .filter_map(|e| {
                        text_score(query, &e.name, &[], e.description.as_deref())
                            .map(|score| tagged(convert_remote_entry(e), score))
                    })
                    .collect()
            }
            Source::Collection => {
                let index = self.collection.get_index().await?;
                index
                    .iter_entries()
                    .filter(|e| wanted(e.element_type))
                    .filter_map(|e| {
                        text_score(query, &e.name, &e.tags, e.description.as_deref())
                            .map(|score| tagged(convert_collection_entry(e), score))
                    })
                    .collect()
            }
        };
        Ok(results)
    }

    // -- lookups ----------------------------------------------------------

    /// First match for `name` in priority order. Later sources are not
    /// consulted once one matches.
    pub async fn find_by_name(&self, name: &str) -> Option<UnifiedEntry> {
        let mut found = None;
        for &source in self.priority.priority() {
            match self.find_in_source(source, name).await {
                Ok(Some(entry)) => {
                    debug!(%source, %name, "Element found");
                    found = Some(entry);
                    break;
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(%source, %name, error = %e, "Lookup failed");
                    if !self.priority.fallback_on_error {
                        break;
                    }
                }
            }
        }

        if found.is_some() && self.priority.check_all_for_updates {
            let update = self
                .check_for_updates(name)
                .await
                .and_then(|c| c.update_from_source);
            if let Some(from) = update {
                info!(%name, source = %from, "Newer version available");
            }
        }
        found
    }

    async fn find_in_source(
        &self,
        source: Source,
        name: &str,
    ) -> Result<Option<UnifiedEntry>, IndexError> {
        let entry = match source {
            Source::Local => self
                .local
                .find_by_name(name)
                .await?
                .map(|e| convert_local_entry(&e)),
            // Exact (case-insensitive) names win over slug-form matches.
            Source::GitHub => {
                let index = self.remote.get_index().await;
                index
                    .iter_entries()
                    .find(|e| e.name.eq_ignore_ascii_case(name))
                    .or_else(|| index.iter_entries().find(|e| names_match(name, &e.name)))
                    .map(convert_remote_entry)
            }
            Source::Collection => {
                let index = self.collection.get_index().await?;
                index
                    .iter_entries()
                    .find(|e| e.name.eq_ignore_ascii_case(name))
                    .or_else(|| index.iter_entries().find(|e| names_match(name, &e.name)))
                    .map(convert_collection_entry)
            }
        };
        Ok(entry)
    }

    /// Every element of one type, one entry per dedup key. The entry from
    /// the highest-priority source wins.
    pub async fn get_elements_by_type(&self, element_type: ElementType) -> Vec<UnifiedEntry> {
        let mut seen = HashSet::new();
        let mut merged = Vec::new();

        for &source in self.priority.priority() {
            let entries = match self.list_source(source, element_type).await {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(%source, %element_type, error = %e, "Listing failed");
                    continue;
                }
            };
            for entry in entries {
                if seen.insert(entry.dedup_key()) {
                    merged.push(entry);
                }
            }
        }
        merged
    }

    async fn list_source(
        &self,
        source: Source,
        element_type: ElementType,
    ) -> Result<Vec<UnifiedEntry>, IndexError> {
        let entries = match source {
            Source::Local => self
                .local
                .elements_by_type(element_type)
                .await?
                .iter()
                .map(convert_local_entry)
                .collect(),
            Source::GitHub => {
                let index = self.remote.get_index().await;
                index
                    .entries(element_type)
                    .iter()
                    .map(convert_remote_entry)
                    .collect()
            }
            Source::Collection => {
                let index = self.collection.get_index().await?;
                index
                    .entries(element_type)
                    .iter()
                    .map(convert_collection_entry)
                    .collect()
            }
        };
        Ok(entries)
    }

    /// Compare the versions of `name` held by every source.
    ///
    /// `None` when no source has the element. The local copy is the
    /// baseline; without one, no update is reported.
    pub async fn check_for_updates(&self, name: &str) -> Option<VersionComparison> {
        let options = SearchOptions::new(name).include_all();
        let order = self.priority.priority().to_vec();
        let mut results = self.collect(&options, &order).await;
        sort_results(&mut results, options.sort, &order);

        let mut versions_by_source = BTreeMap::new();
        for r in results.iter().filter(|r| names_match(name, &r.entry.name)) {
            versions_by_source
                .entry(r.source)
                .or_insert_with(|| SourceVersion {
                    version: r.entry.version.clone(),
                    last_modified: r.entry.last_modified,
                });
        }
        if versions_by_source.is_empty() {
            return None;
        }

        let update_from_source = newest_update(&versions_by_source, AUTHORITATIVE_SOURCE, &order);
        Some(VersionComparison {
            name: name.to_string(),
            update_available: update_from_source.is_some(),
            update_from_source,
            versions_by_source,
        })
    }

    // -- stats and maintenance --------------------------------------------

    /// Per-source statistics. A failing source reports as unavailable with
    /// zero elements.
    pub async fn get_stats(&self) -> UnifiedStats {
        let local = match self.local.stats().await {
            Ok(stats) => SourceStats {
                available: true,
                total_elements: stats.total_elements,
                elements_by_type: stats.elements_by_type,
                last_updated: stats.last_built,
                is_stale: stats.is_stale,
            },
            Err(e) => {
                warn!(error = %e, "Local stats unavailable");
                SourceStats::unavailable()
            }
        };

        let github = {
            let index = self.remote.get_index().await;
            let cache = self.remote.cache_stats();
            SourceStats {
                available: cache.has_cached_data,
                total_elements: index.total_elements,
                elements_by_type: index
                    .elements
                    .iter()
                    .map(|(t, entries)| (*t, entries.len()))
                    .collect(),
                last_updated: cache.last_fetch_time,
                is_stale: cache.is_stale,
            }
        };

        let collection = match self.collection.get_index().await {
            Ok(index) => {
                let cache = self.collection.cache_stats();
                SourceStats {
                    available: true,
                    total_elements: index.total_elements,
                    elements_by_type: index
                        .elements
                        .iter()
                        .map(|(t, entries)| (*t, entries.len()))
                        .collect(),
                    last_updated: cache.last_fetch_time.or(index.generated),
                    is_stale: cache.is_stale,
                }
            }
            Err(e) => {
                warn!(error = %e, "Collection stats unavailable");
                SourceStats::unavailable()
            }
        };

        // Elements present in several sources are counted once per source.
        let combined = CombinedStats {
            total_elements: local.total_elements
                + github.total_elements
                + collection.total_elements,
            sources_available: [&local, &github, &collection]
                .iter()
                .filter(|s| s.available)
                .count(),
        };

        UnifiedStats {
            local,
            github,
            collection,
            combined,
        }
    }

    /// Refresh what a write to the portfolio can have changed: the local
    /// index is rebuilt and the remote cache invalidated. The collection is
    /// left alone.
    pub async fn invalidate_after_action(&self, action: ActionKind) {
        if let Err(e) = self.local.rebuild().await {
            warn!(%action, error = %e, "Local index rebuild failed");
        }
        self.remote.invalidate_after_action(action);
    }

    /// Discard cached state in all three sources. A failed local rebuild is
    /// logged; the remote and collection caches are cleared regardless.
    pub async fn rebuild_all(&self) {
        self.remote.clear_cache();
        self.collection.clear_cache().await;
        match self.local.rebuild().await {
            Ok(()) => info!("All source indexes rebuilt"),
            Err(e) => warn!(error = %e, "Local index rebuild failed"),
        }
    }
}

fn tagged(entry: UnifiedEntry, score: f64) -> UnifiedSearchResult {
    UnifiedSearchResult {
        source: entry.source(),
        entry,
        score,
        is_duplicate: false,
    }
}
