//! Cached mirror of one user's GitHub-hosted portfolio listing.
//!
//! [`RemotePortfolioCache::get_index`] is a total function: it serves the
//! cached snapshot while fresh, refreshes it when stale or invalidated, and on
//! any refresh failure falls back to the previous snapshot (however old) or
//! to a well-formed empty index. Indexing failures never reach search.
//!
//! The snapshot is an `Arc<RemotePortfolioIndex>` swapped under a lock, so a
//! reader sees either the old or the new index in full. Refreshes are
//! serialized through an async mutex; callers that queue behind an in-flight
//! refresh reuse its result instead of fetching again.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use futures_util::{StreamExt, TryStreamExt};
use futures_util::future::join_all;
use futures_util::stream;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use portfolio_types::config::GitHubSettings;
use portfolio_types::element::ElementType;
use portfolio_types::error::GitHubError;
use portfolio_types::index::{CacheStats, RemoteIndexEntry, RemotePortfolioIndex};
use portfolio_types::unified::ActionKind;

use super::frontmatter::{name_from_filename, scan_frontmatter};
use crate::repository::github::{GITHUB_API_BASE, GitHubClient};
use crate::repository::token::TokenProvider;

/// Username reported by the empty fallback index.
pub const UNKNOWN_USERNAME: &str = "unknown";

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct RemoteCacheConfig {
    pub repository: String,
    /// Use this login instead of asking GitHub who the token belongs to.
    pub username: Option<String>,
    pub ttl: Duration,
    /// Files smaller than this are downloaded for frontmatter metadata.
    pub metadata_fetch_threshold: u64,
    pub metadata_concurrency: usize,
}

impl Default for RemoteCacheConfig {
    fn default() -> Self {
        Self::from(&GitHubSettings::default())
    }
}

impl From<&GitHubSettings> for RemoteCacheConfig {
    fn from(settings: &GitHubSettings) -> Self {
        Self {
            repository: settings.repository.clone(),
            username: settings.username.clone(),
            ttl: settings.cache_ttl(),
            metadata_fetch_threshold: settings.metadata_fetch_threshold_bytes,
            metadata_concurrency: settings.metadata_concurrency.max(1),
        }
    }
}

// ---------------------------------------------------------------------------
// Cache
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct CacheState {
    index: Option<Arc<RemotePortfolioIndex>>,
    last_fetch: Option<DateTime<Utc>>,
    recent_user_action: bool,
    /// Bumped on every successful install.
    generation: u64,
}

/// Remote portfolio cache. One instance per process, shared by reference.
pub struct RemotePortfolioCache<G, T> {
    github: G,
    tokens: T,
    config: RemoteCacheConfig,
    state: RwLock<CacheState>,
    refresh_lock: Mutex<()>,
}

impl<G: GitHubClient, T: TokenProvider> RemotePortfolioCache<G, T> {
    pub fn new(github: G, tokens: T, config: RemoteCacheConfig) -> Self {
        Self {
            github,
            tokens,
            config,
            state: RwLock::new(CacheState::default()),
            refresh_lock: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &RemoteCacheConfig {
        &self.config
    }

    /// Return the portfolio index. Never fails.
    ///
    /// Preference order: fresh cache, freshly fetched index, stale cache,
    /// empty index with username `"unknown"`.
    pub async fn get_index(&self) -> Arc<RemotePortfolioIndex> {
        self.load(false).await
    }

    /// Refresh regardless of TTL, with the same fallbacks as `get_index`.
    pub async fn force_refresh(&self) -> Arc<RemotePortfolioIndex> {
        self.load(true).await
    }

    /// Mark the cache as requiring a refresh on the next `get_index`, after
    /// the caller wrote to the portfolio repository.
    pub fn invalidate_after_action(&self, action: ActionKind) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.recent_user_action = true;
        info!(%action, "Remote portfolio cache invalidated after user action");
    }

    /// Drop the cached index and its fetch timestamp.
    pub fn clear_cache(&self) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let generation = state.generation;
        *state = CacheState {
            generation,
            ..CacheState::default()
        };
        debug!("Remote portfolio cache cleared");
    }

    pub fn cache_stats(&self) -> CacheStats {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        CacheStats {
            has_cached_data: state.index.is_some(),
            last_fetch_time: state.last_fetch,
            is_stale: self.is_stale(&state),
            recent_user_action: state.recent_user_action,
            total_elements: state.index.as_ref().map_or(0, |i| i.total_elements),
        }
    }

    // -- cache state ------------------------------------------------------

    fn is_stale(&self, state: &CacheState) -> bool {
        if state.index.is_none() || state.recent_user_action {
            return true;
        }
        let Some(last_fetch) = state.last_fetch else {
            return true;
        };
        let age = Utc::now().signed_duration_since(last_fetch);
        age.to_std().is_ok_and(|age| age >= self.config.ttl)
    }

    /// The cached index, if it can be served as-is.
    fn fresh_snapshot(&self) -> Option<Arc<RemotePortfolioIndex>> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        if self.is_stale(&state) {
            return None;
        }
        state.index.clone()
    }

    fn snapshot(&self) -> (Option<Arc<RemotePortfolioIndex>>, u64) {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        (state.index.clone(), state.generation)
    }

    fn install(&self, index: Arc<RemotePortfolioIndex>, fetched_at: DateTime<Utc>) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.index = Some(index);
        state.last_fetch = Some(fetched_at);
        state.recent_user_action = false;
        state.generation += 1;
    }

    async fn load(&self, force: bool) -> Arc<RemotePortfolioIndex> {
        if !force {
            if let Some(index) = self.fresh_snapshot() {
                debug!(total = index.total_elements, "Remote portfolio cache hit");
                return index;
            }
        }

        let (_, generation_before) = self.snapshot();
        let _guard = self.refresh_lock.lock().await;

        // A refresh that completed while we waited satisfies this call too.
        let (current, generation_now) = self.snapshot();
        if generation_now != generation_before {
            if let Some(index) = &current {
                debug!("Reusing portfolio index refreshed by a concurrent caller");
                return index.clone();
            }
        }
        if !force {
            if let Some(index) = self.fresh_snapshot() {
                return index;
            }
        }

        let started = Instant::now();
        match self.fetch_index().await {
            Ok(index) => {
                let index = Arc::new(index);
                self.install(index.clone(), Utc::now());
                info!(
                    username = %index.username,
                    total = index.total_elements,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Remote portfolio index refreshed"
                );
                index
            }
            Err(err) => {
                log_refresh_failure(&err);
                match current {
                    Some(stale) => {
                        debug!(total = stale.total_elements, "Serving stale portfolio index");
                        stale
                    }
                    None => Arc::new(RemotePortfolioIndex::empty(
                        UNKNOWN_USERNAME,
                        self.config.repository.as_str(),
                    )),
                }
            }
        }
    }

    // -- fetching ---------------------------------------------------------

    async fn fetch_index(&self) -> Result<RemotePortfolioIndex, GitHubError> {
        let username = self.resolve_username().await?;

        match self.fetch_with_graphql(&username).await {
            Ok(index) => return Ok(index),
            Err(err) => debug!(error = %err, "GraphQL batch fetch unavailable, using REST"),
        }

        self.fetch_with_rest(&username).await
    }

    async fn resolve_username(&self) -> Result<String, GitHubError> {
        if let Some(username) = &self.config.username {
            return Ok(username.clone());
        }
        if self.tokens.get_token().await.is_none() {
            return Err(GitHubError::AuthenticationFailed(
                "no GitHub token configured".to_string(),
            ));
        }
        let value = self
            .github
            .fetch_json(&format!("{GITHUB_API_BASE}/user"))
            .await?;
        let user: UserResponse = parse(value, "user")?;
        Ok(user.login)
    }

    /// Batched listing through the GraphQL API. Not available yet; the REST
    /// path is always used.
    async fn fetch_with_graphql(
        &self,
        _username: &str,
    ) -> Result<RemotePortfolioIndex, GitHubError> {
        Err(GitHubError::Unsupported(
            "GraphQL portfolio fetch is not implemented".to_string(),
        ))
    }

    async fn fetch_with_rest(&self, username: &str) -> Result<RemotePortfolioIndex, GitHubError> {
        let repository = self.config.repository.as_str();
        let repo_url = format!("{GITHUB_API_BASE}/repos/{username}/{repository}");

        let repo: RepoResponse = match self.github.fetch_json(&repo_url).await {
            Ok(value) => parse(value, "repository")?,
            Err(GitHubError::NotFound(_)) => {
                info!(%username, %repository, "Portfolio repository does not exist");
                return Ok(RemotePortfolioIndex::empty(username, repository));
            }
            Err(err) => return Err(err),
        };

        let commit_url = format!("{repo_url}/commits/{}", repo.default_branch);
        let head = match self.github.fetch_json(&commit_url).await {
            Ok(value) => Some(parse::<CommitResponse>(value, "commit")?),
            Err(err) if aborts_refresh(&err) => return Err(err),
            Err(err) => {
                // Empty repositories have no commits.
                debug!(error = %err, "Could not read head commit");
                None
            }
        };

        let last_modified = head
            .as_ref()
            .and_then(CommitResponse::date)
            .or(repo.pushed_at)
            .unwrap_or_else(Utc::now);
        let head_sha = head.map(|c| c.sha);

        let listings = join_all(
            ElementType::ALL
                .into_iter()
                .map(|t| self.fetch_type(&repo_url, t, last_modified)),
        )
        .await;

        let mut elements = BTreeMap::new();
        for (element_type, listing) in ElementType::ALL.into_iter().zip(listings) {
            let entries = match listing {
                Ok(entries) => entries,
                Err(err) if aborts_refresh(&err) => return Err(err),
                Err(err) => {
                    warn!(
                        element_type = %element_type,
                        error = %err,
                        "Failed to list portfolio directory, treating as empty"
                    );
                    Vec::new()
                }
            };
            elements.insert(element_type, entries);
        }

        Ok(RemotePortfolioIndex::from_listings(
            username, repository, head_sha, elements,
        ))
    }

    async fn fetch_type(
        &self,
        repo_url: &str,
        element_type: ElementType,
        last_modified: DateTime<Utc>,
    ) -> Result<Vec<RemoteIndexEntry>, GitHubError> {
        let url = format!("{repo_url}/contents/{}", element_type.dir_name());
        let value = match self.github.fetch_json(&url).await {
            Ok(value) => value,
            Err(GitHubError::NotFound(_)) => return Ok(Vec::new()),
            Err(err) => return Err(err),
        };
        let items: Vec<ContentItem> = parse(value, "directory listing")?;

        let files = items
            .into_iter()
            .filter(|item| item.item_type == "file" && item.name.ends_with(".md"));

        let entries = stream::iter(files)
            .map(|item| self.build_entry(item, element_type, last_modified))
            .buffered(self.config.metadata_concurrency.max(1))
            .try_collect::<Vec<_>>()
            .await?;

        debug!(element_type = %element_type, count = entries.len(), "Listed portfolio directory");
        Ok(entries)
    }

    /// Build one entry, downloading the file for frontmatter only when it is
    /// below the metadata threshold. Rate limits and auth failures during the
    /// download end the refresh; any other failure keeps the filename name.
    async fn build_entry(
        &self,
        item: ContentItem,
        element_type: ElementType,
        last_modified: DateTime<Utc>,
    ) -> Result<RemoteIndexEntry, GitHubError> {
        let mut entry = RemoteIndexEntry {
            name: name_from_filename(&item.name).to_string(),
            description: None,
            version: None,
            author: None,
            element_type,
            html_url: item.html_url.unwrap_or_default(),
            download_url: item.download_url,
            sha: item.sha,
            path: item.path,
            last_modified,
            size: item.size,
        };

        if item.size >= self.config.metadata_fetch_threshold {
            return Ok(entry);
        }
        let Some(download_url) = entry.download_url.as_deref() else {
            return Ok(entry);
        };

        match self.github.fetch_text(download_url).await {
            Ok(content) => {
                let fm = scan_frontmatter(&content);
                if let Some(name) = fm.name() {
                    entry.name = name.to_string();
                }
                entry.description = fm.description().map(str::to_string);
                entry.version = fm.version().map(str::to_string);
                entry.author = fm.author().map(str::to_string);
            }
            Err(err) if aborts_refresh(&err) => return Err(err),
            Err(err) => {
                debug!(path = %entry.path, error = %err, "Metadata fetch failed, using filename");
            }
        }
        Ok(entry)
    }

    #[cfg(test)]
    pub(crate) fn install_at(&self, index: RemotePortfolioIndex, fetched_at: DateTime<Utc>) {
        self.install(Arc::new(index), fetched_at);
    }
}

/// Rate limits and auth failures would fail every remaining call, so they end
/// the refresh instead of degrading one element type.
fn aborts_refresh(err: &GitHubError) -> bool {
    matches!(
        err,
        GitHubError::RateLimited { .. } | GitHubError::AuthenticationFailed(_)
    )
}

fn log_refresh_failure(err: &GitHubError) {
    match err {
        GitHubError::RateLimited { reset_at } => warn!(
            reset_at = ?reset_at,
            "GitHub rate limit reached, portfolio index not refreshed"
        ),
        GitHubError::AuthenticationFailed(reason) => warn!(
            %reason,
            "GitHub authentication failed, portfolio index not refreshed"
        ),
        other => warn!(error = %other, "Portfolio index refresh failed"),
    }
}

fn parse<D: serde::de::DeserializeOwned>(
    value: serde_json::Value,
    what: &str,
) -> Result<D, GitHubError> {
    serde_json::from_value(value)
        .map_err(|e| GitHubError::InvalidResponse(format!("unexpected {what} shape: {e}")))
}

// ---------------------------------------------------------------------------
// GitHub REST response shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct UserResponse {
    login: String,
}

#[derive(Debug, Deserialize)]
struct RepoResponse {
    #[serde(default = "default_branch")]
    default_branch: String,
    #[serde(default)]
    pushed_at: Option<DateTime<Utc>>,
}

fn default_branch() -> String {
    "main".to_string()
}

#[derive(Debug, Deserialize)]
struct CommitResponse {
    sha: String,
    commit: CommitDetail,
}

impl CommitResponse {
    fn date(&self) -> Option<DateTime<Utc>> {
        self.commit.committer.as_ref().and_then(|c| c.date)
    }
}

#[derive(Debug, Deserialize)]
struct CommitDetail {
    #[serde(default)]
    committer: Option<CommitSignature>,
}

#[derive(Debug, Deserialize)]
struct CommitSignature {
    #[serde(default)]
    date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct ContentItem {
    name: String,
    path: String,
    sha: String,
    #[serde(default)]
    size: u64,
    #[serde(default)]
    html_url: Option<String>,
    #[serde(default)]
    download_url: Option<String>,
    #[serde(rename = "type")]
    item_type: String,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::github::GITHUB_RAW_BASE;
    use crate::test_support::{FakeGitHub, FakeToken, remote_entry};

    const USER: &str = "octocat";
    const REPO: &str = "dollhouse-portfolio";

    fn config() -> RemoteCacheConfig {
        RemoteCacheConfig {
            repository: REPO.to_string(),
            ..RemoteCacheConfig::default()
        }
    }

    fn cache(github: FakeGitHub) -> RemotePortfolioCache<FakeGitHub, FakeToken> {
        RemotePortfolioCache::new(github, FakeToken(Some("ghp_test")), config())
    }

    fn stale_index_with(total: usize) -> RemotePortfolioIndex {
        let entries = (0..total)
            .map(|i| {
                remote_entry(
                    &format!("p{i}"),
                    ElementType::Persona,
                    None,
                    "2026-01-01T00:00:00Z",
                )
            })
            .collect();
        let mut listings = BTreeMap::new();
        listings.insert(ElementType::Persona, entries);
        RemotePortfolioIndex::from_listings(USER, REPO, None, listings)
    }

    #[tokio::test]
    async fn test_refresh_builds_index_from_rest_listing() {
        let cache = cache(FakeGitHub::with_portfolio(USER, REPO));
        let index = cache.get_index().await;

        assert_eq!(index.username, USER);
        assert_eq!(index.repository, REPO);
        assert_eq!(index.head_commit_sha.as_deref(), Some("headsha"));
        assert_eq!(index.total_elements, 3);
        assert_eq!(index.elements.len(), 6);

        let personas = index.entries(ElementType::Persona);
        assert_eq!(personas.len(), 2, "non-markdown files and dirs are skipped");
        assert_eq!(personas[0].name, "Creative Writer");
        assert_eq!(personas[0].version.as_deref(), Some("1.2.0"));
        assert_eq!(personas[0].author.as_deref(), Some("octocat"));
        assert_eq!(personas[0].path, "personas/creative-writer.md");
        assert_eq!(personas[0].last_modified.to_rfc3339(), "2026-01-03T00:00:00+00:00");
        // No frontmatter: filename-derived name, no metadata.
        assert_eq!(personas[1].name, "debugger");
        assert!(personas[1].version.is_none());
    }

    #[tokio::test]
    async fn test_large_files_are_not_downloaded() {
        let github = FakeGitHub::with_portfolio(USER, REPO);
        let cache = cache(github);
        let index = cache.get_index().await;

        let skills = index.entries(ElementType::Skill);
        assert_eq!(skills.len(), 1);
        assert_eq!(skills[0].name, "huge-skill");
        assert!(skills[0].description.is_none());

        let raw = format!("{GITHUB_RAW_BASE}/{USER}/{REPO}/main/skills/huge-skill.md");
        assert_eq!(cache.github.requested(&raw), 0);
    }

    #[tokio::test]
    async fn test_second_call_within_ttl_is_served_from_cache() {
        let cache = cache(FakeGitHub::with_portfolio(USER, REPO));
        let first = cache.get_index().await;
        let calls_after_first = cache.github.calls();

        let second = cache.get_index().await;
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.github.calls(), calls_after_first);
    }

    #[tokio::test]
    async fn test_total_failure_without_cache_yields_empty_index() {
        let github = FakeGitHub::new();
        github.fail_all(GitHubError::Transport("connection refused".to_string()));
        let cache = cache(github);

        let index = cache.get_index().await;
        assert_eq!(index.username, UNKNOWN_USERNAME);
        assert_eq!(index.total_elements, 0);
        for t in ElementType::ALL {
            assert!(index.elements.get(&t).is_some_and(Vec::is_empty));
        }
        assert!(!cache.cache_stats().has_cached_data);
    }

    #[tokio::test]
    async fn test_stale_cache_is_served_when_refresh_fails() {
        let github = FakeGitHub::new();
        github.fail_all(GitHubError::Timeout("api.github.com".to_string()));
        let cache = cache(github);

        let stale = stale_index_with(5);
        cache.install_at(stale.clone(), Utc::now() - chrono::Duration::minutes(30));
        assert!(cache.cache_stats().is_stale);

        let index = cache.get_index().await;
        assert_eq!(*index, stale);
        assert_eq!(index.total_elements, 5);
        assert!(cache.github.calls() > 0, "a refresh was attempted");
    }

    #[tokio::test]
    async fn test_rate_limit_keeps_previous_index() {
        let github = FakeGitHub::with_portfolio(USER, REPO);
        let cache = cache(github);
        let first = cache.get_index().await;

        cache.invalidate_after_action(ActionKind::Submit);
        cache
            .github
            .fail_all(GitHubError::RateLimited { reset_at: None });

        let second = cache.get_index().await;
        assert!(Arc::ptr_eq(&first, &second));
        assert!(cache.cache_stats().recent_user_action);
    }

    #[tokio::test]
    async fn test_rate_limited_metadata_download_keeps_previous_index() {
        let cache = cache(FakeGitHub::with_portfolio(USER, REPO));
        let first = cache.get_index().await;
        assert_eq!(first.entries(ElementType::Persona)[0].name, "Creative Writer");

        cache.invalidate_after_action(ActionKind::Sync);
        cache.github.fail_text(
            format!("{GITHUB_RAW_BASE}/{USER}/{REPO}/main/personas/creative-writer.md"),
            GitHubError::RateLimited { reset_at: None },
        );

        let second = cache.get_index().await;
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.entries(ElementType::Persona)[0].version.as_deref(), Some("1.2.0"));
        assert!(cache.cache_stats().recent_user_action, "refresh did not complete");
    }

    #[tokio::test]
    async fn test_auth_failure_on_metadata_download_without_cache_yields_empty_index() {
        let github = FakeGitHub::with_portfolio(USER, REPO);
        github.fail_text(
            format!("{GITHUB_RAW_BASE}/{USER}/{REPO}/main/personas/debugger.md"),
            GitHubError::AuthenticationFailed("bad credentials".to_string()),
        );
        let cache = cache(github);

        let index = cache.get_index().await;
        assert_eq!(index.username, UNKNOWN_USERNAME);
        assert_eq!(index.total_elements, 0);
        assert!(!cache.cache_stats().has_cached_data);
    }

    #[tokio::test]
    async fn test_transient_metadata_failure_falls_back_to_filename() {
        let github = FakeGitHub::with_portfolio(USER, REPO);
        github.fail_text(
            format!("{GITHUB_RAW_BASE}/{USER}/{REPO}/main/personas/creative-writer.md"),
            GitHubError::Timeout("raw.githubusercontent.com".to_string()),
        );
        let cache = cache(github);

        let index = cache.get_index().await;
        let personas = index.entries(ElementType::Persona);
        assert_eq!(personas[0].name, "creative-writer");
        assert!(personas[0].version.is_none());
        assert_eq!(index.total_elements, 3);
    }

    #[tokio::test]
    async fn test_missing_token_is_an_auth_failure() {
        let cache = RemotePortfolioCache::new(
            FakeGitHub::with_portfolio(USER, REPO),
            FakeToken(None),
            config(),
        );
        let index = cache.get_index().await;
        assert_eq!(index.username, UNKNOWN_USERNAME);
        assert_eq!(cache.github.calls(), 0);
    }

    #[tokio::test]
    async fn test_configured_username_skips_user_lookup() {
        let cache = RemotePortfolioCache::new(
            FakeGitHub::with_portfolio(USER, REPO),
            FakeToken(None),
            RemoteCacheConfig {
                username: Some(USER.to_string()),
                ..config()
            },
        );
        let index = cache.get_index().await;
        assert_eq!(index.total_elements, 3);
        assert_eq!(cache.github.requested(&format!("{GITHUB_API_BASE}/user")), 0);
    }

    #[tokio::test]
    async fn test_missing_repository_is_a_successful_empty_index() {
        let github = FakeGitHub::new().json(
            format!("{GITHUB_API_BASE}/user"),
            serde_json::json!({ "login": USER }),
        );
        let cache = cache(github);

        let index = cache.get_index().await;
        assert_eq!(index.username, USER, "resolved username is kept");
        assert_eq!(index.total_elements, 0);
        assert_eq!(index.elements.len(), 6);
        assert!(cache.cache_stats().has_cached_data);
    }

    #[tokio::test]
    async fn test_failing_type_listing_degrades_to_empty() {
        let api = format!("{GITHUB_API_BASE}/repos/{USER}/{REPO}");
        let github = FakeGitHub::with_portfolio(USER, REPO).json_error(
            format!("{api}/contents/skills"),
            GitHubError::Timeout("contents/skills".to_string()),
        );
        let cache = cache(github);

        let index = cache.get_index().await;
        assert_eq!(index.entries(ElementType::Persona).len(), 2);
        assert!(index.entries(ElementType::Skill).is_empty());
        assert_eq!(index.total_elements, 2);
    }

    #[tokio::test]
    async fn test_auth_failure_during_listing_aborts_refresh() {
        let api = format!("{GITHUB_API_BASE}/repos/{USER}/{REPO}");
        let github = FakeGitHub::with_portfolio(USER, REPO).json_error(
            format!("{api}/contents/skills"),
            GitHubError::AuthenticationFailed("token revoked".to_string()),
        );
        let cache = cache(github);

        let index = cache.get_index().await;
        assert_eq!(index.username, UNKNOWN_USERNAME);
        assert!(!cache.cache_stats().has_cached_data);
    }

    #[tokio::test]
    async fn test_invalidation_forces_refetch() {
        let cache = cache(FakeGitHub::with_portfolio(USER, REPO));
        cache.get_index().await;
        let user_url = format!("{GITHUB_API_BASE}/user");
        assert_eq!(cache.github.requested(&user_url), 1);

        cache.invalidate_after_action(ActionKind::Create);
        assert!(cache.cache_stats().is_stale);

        cache.get_index().await;
        assert_eq!(cache.github.requested(&user_url), 2);
        let stats = cache.cache_stats();
        assert!(!stats.recent_user_action);
        assert!(!stats.is_stale);
    }

    #[tokio::test]
    async fn test_clear_cache_drops_state() {
        let cache = cache(FakeGitHub::with_portfolio(USER, REPO));
        cache.get_index().await;
        assert!(cache.cache_stats().has_cached_data);

        cache.clear_cache();
        let stats = cache.cache_stats();
        assert!(!stats.has_cached_data);
        assert!(stats.last_fetch_time.is_none());
        assert_eq!(stats.total_elements, 0);
        assert!(stats.is_stale);
    }

    #[tokio::test]
    async fn test_cache_stats_has_no_side_effects() {
        let cache = cache(FakeGitHub::with_portfolio(USER, REPO));
        let stats = cache.cache_stats();
        assert!(!stats.has_cached_data);
        assert!(stats.is_stale);
        assert_eq!(cache.github.calls(), 0);
    }

    #[tokio::test]
    async fn test_force_refresh_bypasses_ttl() {
        let cache = cache(FakeGitHub::with_portfolio(USER, REPO));
        let first = cache.get_index().await;
        let second = cache.force_refresh().await;
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(second.total_elements, first.total_elements);
    }

    #[tokio::test]
    async fn test_concurrent_misses_share_one_refresh() {
        let github =
            FakeGitHub::with_portfolio(USER, REPO).with_latency(Duration::from_millis(20));
        let cache = cache(github);

        let (a, b) = tokio::join!(cache.get_index(), cache.get_index());
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.github.requested(&format!("{GITHUB_API_BASE}/user")), 1);
    }
}
