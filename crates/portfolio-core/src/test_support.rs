//! Fakes for the collaborator traits, shared by the core's unit tests.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde_json::{Value, json};

use portfolio_types::element::ElementType;
use portfolio_types::error::{GitHubError, IndexError};
use portfolio_types::index::{
    CacheStats, CollectionIndex, CollectionIndexEntry, ElementMetadata, LocalIndexEntry,
    LocalIndexStats, LocalSearchOptions, LocalSearchResult, RemoteIndexEntry,
};

use crate::repository::collection::CollectionIndexProvider;
use crate::repository::github::{GITHUB_API_BASE, GITHUB_RAW_BASE, GitHubClient};
use crate::repository::local::LocalIndexProvider;
use crate::repository::token::TokenProvider;

// ---------------------------------------------------------------------------
// GitHub
// ---------------------------------------------------------------------------

/// Routes URLs to canned responses. Unknown URLs answer `NotFound`.
#[derive(Default)]
pub struct FakeGitHub {
    json: Mutex<HashMap<String, Result<Value, GitHubError>>>,
    text: Mutex<HashMap<String, Result<String, GitHubError>>>,
    fail_all: Mutex<Option<GitHubError>>,
    latency: Option<Duration>,
    calls: AtomicUsize,
    requested: Mutex<Vec<String>>,
}

impl FakeGitHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn json(self, url: impl Into<String>, value: Value) -> Self {
        self.json.lock().unwrap().insert(url.into(), Ok(value));
        self
    }

    pub fn json_error(self, url: impl Into<String>, error: GitHubError) -> Self {
        self.json.lock().unwrap().insert(url.into(), Err(error));
        self
    }

    pub fn text(self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.text.lock().unwrap().insert(url.into(), Ok(body.into()));
        self
    }

    /// Make later downloads of `url` fail with `error`.
    pub fn fail_text(&self, url: impl Into<String>, error: GitHubError) {
        self.text.lock().unwrap().insert(url.into(), Err(error));
    }

    /// Make every subsequent call fail with `error`.
    pub fn fail_all(&self, error: GitHubError) {
        *self.fail_all.lock().unwrap() = Some(error);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requested(&self, url: &str) -> usize {
        self.requested
            .lock()
            .unwrap()
            .iter()
            .filter(|u| u.as_str() == url)
            .count()
    }

    async fn record(&self, url: &str) -> Option<GitHubError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requested.lock().unwrap().push(url.to_string());
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        self.fail_all.lock().unwrap().clone()
    }

    /// A portfolio for `user/repo` with two small personas, one large skill,
    /// and every other type directory missing.
    pub fn with_portfolio(user: &str, repo: &str) -> Self {
        let api = format!("{GITHUB_API_BASE}/repos/{user}/{repo}");
        let raw = format!("{GITHUB_RAW_BASE}/{user}/{repo}/main");
        Self::new()
            .json(format!("{GITHUB_API_BASE}/user"), json!({ "login": user }))
            .json(
                api.clone(),
                json!({ "default_branch": "main", "pushed_at": "2026-01-02T00:00:00Z" }),
            )
            .json(
                format!("{api}/commits/main"),
                json!({
                    "sha": "headsha",
                    "commit": { "committer": { "date": "2026-01-03T00:00:00Z" } }
                }),
            )
            .json(
                format!("{api}/contents/personas"),
                json!([
                    content_item("personas/creative-writer.md", 120, Some(&raw)),
                    content_item("personas/debugger.md", 80, Some(&raw)),
                    { "name": "README.txt", "path": "personas/README.txt", "sha": "x",
                      "size": 10, "type": "file" },
                    { "name": "drafts", "path": "personas/drafts", "sha": "y",
                      "size": 0, "type": "dir" }
                ]),
            )
            .json(
                format!("{api}/contents/skills"),
                json!([content_item("skills/huge-skill.md", 50_000, Some(&raw))]),
            )
            .text(
                format!("{raw}/personas/creative-writer.md"),
                "---\nname: Creative Writer\ndescription: Writes stories\nversion: 1.2.0\nauthor: octocat\n---\nBody",
            )
            .text(format!("{raw}/personas/debugger.md"), "no frontmatter here")
    }
}

fn content_item(path: &str, size: u64, raw_base: Option<&str>) -> Value {
    let name = path.rsplit('/').next().unwrap_or(path);
    json!({
        "name": name,
        "path": path,
        "sha": format!("sha-{name}"),
        "size": size,
        "html_url": format!("https://github.com/x/{path}"),
        "download_url": raw_base.map(|base| format!("{base}/{path}")),
        "type": "file"
    })
}

impl GitHubClient for FakeGitHub {
    async fn fetch_json(&self, url: &str) -> Result<Value, GitHubError> {
        if let Some(err) = self.record(url).await {
            return Err(err);
        }
        self.json
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .unwrap_or_else(|| Err(GitHubError::NotFound(url.to_string())))
    }

    async fn fetch_text(&self, url: &str) -> Result<String, GitHubError> {
        if let Some(err) = self.record(url).await {
            return Err(err);
        }
        self.text
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .unwrap_or_else(|| Err(GitHubError::NotFound(url.to_string())))
    }
}

// ---------------------------------------------------------------------------
// Token
// ---------------------------------------------------------------------------

pub struct FakeToken(pub Option<&'static str>);

impl TokenProvider for FakeToken {
    async fn get_token(&self) -> Option<SecretString> {
        self.0.map(|t| SecretString::from(t.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Local
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeLocal {
    pub entries: Vec<LocalIndexEntry>,
    pub fail: bool,
    pub searches: AtomicUsize,
    pub rebuilds: AtomicUsize,
}

impl FakeLocal {
    pub fn with(entries: Vec<LocalIndexEntry>) -> Self {
        Self {
            entries,
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    fn check(&self) -> Result<(), IndexError> {
        if self.fail {
            Err(IndexError::Local("disk on fire".to_string()))
        } else {
            Ok(())
        }
    }
}

impl LocalIndexProvider for FakeLocal {
    async fn search(
        &self,
        query: &str,
        options: &LocalSearchOptions,
    ) -> Result<Vec<LocalSearchResult>, IndexError> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        let q = query.to_lowercase();
        Ok(self
            .entries
            .iter()
            .filter(|e| options.element_type.is_none_or(|t| t == e.element_type))
            .filter(|e| e.metadata.name.to_lowercase().contains(&q))
            .map(|e| LocalSearchResult {
                entry: e.clone(),
                score: if e.metadata.name.to_lowercase() == q { 1.0 } else { 0.7 },
            })
            .collect())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<LocalIndexEntry>, IndexError> {
        self.check()?;
        Ok(self
            .entries
            .iter()
            .find(|e| e.metadata.name.eq_ignore_ascii_case(name))
            .cloned())
    }

    async fn elements_by_type(
        &self,
        element_type: ElementType,
    ) -> Result<Vec<LocalIndexEntry>, IndexError> {
        self.check()?;
        Ok(self
            .entries
            .iter()
            .filter(|e| e.element_type == element_type)
            .cloned()
            .collect())
    }

    async fn stats(&self) -> Result<LocalIndexStats, IndexError> {
        self.check()?;
        let mut stats = LocalIndexStats {
            total_elements: self.entries.len(),
            ..LocalIndexStats::default()
        };
        for e in &self.entries {
            *stats.elements_by_type.entry(e.element_type).or_default() += 1;
        }
        Ok(stats)
    }

    async fn rebuild(&self) -> Result<(), IndexError> {
        self.rebuilds.fetch_add(1, Ordering::SeqCst);
        self.check()
    }
}

// ---------------------------------------------------------------------------
// Collection
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeCollection {
    pub index: Option<Arc<CollectionIndex>>,
    pub clears: AtomicUsize,
}

impl FakeCollection {
    pub fn with(entries: Vec<CollectionIndexEntry>) -> Self {
        let mut elements = std::collections::BTreeMap::new();
        for e in entries {
            elements
                .entry(e.element_type)
                .or_insert_with(Vec::new)
                .push(e);
        }
        let total_elements = elements.values().map(Vec::len).sum();
        Self {
            index: Some(Arc::new(CollectionIndex {
                version: "1.0.0".to_string(),
                generated: None,
                total_elements,
                elements,
            })),
            clears: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self::default()
    }
}

impl CollectionIndexProvider for FakeCollection {
    async fn get_index(&self) -> Result<Arc<CollectionIndex>, IndexError> {
        self.index
            .clone()
            .ok_or_else(|| IndexError::Collection("collection unreachable".to_string()))
    }

    fn cache_stats(&self) -> CacheStats {
        CacheStats {
            has_cached_data: self.index.is_some(),
            total_elements: self.index.as_ref().map_or(0, |i| i.total_elements),
            ..CacheStats::default()
        }
    }

    async fn clear_cache(&self) {
        self.clears.fetch_add(1, Ordering::SeqCst);
    }
}

// ---------------------------------------------------------------------------
// Entry builders
// ---------------------------------------------------------------------------

pub fn ts(s: &str) -> DateTime<Utc> {
    s.parse().unwrap()
}

pub fn local_entry(
    name: &str,
    element_type: ElementType,
    version: Option<&str>,
    modified: &str,
) -> LocalIndexEntry {
    let filename = format!("{name}.md");
    LocalIndexEntry {
        file_path: PathBuf::from(format!("/portfolio/{}/{filename}", element_type.dir_name())),
        element_type,
        metadata: ElementMetadata {
            name: name.to_string(),
            description: Some(format!("local {name}")),
            version: version.map(str::to_string),
            author: None,
            tags: vec!["local".to_string()],
            keywords: Vec::new(),
            triggers: Vec::new(),
        },
        last_modified: ts(modified),
        filename,
    }
}

pub fn remote_entry(
    name: &str,
    element_type: ElementType,
    version: Option<&str>,
    modified: &str,
) -> RemoteIndexEntry {
    let path = format!("{}/{name}.md", element_type.dir_name());
    RemoteIndexEntry {
        html_url: format!("https://github.com/octocat/portfolio/blob/main/{path}"),
        download_url: None,
        path,
        name: name.to_string(),
        description: Some(format!("remote {name}")),
        version: version.map(str::to_string),
        author: Some("octocat".to_string()),
        element_type,
        sha: format!("sha-{name}"),
        last_modified: ts(modified),
        size: 100,
    }
}

pub fn collection_entry(
    name: &str,
    element_type: ElementType,
    version: Option<&str>,
) -> CollectionIndexEntry {
    CollectionIndexEntry {
        path: format!("library/{}/{name}.md", element_type.dir_name()),
        element_type,
        name: name.to_string(),
        description: Some(format!("collection {name}")),
        version: version.map(str::to_string),
        author: Some("community".to_string()),
        tags: vec!["community".to_string()],
        sha: None,
        created: None,
    }
}
