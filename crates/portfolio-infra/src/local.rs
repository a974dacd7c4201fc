//! Filesystem-backed local index.
//!
//! Scans `{portfolio_dir}/{personas,skills,templates,agents,memories,ensembles}`
//! for `*.md` files and reads their YAML frontmatter. The scan result is an
//! immutable snapshot, rebuilt when older than `stale_after` or on
//! [`LocalIndexProvider::rebuild`].

use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use portfolio_core::portfolio::frontmatter::{
    extract_frontmatter, name_from_filename, scan_frontmatter,
};
use portfolio_core::repository::local::LocalIndexProvider;
use portfolio_core::search::rank::{names_match, text_score};
use portfolio_types::config::LocalSettings;
use portfolio_types::element::ElementType;
use portfolio_types::error::IndexError;
use portfolio_types::index::{
    ElementMetadata, LocalIndexEntry, LocalIndexStats, LocalSearchOptions, LocalSearchResult,
};

#[derive(Debug)]
struct Snapshot {
    entries: Vec<LocalIndexEntry>,
    built_at: DateTime<Utc>,
}

pub struct FsLocalIndex {
    root: PathBuf,
    stale_after: Duration,
    snapshot: RwLock<Option<Arc<Snapshot>>>,
    build_lock: Mutex<()>,
}

impl FsLocalIndex {
    pub fn new(root: impl Into<PathBuf>, stale_after: Duration) -> Self {
        Self {
            root: root.into(),
            stale_after,
            snapshot: RwLock::new(None),
            build_lock: Mutex::new(()),
        }
    }

    pub fn from_settings(root: impl Into<PathBuf>, settings: &LocalSettings) -> Self {
        Self::new(root, Duration::from_secs(settings.stale_after_secs))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn current(&self) -> Option<Arc<Snapshot>> {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn is_stale(&self, snapshot: &Snapshot) -> bool {
        Utc::now()
            .signed_duration_since(snapshot.built_at)
            .to_std()
            .is_ok_and(|age| age >= self.stale_after)
    }

    /// The current snapshot, rebuilding it first if missing or stale.
    async fn snapshot(&self) -> Result<Arc<Snapshot>, IndexError> {
        if let Some(snapshot) = self.current().filter(|s| !self.is_stale(s)) {
            return Ok(snapshot);
        }
        let _guard = self.build_lock.lock().await;
        if let Some(snapshot) = self.current().filter(|s| !self.is_stale(s)) {
            return Ok(snapshot);
        }
        self.build().await
    }

    async fn build(&self) -> Result<Arc<Snapshot>, IndexError> {
        let entries = scan_portfolio(&self.root).await?;
        debug!(root = %self.root.display(), count = entries.len(), "Local index built");
        let snapshot = Arc::new(Snapshot {
            entries,
            built_at: Utc::now(),
        });
        *self.snapshot.write().unwrap_or_else(PoisonError::into_inner) = Some(snapshot.clone());
        Ok(snapshot)
    }
}

impl LocalIndexProvider for FsLocalIndex {
    async fn search(
        &self,
        query: &str,
        options: &LocalSearchOptions,
    ) -> Result<Vec<LocalSearchResult>, IndexError> {
        let snapshot = self.snapshot().await?;
        let mut results: Vec<LocalSearchResult> = snapshot
            .entries
            .iter()
            .filter(|e| options.element_type.is_none_or(|t| t == e.element_type))
            .filter_map(|e| {
                let meta = &e.metadata;
                let labels: Vec<String> = meta
                    .tags
                    .iter()
                    .chain(&meta.keywords)
                    .chain(&meta.triggers)
                    .cloned()
                    .collect();
                text_score(query, &meta.name, &labels, meta.description.as_deref()).map(
                    |score| LocalSearchResult {
                        entry: e.clone(),
                        score,
                    },
                )
            })
            .collect();

        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.entry.metadata.name.cmp(&b.entry.metadata.name))
        });
        if let Some(limit) = options.limit {
            results.truncate(limit);
        }
        Ok(results)
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<LocalIndexEntry>, IndexError> {
        let snapshot = self.snapshot().await?;
        let entries = &snapshot.entries;
        let found = entries
            .iter()
            .find(|e| e.metadata.name.eq_ignore_ascii_case(name))
            .or_else(|| entries.iter().find(|e| names_match(name, &e.metadata.name)))
            .or_else(|| {
                entries
                    .iter()
                    .find(|e| names_match(name, name_from_filename(&e.filename)))
            });
        Ok(found.cloned())
    }

    async fn elements_by_type(
        &self,
        element_type: ElementType,
    ) -> Result<Vec<LocalIndexEntry>, IndexError> {
        let snapshot = self.snapshot().await?;
        Ok(snapshot
            .entries
            .iter()
            .filter(|e| e.element_type == element_type)
            .cloned()
            .collect())
    }

    async fn stats(&self) -> Result<LocalIndexStats, IndexError> {
        let snapshot = self.snapshot().await?;
        let mut stats = LocalIndexStats {
            total_elements: snapshot.entries.len(),
            last_built: Some(snapshot.built_at),
            is_stale: self.is_stale(&snapshot),
            ..LocalIndexStats::default()
        };
        for t in ElementType::ALL {
            stats.elements_by_type.insert(t, 0);
        }
        for e in &snapshot.entries {
            *stats.elements_by_type.entry(e.element_type).or_default() += 1;
        }
        Ok(stats)
    }

    async fn rebuild(&self) -> Result<(), IndexError> {
        let _guard = self.build_lock.lock().await;
        self.build().await.map(|_| ())
    }
}

// ---------------------------------------------------------------------------
// Scanning
// ---------------------------------------------------------------------------

async fn scan_portfolio(root: &Path) -> Result<Vec<LocalIndexEntry>, IndexError> {
    let mut entries = Vec::new();
    for element_type in ElementType::ALL {
        let dir = root.join(element_type.dir_name());
        let mut read_dir = match tokio::fs::read_dir(&dir).await {
            Ok(read_dir) => read_dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
            Err(e) => return Err(e.into()),
        };

        let mut files = Vec::new();
        while let Some(dirent) = read_dir.next_entry().await? {
            let path = dirent.path();
            if !path.extension().is_some_and(|ext| ext == "md") {
                continue;
            }
            let file_type = dirent.file_type().await?;
            // Symlinked element files are followed.
            let is_file = if file_type.is_symlink() {
                tokio::fs::metadata(&path).await.is_ok_and(|m| m.is_file())
            } else {
                file_type.is_file()
            };
            if is_file {
                files.push(path);
            }
        }
        files.sort();

        for path in files {
            match read_entry(&path, element_type).await {
                Ok(entry) => entries.push(entry),
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable element file"),
            }
        }
    }
    Ok(entries)
}

async fn read_entry(path: &Path, element_type: ElementType) -> std::io::Result<LocalIndexEntry> {
    let content = tokio::fs::read_to_string(path).await?;
    let modified = tokio::fs::metadata(path).await?.modified()?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    Ok(LocalIndexEntry {
        metadata: parse_metadata(&content, &filename),
        file_path: path.to_path_buf(),
        element_type,
        last_modified: DateTime::<Utc>::from(modified),
        filename,
    })
}

/// Frontmatter fields of a local element file. Unknown keys are ignored.
#[derive(Debug, Default, Deserialize)]
struct RawFrontmatter {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    /// Written as a number (`version: 1.0`) as often as a string.
    #[serde(default)]
    version: Option<serde_yaml_ng::Value>,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    keywords: Vec<String>,
    #[serde(default)]
    triggers: Vec<String>,
}

/// Read metadata from frontmatter, falling back to the line scanner when
/// the YAML does not parse and to the filename for the name.
fn parse_metadata(content: &str, filename: &str) -> ElementMetadata {
    let fallback_name = name_from_filename(filename).to_string();

    let parsed = extract_frontmatter(content)
        .map(|(block, _)| serde_yaml_ng::from_str::<RawFrontmatter>(block));

    match parsed {
        Some(Ok(raw)) => ElementMetadata {
            name: raw.name.filter(|n| !n.trim().is_empty()).unwrap_or(fallback_name),
            description: raw.description,
            version: raw.version.and_then(yaml_scalar),
            author: raw.author,
            tags: raw.tags,
            keywords: raw.keywords,
            triggers: raw.triggers,
        },
        Some(Err(e)) => {
            debug!(%filename, error = %e, "Frontmatter is not valid YAML, scanning lines");
            let fm = scan_frontmatter(content);
            ElementMetadata {
                name: fm.name().map_or(fallback_name, str::to_string),
                description: fm.description().map(str::to_string),
                version: fm.version().map(str::to_string),
                author: fm.author().map(str::to_string),
                ..ElementMetadata::default()
            }
        }
        None => ElementMetadata {
            name: fallback_name,
            ..ElementMetadata::default()
        },
    }
}

fn yaml_scalar(value: serde_yaml_ng::Value) -> Option<String> {
    match value {
        serde_yaml_ng::Value::String(s) => Some(s),
        serde_yaml_ng::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
