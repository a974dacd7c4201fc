//! Configuration types.
//!
//! `PortfolioConfig` represents the top-level `config.toml`. Every field has a
//! default so an empty file is valid. The `[sources]` section is kept as raw
//! strings and validated into a `SourcePriorityConfig` so that a bad source
//! name is reported rather than silently dropped by deserialization.

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::element::Source;
use crate::error::{ConfigError, PriorityIssue};

/// Top-level configuration, loaded from `{data_dir}/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PortfolioConfig {
    #[serde(default)]
    pub sources: SourcesSettings,
    #[serde(default)]
    pub github: GitHubSettings,
    #[serde(default)]
    pub collection: CollectionSettings,
    #[serde(default)]
    pub local: LocalSettings,
    #[serde(default)]
    pub search: SearchSettings,
}

impl PortfolioConfig {
    /// Validate every section that can be misconfigured.
    pub fn validate(&self) -> Result<SourcePriorityConfig, ConfigError> {
        self.search.validate()?;
        if self.github.metadata_concurrency == 0 {
            return Err(ConfigError::InvalidValue {
                field: "github.metadata_concurrency".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        SourcePriorityConfig::from_settings(&self.sources)
    }
}

// ---------------------------------------------------------------------------
// [sources]
// ---------------------------------------------------------------------------

/// Raw `[sources]` section as written by the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesSettings {
    #[serde(default = "default_priority_names")]
    pub priority: Vec<String>,
    #[serde(default = "default_true")]
    pub stop_on_first: bool,
    #[serde(default)]
    pub check_all_for_updates: bool,
    #[serde(default = "default_true")]
    pub fallback_on_error: bool,
}

fn default_priority_names() -> Vec<String> {
    Source::ALL.iter().map(|s| s.as_str().to_string()).collect()
}

fn default_true() -> bool {
    true
}

impl Default for SourcesSettings {
    fn default() -> Self {
        Self {
            priority: default_priority_names(),
            stop_on_first: true,
            check_all_for_updates: false,
            fallback_on_error: true,
        }
    }
}

/// Validated source ordering and search policy.
///
/// Deserializes through [`SourcesSettings`], so an invalid ordering fails to
/// deserialize instead of producing an unchecked config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SourcesSettings", into = "SourcesSettings")]
pub struct SourcePriorityConfig {
    priority: Vec<Source>,
    pub stop_on_first: bool,
    pub check_all_for_updates: bool,
    pub fallback_on_error: bool,
}

impl SourcePriorityConfig {
    /// Build a config from an ordered source list, rejecting empty lists and
    /// duplicates.
    pub fn new(
        priority: Vec<Source>,
        stop_on_first: bool,
        check_all_for_updates: bool,
        fallback_on_error: bool,
    ) -> Result<Self, ConfigError> {
        validate_priority(&priority)?;
        Ok(Self {
            priority,
            stop_on_first,
            check_all_for_updates,
            fallback_on_error,
        })
    }

    /// Validate the raw `[sources]` section.
    pub fn from_settings(settings: &SourcesSettings) -> Result<Self, ConfigError> {
        let priority = parse_priority_names(&settings.priority)?;
        Self::new(
            priority,
            settings.stop_on_first,
            settings.check_all_for_updates,
            settings.fallback_on_error,
        )
    }

    pub fn priority(&self) -> &[Source] {
        &self.priority
    }
}

impl TryFrom<SourcesSettings> for SourcePriorityConfig {
    type Error = ConfigError;

    fn try_from(settings: SourcesSettings) -> Result<Self, Self::Error> {
        Self::from_settings(&settings)
    }
}

impl From<SourcePriorityConfig> for SourcesSettings {
    fn from(config: SourcePriorityConfig) -> Self {
        Self {
            priority: config
                .priority
                .iter()
                .map(|s| s.as_str().to_string())
                .collect(),
            stop_on_first: config.stop_on_first,
            check_all_for_updates: config.check_all_for_updates,
            fallback_on_error: config.fallback_on_error,
        }
    }
}

impl Default for SourcePriorityConfig {
    fn default() -> Self {
        Self {
            priority: Source::ALL.to_vec(),
            stop_on_first: true,
            check_all_for_updates: false,
            fallback_on_error: true,
        }
    }
}

/// Check an ordered source list: non-empty and free of duplicates.
///
/// Every problem found is reported, not just the first.
pub fn validate_priority(priority: &[Source]) -> Result<(), ConfigError> {
    let mut issues = Vec::new();
    if priority.is_empty() {
        issues.push(PriorityIssue::EmptyPriority);
    }
    let mut seen = HashSet::new();
    for source in priority {
        if !seen.insert(*source) {
            let issue = PriorityIssue::DuplicateSource(*source);
            if !issues.contains(&issue) {
                issues.push(issue);
            }
        }
    }
    if issues.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::InvalidSourcePriority { issues })
    }
}

/// Parse source names (e.g. from TOML or the CLI) into an ordered list,
/// reporting unknown names, duplicates, and emptiness together.
pub fn parse_priority_names<S: AsRef<str>>(names: &[S]) -> Result<Vec<Source>, ConfigError> {
    let mut issues = Vec::new();
    let mut sources = Vec::new();
    for name in names {
        match name.as_ref().parse::<Source>() {
            Ok(source) => sources.push(source),
            Err(_) => issues.push(PriorityIssue::UnknownSource(name.as_ref().to_string())),
        }
    }
    if names.is_empty() {
        issues.push(PriorityIssue::EmptyPriority);
    }
    if let Err(ConfigError::InvalidSourcePriority { issues: more }) = validate_priority(&sources) {
        for issue in more {
            // Emptiness of the parsed list is already covered above.
            if (issue != PriorityIssue::EmptyPriority || names.is_empty())
                && !issues.contains(&issue)
            {
                issues.push(issue);
            }
        }
    }
    if issues.is_empty() {
        Ok(sources)
    } else {
        Err(ConfigError::InvalidSourcePriority { issues })
    }
}

// ---------------------------------------------------------------------------
// [github]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubSettings {
    /// Name of the portfolio repository under the authenticated user.
    #[serde(default = "default_repository")]
    pub repository: String,
    /// Skip the `/user` lookup and use this login instead.
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default = "default_github_ttl")]
    pub cache_ttl_secs: u64,
    /// Files at or above this size are indexed by filename only.
    #[serde(default = "default_metadata_threshold")]
    pub metadata_fetch_threshold_bytes: u64,
    #[serde(default = "default_metadata_concurrency")]
    pub metadata_concurrency: usize,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_repository() -> String {
    "dollhouse-portfolio".to_string()
}
fn default_github_ttl() -> u64 {
    15 * 60
}
fn default_metadata_threshold() -> u64 {
    10 * 1024
}
fn default_metadata_concurrency() -> usize {
    4
}
fn default_request_timeout() -> u64 {
    15
}
fn default_max_retries() -> u32 {
    2
}

impl GitHubSettings {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for GitHubSettings {
    fn default() -> Self {
        Self {
            repository: default_repository(),
            username: None,
            cache_ttl_secs: default_github_ttl(),
            metadata_fetch_threshold_bytes: default_metadata_threshold(),
            metadata_concurrency: default_metadata_concurrency(),
            request_timeout_secs: default_request_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

// ---------------------------------------------------------------------------
// [collection]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionSettings {
    #[serde(default = "default_collection_url")]
    pub index_url: String,
    #[serde(default = "default_collection_ttl")]
    pub cache_ttl_secs: u64,
}

fn default_collection_url() -> String {
    "https://raw.githubusercontent.com/DollhouseMCP/collection/main/public/collection-index.json"
        .to_string()
}
fn default_collection_ttl() -> u64 {
    60 * 60
}

impl CollectionSettings {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

impl Default for CollectionSettings {
    fn default() -> Self {
        Self {
            index_url: default_collection_url(),
            cache_ttl_secs: default_collection_ttl(),
        }
    }
}

// ---------------------------------------------------------------------------
// [local]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalSettings {
    /// Defaults to `{data_dir}/portfolio` when unset.
    #[serde(default)]
    pub portfolio_dir: Option<PathBuf>,
    #[serde(default = "default_local_stale")]
    pub stale_after_secs: u64,
}

fn default_local_stale() -> u64 {
    5 * 60
}

impl Default for LocalSettings {
    fn default() -> Self {
        Self {
            portfolio_dir: None,
            stale_after_secs: default_local_stale(),
        }
    }
}

// ---------------------------------------------------------------------------
// [search]
// ---------------------------------------------------------------------------

/// Ranking weights. Local results are never discounted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchSettings {
    #[serde(default = "default_github_weight")]
    pub github_weight: f64,
    #[serde(default = "default_collection_weight")]
    pub collection_weight: f64,
    #[serde(default = "default_page_size")]
    pub default_page_size: usize,
}

fn default_github_weight() -> f64 {
    0.9
}
fn default_collection_weight() -> f64 {
    0.8
}
fn default_page_size() -> usize {
    20
}

impl SearchSettings {
    pub fn weight_for(&self, source: Source) -> f64 {
        match source {
            Source::Local => 1.0,
            Source::GitHub => self.github_weight,
            Source::Collection => self.collection_weight,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("search.github_weight", self.github_weight),
            ("search.collection_weight", self.collection_weight),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    reason: format!("must be in (0, 1], got {value}"),
                });
            }
        }
        Ok(())
    }
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            github_weight: default_github_weight(),
            collection_weight: default_collection_weight(),
            default_page_size: default_page_size(),
        }
    }
}
