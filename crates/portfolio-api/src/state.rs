//! Application state wiring all services together.
//!
//! The core services are generic over their collaborator traits; AppState
//! pins them to the concrete infra implementations.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;

use portfolio_core::portfolio::{RemoteCacheConfig, RemotePortfolioCache};
use portfolio_core::search::UnifiedIndexManager;
use portfolio_infra::collection::HttpCollectionIndex;
use portfolio_infra::config::{LoadedConfig, load_config};
use portfolio_infra::filesystem::{collection_cache_path, resolve_data_dir};
use portfolio_infra::github::HttpGitHubClient;
use portfolio_infra::local::FsLocalIndex;
use portfolio_infra::token::EnvTokenProvider;

/// Concrete type aliases for the service generics pinned to infra implementations.
pub type ConcreteGitHubClient = Arc<HttpGitHubClient<Arc<EnvTokenProvider>>>;

pub type ConcreteRemoteCache = RemotePortfolioCache<ConcreteGitHubClient, Arc<EnvTokenProvider>>;

pub type ConcreteCollectionIndex = HttpCollectionIndex<ConcreteGitHubClient>;

pub type ConcreteIndexManager = UnifiedIndexManager<
    FsLocalIndex,
    ConcreteCollectionIndex,
    ConcreteGitHubClient,
    Arc<EnvTokenProvider>,
>;

/// Shared application state used by every CLI command.
#[derive(Clone)]
pub struct AppState {
    pub index_manager: Arc<ConcreteIndexManager>,
    pub remote_cache: Arc<ConcreteRemoteCache>,
    pub tokens: Arc<EnvTokenProvider>,
    pub config: Arc<LoadedConfig>,
    pub data_dir: PathBuf,
    pub portfolio_dir: PathBuf,
}

impl AppState {
    /// Initialize the application state: load config, wire services.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();

        // Ensure data directory exists
        tokio::fs::create_dir_all(&data_dir)
            .await
            .with_context(|| format!("Failed to create data directory {}", data_dir.display()))?;

        let loaded = load_config(&data_dir).await?;
        let portfolio_dir = loaded.portfolio_dir(&data_dir);
        tracing::debug!(
            config = %loaded.path.display(),
            portfolio = %portfolio_dir.display(),
            "Configuration loaded"
        );

        let tokens = Arc::new(EnvTokenProvider::new());
        let github: ConcreteGitHubClient = Arc::new(
            HttpGitHubClient::from_settings(tokens.clone(), &loaded.config.github)
                .context("Failed to build GitHub client")?,
        );

        let remote_cache = Arc::new(RemotePortfolioCache::new(
            github.clone(),
            tokens.clone(),
            RemoteCacheConfig::from(&loaded.config.github),
        ));

        let local = FsLocalIndex::from_settings(portfolio_dir.clone(), &loaded.config.local);
        let collection = HttpCollectionIndex::from_settings(
            github,
            &loaded.config.collection,
            collection_cache_path(&data_dir),
        );

        let index_manager = UnifiedIndexManager::new(
            local,
            collection,
            remote_cache.clone(),
            loaded.priority.clone(),
            loaded.config.search.clone(),
        )
        .context("Invalid [search] configuration")?;

        Ok(Self {
            index_manager: Arc::new(index_manager),
            remote_cache,
            tokens,
            config: Arc::new(loaded),
            data_dir,
            portfolio_dir,
        })
    }
}
