//! Data directory layout.

use std::path::{Path, PathBuf};

/// Environment variable overriding the data directory.
pub const DATA_DIR_VAR: &str = "PORTFOLIO_DATA_DIR";

/// Resolve the data directory from environment or platform defaults.
///
/// Priority:
/// 1. `PORTFOLIO_DATA_DIR` environment variable
/// 2. `~/.pfolio`
/// 3. `./.pfolio`
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(DATA_DIR_VAR) {
        if !dir.trim().is_empty() {
            return PathBuf::from(dir);
        }
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".pfolio");
    }

    PathBuf::from(".pfolio")
}

/// `{data_dir}/portfolio`, the default local portfolio root.
pub fn default_portfolio_dir(data_dir: &Path) -> PathBuf {
    data_dir.join("portfolio")
}

/// `{data_dir}/cache`
pub fn cache_dir(data_dir: &Path) -> PathBuf {
    data_dir.join("cache")
}

/// `{data_dir}/cache/collection-index.json`
pub fn collection_cache_path(data_dir: &Path) -> PathBuf {
    cache_dir(data_dir).join("collection-index.json")
}
