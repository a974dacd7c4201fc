//! Configuration loader.
//!
//! Reads `config.toml` from the data directory and deserializes it into
//! [`PortfolioConfig`]. A missing or unparsable file falls back to defaults;
//! a file that parses but fails validation is an error, since silently
//! replacing what the user wrote would hide the mistake.

use std::path::{Path, PathBuf};

use anyhow::Context;

use portfolio_types::config::{PortfolioConfig, SourcePriorityConfig};

use crate::filesystem::default_portfolio_dir;

/// A loaded config with its validated source priority.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: PortfolioConfig,
    pub priority: SourcePriorityConfig,
    pub path: PathBuf,
}

impl LoadedConfig {
    /// Local portfolio root: the configured one, else `{data_dir}/portfolio`.
    pub fn portfolio_dir(&self, data_dir: &Path) -> PathBuf {
        self.config
            .local
            .portfolio_dir
            .clone()
            .unwrap_or_else(|| default_portfolio_dir(data_dir))
    }
}

/// Load `{data_dir}/config.toml`.
///
/// - Missing file: defaults.
/// - Unreadable or unparsable file: warning, then defaults.
/// - Parsed file failing validation: error.
pub async fn load_config(data_dir: &Path) -> anyhow::Result<LoadedConfig> {
    let path = data_dir.join("config.toml");
    let config = read_config(&path).await;
    let priority = config
        .validate()
        .with_context(|| format!("Invalid configuration in {}", path.display()))?;
    Ok(LoadedConfig {
        config,
        priority,
        path,
    })
}

async fn read_config(path: &Path) -> PortfolioConfig {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", path.display());
            return PortfolioConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", path.display());
            return PortfolioConfig::default();
        }
    };

    match toml::from_str::<PortfolioConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!("Failed to parse {}: {err}, using defaults", path.display());
            PortfolioConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portfolio_types::element::Source;
    use portfolio_types::error::{ConfigError, PriorityIssue};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let loaded = load_config(tmp.path()).await.unwrap();
        assert_eq!(loaded.priority.priority(), &Source::ALL);
        assert!(loaded.priority.stop_on_first);
        assert_eq!(loaded.config.github.cache_ttl_secs, 900);
        assert_eq!(
            loaded.portfolio_dir(tmp.path()),
            tmp.path().join("portfolio")
        );
    }

    #[tokio::test]
    async fn test_valid_toml_is_parsed() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(
            tmp.path().join("config.toml"),
            r#"
[sources]
priority = ["github", "local"]
stop_on_first = false

[github]
username = "octocat"
cache_ttl_secs = 60

[local]
portfolio_dir = "/srv/portfolio"
"#,
        )
        .await
        .unwrap();

        let loaded = load_config(tmp.path()).await.unwrap();
        assert_eq!(loaded.priority.priority(), &[Source::GitHub, Source::Local]);
        assert!(!loaded.priority.stop_on_first);
        assert_eq!(loaded.config.github.username.as_deref(), Some("octocat"));
        assert_eq!(loaded.config.github.repository, "dollhouse-portfolio");
        assert_eq!(
            loaded.portfolio_dir(tmp.path()),
            PathBuf::from("/srv/portfolio")
        );
    }

    #[tokio::test]
    async fn test_invalid_toml_returns_default() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(tmp.path().join("config.toml"), "this is not { valid toml !!!")
            .await
            .unwrap();

        let loaded = load_config(tmp.path()).await.unwrap();
        assert_eq!(loaded.priority.priority(), &Source::ALL);
    }

    #[tokio::test]
    async fn test_invalid_priority_is_an_error() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(
            tmp.path().join("config.toml"),
            "[sources]\npriority = [\"local\", \"local\", \"gitlab\"]\n",
        )
        .await
        .unwrap();

        let err = load_config(tmp.path()).await.unwrap_err();
        let config_err = err.downcast_ref::<ConfigError>().unwrap();
        assert_eq!(
            config_err,
            &ConfigError::InvalidSourcePriority {
                issues: vec![
                    PriorityIssue::UnknownSource("gitlab".to_string()),
                    PriorityIssue::DuplicateSource(Source::Local),
                ]
            }
        );
    }
}
