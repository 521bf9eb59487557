use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProviderConfig {
    /// Static API key for the storage provider. Empty means no credential;
    /// discovery then yields empty listings instead of failing.
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Default root folder to walk when the user profile carries none.
    #[serde(default)]
    pub root_folder_id: Option<String>,
    /// Display label for the walk root; becomes the first path segment.
    #[serde(default = "default_root_name")]
    pub root_name: String,
    #[serde(default = "default_thumbnail_size")]
    pub thumbnail_size: u32,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_base_url(),
            root_folder_id: None,
            root_name: default_root_name(),
            thumbnail_size: default_thumbnail_size(),
        }
    }
}

fn default_base_url() -> String {
    "https://www.googleapis.com/drive/v3".to_string()
}
fn default_root_name() -> String {
    "Root".to_string()
}
fn default_thumbnail_size() -> u32 {
    400
}

#[derive(Debug, Deserialize, Clone)]
pub struct SyncConfig {
    /// Ceiling on concurrent provider listing calls during a tree walk.
    #[serde(default = "default_max_parallel")]
    pub max_parallel_requests: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_parallel_requests: default_max_parallel(),
        }
    }
}

fn default_max_parallel() -> usize {
    8
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.sync.max_parallel_requests == 0 {
        anyhow::bail!("sync.max_parallel_requests must be > 0");
    }

    if config.provider.root_name.trim().is_empty() {
        anyhow::bail!("provider.root_name must not be empty");
    }

    if config.provider.thumbnail_size == 0 {
        anyhow::bail!("provider.thumbnail_size must be > 0");
    }

    if config.provider.base_url.trim_end_matches('/').is_empty() {
        anyhow::bail!("provider.base_url must not be empty");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml_str: &str) -> Result<Config> {
        let config: Config = toml::from_str(toml_str)?;
        validate(&config)?;
        Ok(config)
    }

    #[test]
    fn minimal_config_gets_defaults() {
        let config = parse(
            r#"
            [db]
            path = "data/proofdeck.sqlite"

            [server]
            bind = "127.0.0.1:7431"
            "#,
        )
        .unwrap();

        assert_eq!(config.sync.max_parallel_requests, 8);
        assert_eq!(config.provider.root_name, "Root");
        assert_eq!(config.provider.thumbnail_size, 400);
        assert!(config.provider.api_key.is_empty());
        assert!(config.provider.root_folder_id.is_none());
        assert_eq!(config.provider.base_url, "https://www.googleapis.com/drive/v3");
    }

    #[test]
    fn zero_parallelism_rejected() {
        let err = parse(
            r#"
            [db]
            path = "data/proofdeck.sqlite"

            [sync]
            max_parallel_requests = 0

            [server]
            bind = "127.0.0.1:7431"
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("max_parallel_requests"));
    }

    #[test]
    fn empty_root_name_rejected() {
        let err = parse(
            r#"
            [db]
            path = "data/proofdeck.sqlite"

            [provider]
            root_name = "  "

            [server]
            bind = "127.0.0.1:7431"
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("root_name"));
    }
}
