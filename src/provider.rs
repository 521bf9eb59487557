//! Storage provider abstraction and the Drive REST implementation.
//!
//! The [`StorageProvider`] trait is the seam between the discovery engine and
//! the external hierarchical file store. Production code uses
//! [`DriveProvider`], which talks to a Google-Drive-v3-style `files` endpoint
//! authenticated by a static API key carried as a query parameter; tests
//! implement the trait over in-memory maps.
//!
//! # Credential handling
//!
//! The API key is read from `provider.api_key` in the config file, falling
//! back to the `PROOFDECK_DRIVE_API_KEY` environment variable. When neither
//! is set, listing calls return empty results with a warning instead of
//! failing, so partial discovery stays resilient. Genuine network or HTTP
//! errors, by contrast, propagate and abort the walk — a half-discovered
//! tree is never silently returned.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use crate::config::ProviderConfig;

/// A child folder entry returned by a provider listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderEntry {
    pub id: String,
    pub name: String,
}

/// Read-only view of an external hierarchical file store.
///
/// Implementations list one folder's immediate children, split into
/// sub-folders and image assets; recursion is the walker's job. The locator
/// methods map a stable asset id to the URLs the gallery client loads.
#[async_trait]
pub trait StorageProvider: Send + Sync {
    /// List the non-trashed sub-folders of `folder_id`.
    async fn list_folders(&self, folder_id: &str) -> Result<Vec<FolderEntry>>;

    /// List the ids of non-trashed image assets (MIME prefix `image/`)
    /// directly inside `folder_id`.
    async fn list_images(&self, folder_id: &str) -> Result<Vec<String>>;

    /// Full-size display URL for an asset.
    fn display_url(&self, asset_id: &str) -> String;

    /// Thumbnail URL for an asset.
    fn thumbnail_url(&self, asset_id: &str) -> String;
}

/// Drive REST API provider.
pub struct DriveProvider {
    api_key: String,
    base_url: String,
    thumbnail_size: u32,
    client: reqwest::Client,
}

/// Response shape of the `files` listing endpoint.
#[derive(Debug, Deserialize)]
struct FileList {
    #[serde(default)]
    files: Option<Vec<DriveFile>>,
}

#[derive(Debug, Deserialize)]
struct DriveFile {
    id: String,
    #[serde(default)]
    name: Option<String>,
}

impl DriveProvider {
    pub fn new(config: &ProviderConfig) -> Self {
        let api_key = if config.api_key.is_empty() {
            std::env::var("PROOFDECK_DRIVE_API_KEY").unwrap_or_default()
        } else {
            config.api_key.clone()
        };

        Self {
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            thumbnail_size: config.thumbnail_size,
            client: reqwest::Client::new(),
        }
    }

    /// Whether a provider credential is configured at all.
    pub fn has_credential(&self) -> bool {
        !self.api_key.is_empty()
    }

    async fn list_files(&self, query: &str, fields: &str, folder_id: &str) -> Result<Vec<DriveFile>> {
        let url = format!("{}/files", self.base_url);
        let resp = self
            .client
            .get(&url)
            .query(&[("q", query), ("fields", fields), ("key", self.api_key.as_str())])
            .send()
            .await
            .with_context(|| format!("Failed to list children of folder '{}'", folder_id))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            bail!(
                "Provider listing failed (HTTP {}) for folder '{}': {}",
                status,
                folder_id,
                body.chars().take(500).collect::<String>()
            );
        }

        let list: FileList = resp
            .json()
            .await
            .with_context(|| format!("Invalid listing response for folder '{}'", folder_id))?;

        Ok(list.files.unwrap_or_default())
    }
}

#[async_trait]
impl StorageProvider for DriveProvider {
    async fn list_folders(&self, folder_id: &str) -> Result<Vec<FolderEntry>> {
        if !self.has_credential() {
            eprintln!(
                "Warning: provider API key not configured; treating folder '{}' as empty",
                folder_id
            );
            return Ok(Vec::new());
        }

        let query = format!(
            "'{}' in parents and mimeType='application/vnd.google-apps.folder' and trashed=false",
            folder_id
        );
        let files = self
            .list_files(&query, "files(id,name,mimeType)", folder_id)
            .await?;

        Ok(files
            .into_iter()
            .map(|f| FolderEntry {
                name: f.name.unwrap_or_default(),
                id: f.id,
            })
            .collect())
    }

    async fn list_images(&self, folder_id: &str) -> Result<Vec<String>> {
        if !self.has_credential() {
            eprintln!(
                "Warning: provider API key not configured; treating folder '{}' as empty",
                folder_id
            );
            return Ok(Vec::new());
        }

        let query = format!(
            "'{}' in parents and mimeType contains 'image/' and trashed=false",
            folder_id
        );
        let files = self.list_files(&query, "files(id)", folder_id).await?;

        Ok(files.into_iter().map(|f| f.id).collect())
    }

    fn display_url(&self, asset_id: &str) -> String {
        format!("https://drive.google.com/uc?export=view&id={}", asset_id)
    }

    fn thumbnail_url(&self, asset_id: &str) -> String {
        format!(
            "https://drive.google.com/thumbnail?id={}&sz=w{}",
            asset_id, self.thumbnail_size
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider_without_key() -> DriveProvider {
        // Bypass the env fallback so the test is hermetic.
        DriveProvider {
            api_key: String::new(),
            base_url: "https://www.googleapis.com/drive/v3".to_string(),
            thumbnail_size: 400,
            client: reqwest::Client::new(),
        }
    }

    #[tokio::test]
    async fn missing_credential_yields_empty_listings() {
        let provider = provider_without_key();
        assert_eq!(provider.list_folders("root").await.unwrap(), Vec::new());
        assert_eq!(
            provider.list_images("root").await.unwrap(),
            Vec::<String>::new()
        );
    }

    #[test]
    fn locators_embed_asset_id_and_size() {
        let config = ProviderConfig {
            thumbnail_size: 640,
            ..ProviderConfig::default()
        };
        let provider = DriveProvider::new(&config);
        assert_eq!(
            provider.display_url("abc123"),
            "https://drive.google.com/uc?export=view&id=abc123"
        );
        assert_eq!(
            provider.thumbnail_url("abc123"),
            "https://drive.google.com/thumbnail?id=abc123&sz=w640"
        );
    }
}
