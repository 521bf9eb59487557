//! Storage abstraction for the catalog, profiles, and resume state.
//!
//! The [`CatalogStore`] trait defines every persistence operation the sync
//! and selection paths need, enabling pluggable backends (SQLite via
//! [`SqliteCatalog`](crate::sqlite_store::SqliteCatalog), in-memory for
//! tests). Implementations must be `Send + Sync` to work with async
//! runtimes.
//!
//! # Write-path disjointness
//!
//! The reconciliation job and live classification actions share the catalog
//! and may write the same record concurrently. The contract that keeps this
//! safe: [`merge_descriptive`](CatalogStore::merge_descriptive) never writes
//! `classification`, and [`set_classification`](CatalogStore::set_classification)
//! never writes descriptive fields. Every implementation must preserve this
//! field-disjointness — partial updates, not whole-record overwrites.
//!
//! All writes are merges: no field is cleared by omission.

use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::{bail, Result};
use async_trait::async_trait;

use crate::models::{CatalogRecord, CatalogUpsert, Classification, ResumeState, UserProfile};

/// Abstract storage backend for Proofdeck.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`merge_descriptive`](CatalogStore::merge_descriptive) | Upsert a record's descriptive fields, classification untouched |
/// | [`get_record`](CatalogStore::get_record) | Fetch one catalog record by asset id |
/// | [`set_classification`](CatalogStore::set_classification) | Classification-only update |
/// | [`records_for_owner`](CatalogStore::records_for_owner) | One owner's catalog subset, path-ordered |
/// | [`selected_count`](CatalogStore::selected_count) | Count of an owner's `selected` records |
/// | [`get_profile`](CatalogStore::get_profile) | Fetch a user profile |
/// | [`merge_profile`](CatalogStore::merge_profile) | Partial profile update |
/// | [`merge_resume`](CatalogStore::merge_resume) | Partial resume-cursor update, fresh timestamp |
/// | [`load_resume`](CatalogStore::load_resume) | Fetch a resume cursor (`None` is normal) |
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Insert or refresh the descriptive fields of a catalog record.
    ///
    /// A new record starts unclassified; an existing record's
    /// classification is preserved verbatim.
    async fn merge_descriptive(&self, upsert: &CatalogUpsert) -> Result<()>;

    async fn get_record(&self, asset_id: &str) -> Result<Option<CatalogRecord>>;

    /// Set the classification of an existing record. Errors if the record
    /// does not exist.
    async fn set_classification(
        &self,
        asset_id: &str,
        classification: Classification,
    ) -> Result<()>;

    /// All records owned by `owner_id`, ordered by path then id.
    async fn records_for_owner(&self, owner_id: &str) -> Result<Vec<CatalogRecord>>;

    /// Snapshot count of `owner_id`'s records with `classification = selected`.
    async fn selected_count(&self, owner_id: &str) -> Result<i64>;

    async fn get_profile(&self, owner_id: &str) -> Result<Option<UserProfile>>;

    /// Create or partially update a profile. `None` fields keep their
    /// stored values; a fresh profile fills them with defaults.
    async fn merge_profile(
        &self,
        owner_id: &str,
        selection_limit: Option<i64>,
        root_folder_id: Option<&str>,
    ) -> Result<()>;

    /// Create or partially update the owner's resume cursor. `None` fields
    /// keep their stored values; `updated_at` is always refreshed.
    async fn merge_resume(
        &self,
        owner_id: &str,
        last_index: Option<i64>,
        last_asset_id: Option<&str>,
    ) -> Result<()>;

    async fn load_resume(&self, owner_id: &str) -> Result<Option<ResumeState>>;
}

/// Default selection cap applied when a profile carries none.
pub const DEFAULT_SELECTION_LIMIT: i64 = 150;

/// In-memory store for tests.
///
/// `HashMap`s behind `std::sync::RwLock`, mirroring the SQLite
/// implementation's merge semantics exactly.
pub struct MemoryCatalog {
    records: RwLock<HashMap<String, CatalogRecord>>,
    profiles: RwLock<HashMap<String, UserProfile>>,
    resume: RwLock<HashMap<String, ResumeState>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            profiles: RwLock::new(HashMap::new()),
            resume: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalog {
    async fn merge_descriptive(&self, upsert: &CatalogUpsert) -> Result<()> {
        let mut records = self.records.write().unwrap();
        let classification = records.get(&upsert.id).and_then(|r| r.classification);
        records.insert(
            upsert.id.clone(),
            CatalogRecord {
                id: upsert.id.clone(),
                owner_id: upsert.owner_id.clone(),
                path: upsert.path.clone(),
                source_folder_id: upsert.source_folder_id.clone(),
                display_url: upsert.display_url.clone(),
                thumbnail_url: upsert.thumbnail_url.clone(),
                discovered_at: upsert.discovered_at,
                classification,
            },
        );
        Ok(())
    }

    async fn get_record(&self, asset_id: &str) -> Result<Option<CatalogRecord>> {
        Ok(self.records.read().unwrap().get(asset_id).cloned())
    }

    async fn set_classification(
        &self,
        asset_id: &str,
        classification: Classification,
    ) -> Result<()> {
        let mut records = self.records.write().unwrap();
        match records.get_mut(asset_id) {
            Some(record) => {
                record.classification = Some(classification);
                Ok(())
            }
            None => bail!("no catalog record with id '{}'", asset_id),
        }
    }

    async fn records_for_owner(&self, owner_id: &str) -> Result<Vec<CatalogRecord>> {
        let records = self.records.read().unwrap();
        let mut owned: Vec<CatalogRecord> = records
            .values()
            .filter(|r| r.owner_id == owner_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| a.path.cmp(&b.path).then_with(|| a.id.cmp(&b.id)));
        Ok(owned)
    }

    async fn selected_count(&self, owner_id: &str) -> Result<i64> {
        let records = self.records.read().unwrap();
        Ok(records
            .values()
            .filter(|r| r.owner_id == owner_id && r.classification == Some(Classification::Selected))
            .count() as i64)
    }

    async fn get_profile(&self, owner_id: &str) -> Result<Option<UserProfile>> {
        Ok(self.profiles.read().unwrap().get(owner_id).cloned())
    }

    async fn merge_profile(
        &self,
        owner_id: &str,
        selection_limit: Option<i64>,
        root_folder_id: Option<&str>,
    ) -> Result<()> {
        let mut profiles = self.profiles.write().unwrap();
        let entry = profiles.entry(owner_id.to_string()).or_insert(UserProfile {
            id: owner_id.to_string(),
            selection_limit: DEFAULT_SELECTION_LIMIT,
            root_folder_id: None,
        });
        if let Some(limit) = selection_limit {
            entry.selection_limit = limit;
        }
        if let Some(root) = root_folder_id {
            entry.root_folder_id = Some(root.to_string());
        }
        Ok(())
    }

    async fn merge_resume(
        &self,
        owner_id: &str,
        last_index: Option<i64>,
        last_asset_id: Option<&str>,
    ) -> Result<()> {
        let mut resume = self.resume.write().unwrap();
        let entry = resume.entry(owner_id.to_string()).or_insert(ResumeState {
            owner_id: owner_id.to_string(),
            last_index: 0,
            last_asset_id: None,
            updated_at: 0,
        });
        if let Some(index) = last_index {
            entry.last_index = index;
        }
        if let Some(asset) = last_asset_id {
            entry.last_asset_id = Some(asset.to_string());
        }
        entry.updated_at = chrono::Utc::now().timestamp();
        Ok(())
    }

    async fn load_resume(&self, owner_id: &str) -> Result<Option<ResumeState>> {
        Ok(self.resume.read().unwrap().get(owner_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upsert(id: &str, owner: &str, path: &str) -> CatalogUpsert {
        CatalogUpsert {
            id: id.to_string(),
            owner_id: owner.to_string(),
            path: path.to_string(),
            source_folder_id: "f1".to_string(),
            display_url: format!("https://example.com/{}", id),
            thumbnail_url: format!("https://example.com/thumb/{}", id),
            discovered_at: 1_700_000_000,
        }
    }

    #[tokio::test]
    async fn merge_descriptive_preserves_classification() {
        let store = MemoryCatalog::new();
        store.merge_descriptive(&upsert("a1", "u1", "R")).await.unwrap();
        store
            .set_classification("a1", Classification::Selected)
            .await
            .unwrap();

        // Refreshed path, classification untouched
        store
            .merge_descriptive(&upsert("a1", "u1", "R/Renamed"))
            .await
            .unwrap();

        let record = store.get_record("a1").await.unwrap().unwrap();
        assert_eq!(record.path, "R/Renamed");
        assert_eq!(record.classification, Some(Classification::Selected));
    }

    #[tokio::test]
    async fn set_classification_on_unknown_asset_errors() {
        let store = MemoryCatalog::new();
        let err = store
            .set_classification("ghost", Classification::Later)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("ghost"));
    }

    #[tokio::test]
    async fn records_for_owner_sorted_and_scoped() {
        let store = MemoryCatalog::new();
        store.merge_descriptive(&upsert("b", "u1", "R/S")).await.unwrap();
        store.merge_descriptive(&upsert("a", "u1", "R")).await.unwrap();
        store.merge_descriptive(&upsert("c", "u2", "R")).await.unwrap();

        let owned = store.records_for_owner("u1").await.unwrap();
        assert_eq!(
            owned.iter().map(|r| r.id.as_str()).collect::<Vec<_>>(),
            vec!["a", "b"]
        );
    }

    #[tokio::test]
    async fn merge_resume_partial_update_keeps_other_fields() {
        let store = MemoryCatalog::new();
        store.merge_resume("u1", Some(7), Some("a42")).await.unwrap();
        store.merge_resume("u1", Some(9), None).await.unwrap();

        let state = store.load_resume("u1").await.unwrap().unwrap();
        assert_eq!(state.last_index, 9);
        assert_eq!(state.last_asset_id.as_deref(), Some("a42"));
    }
}
