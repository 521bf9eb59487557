//! SQLite-backed [`CatalogStore`] implementation.
//!
//! All writes are partial: the descriptive upsert's `ON CONFLICT` clause
//! never names `classification`, and the classification write is a
//! single-column `UPDATE`, so the two paths cannot clobber each other no
//! matter how a reconciliation run interleaves with live selection actions.

use anyhow::{bail, Result};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use crate::models::{CatalogRecord, CatalogUpsert, Classification, ResumeState, UserProfile};
use crate::store::{CatalogStore, DEFAULT_SELECTION_LIMIT};

pub struct SqliteCatalog {
    pool: SqlitePool,
}

impl SqliteCatalog {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn record_from_row(row: &sqlx::sqlite::SqliteRow) -> CatalogRecord {
    let classification: Option<String> = row.get("classification");
    CatalogRecord {
        id: row.get("id"),
        owner_id: row.get("owner_id"),
        path: row.get("path"),
        source_folder_id: row.get("source_folder_id"),
        display_url: row.get("display_url"),
        thumbnail_url: row.get("thumbnail_url"),
        discovered_at: row.get("discovered_at"),
        classification: classification.as_deref().and_then(Classification::parse),
    }
}

#[async_trait]
impl CatalogStore for SqliteCatalog {
    async fn merge_descriptive(&self, upsert: &CatalogUpsert) -> Result<()> {
        // classification is absent from the update set: a new row starts
        // unclassified, an existing row keeps whatever the user assigned.
        sqlx::query(
            r#"
            INSERT INTO catalog (id, owner_id, path, source_folder_id, display_url, thumbnail_url, discovered_at, classification)
            VALUES (?, ?, ?, ?, ?, ?, ?, NULL)
            ON CONFLICT(id) DO UPDATE SET
                owner_id = excluded.owner_id,
                path = excluded.path,
                source_folder_id = excluded.source_folder_id,
                display_url = excluded.display_url,
                thumbnail_url = excluded.thumbnail_url,
                discovered_at = excluded.discovered_at
            "#,
        )
        .bind(&upsert.id)
        .bind(&upsert.owner_id)
        .bind(&upsert.path)
        .bind(&upsert.source_folder_id)
        .bind(&upsert.display_url)
        .bind(&upsert.thumbnail_url)
        .bind(upsert.discovered_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_record(&self, asset_id: &str) -> Result<Option<CatalogRecord>> {
        let row = sqlx::query(
            "SELECT id, owner_id, path, source_folder_id, display_url, thumbnail_url, \
             discovered_at, classification FROM catalog WHERE id = ?",
        )
        .bind(asset_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(record_from_row))
    }

    async fn set_classification(
        &self,
        asset_id: &str,
        classification: Classification,
    ) -> Result<()> {
        let result = sqlx::query("UPDATE catalog SET classification = ? WHERE id = ?")
            .bind(classification.as_str())
            .bind(asset_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            bail!("no catalog record with id '{}'", asset_id);
        }
        Ok(())
    }

    async fn records_for_owner(&self, owner_id: &str) -> Result<Vec<CatalogRecord>> {
        let rows = sqlx::query(
            "SELECT id, owner_id, path, source_folder_id, display_url, thumbnail_url, \
             discovered_at, classification FROM catalog WHERE owner_id = ? ORDER BY path, id",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(record_from_row).collect())
    }

    async fn selected_count(&self, owner_id: &str) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM catalog WHERE owner_id = ? AND classification = 'selected'",
        )
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn get_profile(&self, owner_id: &str) -> Result<Option<UserProfile>> {
        let row = sqlx::query("SELECT id, selection_limit, root_folder_id FROM profiles WHERE id = ?")
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| UserProfile {
            id: r.get("id"),
            selection_limit: r.get("selection_limit"),
            root_folder_id: r.get("root_folder_id"),
        }))
    }

    async fn merge_profile(
        &self,
        owner_id: &str,
        selection_limit: Option<i64>,
        root_folder_id: Option<&str>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO profiles (id, selection_limit, root_folder_id)
            VALUES (?, COALESCE(?, ?), ?)
            ON CONFLICT(id) DO UPDATE SET
                selection_limit = COALESCE(?, profiles.selection_limit),
                root_folder_id = COALESCE(?, profiles.root_folder_id)
            "#,
        )
        .bind(owner_id)
        .bind(selection_limit)
        .bind(DEFAULT_SELECTION_LIMIT)
        .bind(root_folder_id)
        .bind(selection_limit)
        .bind(root_folder_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn merge_resume(
        &self,
        owner_id: &str,
        last_index: Option<i64>,
        last_asset_id: Option<&str>,
    ) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        sqlx::query(
            r#"
            INSERT INTO resume_state (owner_id, last_index, last_asset_id, updated_at)
            VALUES (?, COALESCE(?, 0), ?, ?)
            ON CONFLICT(owner_id) DO UPDATE SET
                last_index = COALESCE(?, resume_state.last_index),
                last_asset_id = COALESCE(?, resume_state.last_asset_id),
                updated_at = ?
            "#,
        )
        .bind(owner_id)
        .bind(last_index)
        .bind(last_asset_id)
        .bind(now)
        .bind(last_index)
        .bind(last_asset_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn load_resume(&self, owner_id: &str) -> Result<Option<ResumeState>> {
        let row = sqlx::query(
            "SELECT owner_id, last_index, last_asset_id, updated_at \
             FROM resume_state WHERE owner_id = ?",
        )
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| ResumeState {
            owner_id: r.get("owner_id"),
            last_index: r.get("last_index"),
            last_asset_id: r.get("last_asset_id"),
            updated_at: r.get("updated_at"),
        }))
    }
}
