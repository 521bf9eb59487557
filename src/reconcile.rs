//! Reconciliation pipeline orchestration.
//!
//! Coordinates the full sync flow: provider discovery → flattening →
//! catalog merge. Per-asset upserts run concurrently and fail in isolation
//! (skip-and-count); a discovery failure, by contrast, aborts the whole run
//! and the caller retries wholesale — reconciliation is idempotent, so a
//! naive full retry is always safe.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use chrono::Utc;
use tokio::task::JoinSet;

use crate::config::Config;
use crate::db;
use crate::flatten;
use crate::models::{AssetGroup, CatalogUpsert, SyncReport};
use crate::provider::{DriveProvider, StorageProvider};
use crate::sqlite_store::SqliteCatalog;
use crate::store::CatalogStore;
use crate::walker;

/// Merge flattened asset groups into the catalog for one owner.
///
/// Every `(group, asset)` pair becomes a descriptive upsert keyed by the
/// asset id. Upserts are issued in list order but run concurrently; no
/// completion order is guaranteed. A failed upsert is logged and counted,
/// never fatal — this is a bulk job, not a transaction. A previously set
/// classification is never changed, so running this any number of times,
/// in any interleaving with itself, is harmless.
pub async fn reconcile(
    store: &Arc<dyn CatalogStore>,
    provider: &dyn StorageProvider,
    groups: &[AssetGroup],
    owner_id: &str,
) -> SyncReport {
    let discovered_at = Utc::now().timestamp();

    let mut tasks: JoinSet<std::result::Result<(), (String, anyhow::Error)>> = JoinSet::new();
    for group in groups {
        for asset_id in &group.asset_ids {
            let upsert = CatalogUpsert {
                id: asset_id.clone(),
                owner_id: owner_id.to_string(),
                path: group.path.clone(),
                source_folder_id: group.source_folder_id.clone(),
                display_url: provider.display_url(asset_id),
                thumbnail_url: provider.thumbnail_url(asset_id),
                discovered_at,
            };
            let store = store.clone();
            tasks.spawn(async move {
                store
                    .merge_descriptive(&upsert)
                    .await
                    .map_err(|e| (upsert.id.clone(), e))
            });
        }
    }

    let mut report = SyncReport::default();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Ok(())) => report.synced += 1,
            Ok(Err((asset_id, e))) => {
                eprintln!("Warning: failed to sync asset {}: {:#}", asset_id, e);
                report.errors += 1;
            }
            Err(e) => {
                eprintln!("Warning: sync task panicked: {}", e);
                report.errors += 1;
            }
        }
    }
    report
}

/// Resolve the root folder for an owner: explicit override, then the
/// owner's profile, then the configured default.
pub async fn resolve_root(
    store: &dyn CatalogStore,
    config: &Config,
    owner_id: &str,
    root_override: Option<String>,
) -> Result<String> {
    if let Some(root) = root_override {
        return Ok(root);
    }
    if let Some(profile) = store.get_profile(owner_id).await? {
        if let Some(root) = profile.root_folder_id {
            return Ok(root);
        }
    }
    config
        .provider
        .root_folder_id
        .clone()
        .ok_or_else(|| anyhow!("no root folder configured for owner '{}'", owner_id))
}

/// Run a full sync for one owner, as triggered by `pfd sync`.
pub async fn run_sync(
    config: &Config,
    owner_id: &str,
    root_override: Option<String>,
    dry_run: bool,
) -> Result<SyncReport> {
    let pool = db::connect(config).await?;
    let store: Arc<dyn CatalogStore> = Arc::new(SqliteCatalog::new(pool.clone()));
    let provider: Arc<dyn StorageProvider> = Arc::new(DriveProvider::new(&config.provider));

    let root_id = resolve_root(store.as_ref(), config, owner_id, root_override).await?;

    let tree = walker::discover(
        provider.clone(),
        &root_id,
        &config.provider.root_name,
        config.sync.max_parallel_requests,
    )
    .await?;
    let groups = flatten::flatten(&tree);
    let asset_count: usize = groups.iter().map(|g| g.asset_ids.len()).sum();

    if dry_run {
        println!("sync {} (dry-run)", owner_id);
        println!("  groups found: {}", groups.len());
        println!("  assets found: {}", asset_count);
        pool.close().await;
        return Ok(SyncReport::default());
    }

    let report = reconcile(&store, provider.as_ref(), &groups, owner_id).await;

    println!("sync {}", owner_id);
    println!("  groups: {}", groups.len());
    println!("  synced: {}", report.synced);
    println!("  errors: {}", report.errors);
    println!("ok");

    pool.close().await;
    Ok(report)
}
