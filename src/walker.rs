//! Recursive folder tree discovery.
//!
//! Walks the provider's containment graph from a configured root, issuing
//! the two per-folder listing calls (sub-folders, image assets) and then
//! recursing into every child folder concurrently. Sibling recursions fan
//! out onto the tokio runtime and are joined together, so the wall-clock
//! cost of a walk tracks the tree's depth rather than its node count.
//!
//! Fan-out is bounded: every listing call holds a permit from a shared
//! semaphore sized by `sync.max_parallel_requests`, so a very wide tree
//! cannot open an unbounded number of outbound connections.
//!
//! Any provider error aborts the whole walk — the caller retries wholesale,
//! which reconciliation's idempotence makes safe. There is no checkpointing
//! of a partially completed walk.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use anyhow::{bail, Result};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::models::FolderNode;
use crate::provider::StorageProvider;

/// Discover the full folder tree rooted at `folder_id`.
///
/// `display_name` labels the root node and becomes the first segment of
/// every flattened path; it must not be empty. `max_parallel` caps the
/// number of provider listing calls in flight at once.
pub async fn discover(
    provider: Arc<dyn StorageProvider>,
    folder_id: &str,
    display_name: &str,
    max_parallel: usize,
) -> Result<FolderNode> {
    if display_name.trim().is_empty() {
        bail!("root display name must not be empty");
    }

    let limiter = Arc::new(Semaphore::new(max_parallel.max(1)));
    discover_node(
        provider,
        folder_id.to_string(),
        display_name.to_string(),
        limiter,
    )
    .await
}

/// Recursive step, boxed because async recursion needs an indirected future.
fn discover_node(
    provider: Arc<dyn StorageProvider>,
    id: String,
    name: String,
    limiter: Arc<Semaphore>,
) -> Pin<Box<dyn Future<Output = Result<FolderNode>> + Send>> {
    Box::pin(async move {
        let (folders, asset_ids) = {
            let _permit = limiter.acquire().await?;
            let folders = provider.list_folders(&id).await?;
            let asset_ids = provider.list_images(&id).await?;
            (folders, asset_ids)
        };

        // Fan out sibling recursions; completion order is arbitrary, so
        // children are reassembled by index to preserve listing order.
        let child_count = folders.len();
        let mut tasks: JoinSet<(usize, Result<FolderNode>)> = JoinSet::new();
        for (idx, child) in folders.into_iter().enumerate() {
            let provider = provider.clone();
            let limiter = limiter.clone();
            tasks.spawn(async move {
                let node = discover_node(provider, child.id, child.name, limiter).await;
                (idx, node)
            });
        }

        let mut slots: Vec<Option<FolderNode>> =
            std::iter::repeat_with(|| None).take(child_count).collect();
        while let Some(joined) = tasks.join_next().await {
            let (idx, node) = joined?;
            // First error wins; dropping the JoinSet cancels the siblings.
            slots[idx] = Some(node?);
        }

        Ok(FolderNode {
            id,
            name,
            children: slots.into_iter().flatten().collect(),
            asset_ids,
        })
    })
}
