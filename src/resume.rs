//! Resume cursor: the last navigation position saved per user.
//!
//! Written on every navigation step, read once at session start. Purely
//! advisory — a lost cursor degrades UX, never correctness — so the
//! fire-and-forget save path swallows failures after logging them.

use crate::models::ResumeState;
use crate::store::CatalogStore;

/// Persist the owner's position. Merge semantics: an absent field keeps its
/// stored value; `updated_at` is always stamped fresh.
pub async fn save_position(
    store: &dyn CatalogStore,
    owner_id: &str,
    last_index: Option<i64>,
    last_asset_id: Option<&str>,
) -> anyhow::Result<()> {
    store.merge_resume(owner_id, last_index, last_asset_id).await
}

/// Best-effort save for the navigation hot path: failures are logged and
/// never surfaced to the actor.
pub async fn save_position_best_effort(
    store: &dyn CatalogStore,
    owner_id: &str,
    last_index: Option<i64>,
    last_asset_id: Option<&str>,
) {
    if let Err(e) = save_position(store, owner_id, last_index, last_asset_id).await {
        eprintln!(
            "Warning: failed to save resume position for {}: {:#}",
            owner_id, e
        );
    }
}

/// Load the owner's saved position. `None` means no prior state — the
/// normal condition on a first session, not an error.
pub async fn load_position(
    store: &dyn CatalogStore,
    owner_id: &str,
) -> anyhow::Result<Option<ResumeState>> {
    store.load_resume(owner_id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryCatalog;

    #[tokio::test]
    async fn round_trip() {
        let store = MemoryCatalog::new();
        save_position(&store, "u1", Some(7), Some("asset42"))
            .await
            .unwrap();

        let state = load_position(&store, "u1").await.unwrap().unwrap();
        assert_eq!(state.last_index, 7);
        assert_eq!(state.last_asset_id.as_deref(), Some("asset42"));
    }

    #[tokio::test]
    async fn unknown_owner_loads_absent() {
        let store = MemoryCatalog::new();
        assert!(load_position(&store, "nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn partial_save_preserves_unsupplied_fields() {
        let store = MemoryCatalog::new();
        save_position(&store, "u1", Some(3), Some("a1")).await.unwrap();
        save_position(&store, "u1", Some(4), None).await.unwrap();

        let state = load_position(&store, "u1").await.unwrap().unwrap();
        assert_eq!(state.last_index, 4);
        assert_eq!(state.last_asset_id.as_deref(), Some("a1"));
    }
}
