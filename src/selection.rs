//! Classification state machine.
//!
//! Governs transitions of a single asset's classification in response to a
//! user action, bounded by the owner's selection cap. Only forward
//! transitions occur: `unclassified | later → selected` and
//! `unclassified | selected → later`; there is no explicit clear action,
//! and an asset may transition arbitrarily often.
//!
//! A cap rejection is normal control flow — modeled as an [`Ok`] outcome
//! variant, never an error — and must reach the user distinctly from
//! transient failures.
//!
//! The selected count is a snapshot read taken just before the write.
//! Actions within one session are sequential (one asset open at a time),
//! but two concurrent sessions for the same user can both pass the check
//! before either commits. That race is accepted, documented behavior; see
//! DESIGN.md for why it is not tightened to an atomic counter.

use anyhow::{anyhow, bail, Result};

use crate::models::Classification;
use crate::store::{CatalogStore, DEFAULT_SELECTION_LIMIT};

/// Why a classification attempt was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The owner already has `limit` selected assets.
    LimitReached { limit: i64 },
}

/// Result of a classification attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifyOutcome {
    Applied { classification: Classification },
    Rejected { reason: RejectReason },
}

/// The owner's selection cap, from their profile or the default of 150.
pub async fn selection_limit(store: &dyn CatalogStore, owner_id: &str) -> Result<i64> {
    Ok(store
        .get_profile(owner_id)
        .await?
        .map(|p| p.selection_limit)
        .unwrap_or(DEFAULT_SELECTION_LIMIT))
}

/// Attempt one classification transition.
///
/// Selecting an asset that is not already selected requires headroom under
/// the owner's cap; at the cap the attempt is rejected and the catalog left
/// unmodified — a hard cap, not a soft warning. Re-selecting an already
/// selected asset is a no-op accept regardless of count, and `later` is
/// never capped.
///
/// An unknown asset id, or an asset owned by someone else, is an error —
/// not a rejection.
///
/// A successful apply is the sole trigger for any downstream notification;
/// nothing fires on rejection.
pub async fn classify(
    store: &dyn CatalogStore,
    owner_id: &str,
    asset_id: &str,
    target: Classification,
) -> Result<ClassifyOutcome> {
    let record = store
        .get_record(asset_id)
        .await?
        .ok_or_else(|| anyhow!("no catalog record with id '{}'", asset_id))?;

    if record.owner_id != owner_id {
        bail!("asset '{}' does not belong to owner '{}'", asset_id, owner_id);
    }

    if target == Classification::Selected && record.classification != Some(Classification::Selected)
    {
        let limit = selection_limit(store, owner_id).await?;
        let count = store.selected_count(owner_id).await?;
        if count >= limit {
            return Ok(ClassifyOutcome::Rejected {
                reason: RejectReason::LimitReached { limit },
            });
        }
    }

    store.set_classification(asset_id, target).await?;
    Ok(ClassifyOutcome::Applied {
        classification: target,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CatalogUpsert;
    use crate::store::MemoryCatalog;

    async fn seed(store: &MemoryCatalog, owner: &str, ids: &[&str]) {
        for id in ids {
            store
                .merge_descriptive(&CatalogUpsert {
                    id: id.to_string(),
                    owner_id: owner.to_string(),
                    path: "R".to_string(),
                    source_folder_id: "r".to_string(),
                    display_url: String::new(),
                    thumbnail_url: String::new(),
                    discovered_at: 0,
                })
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn cap_rejects_third_selection() {
        let store = MemoryCatalog::new();
        seed(&store, "u1", &["a1", "a2", "a3"]).await;
        store.merge_profile("u1", Some(2), None).await.unwrap();

        let first = classify(&store, "u1", "a1", Classification::Selected)
            .await
            .unwrap();
        let second = classify(&store, "u1", "a2", Classification::Selected)
            .await
            .unwrap();
        let third = classify(&store, "u1", "a3", Classification::Selected)
            .await
            .unwrap();

        assert!(matches!(first, ClassifyOutcome::Applied { .. }));
        assert!(matches!(second, ClassifyOutcome::Applied { .. }));
        assert_eq!(
            third,
            ClassifyOutcome::Rejected {
                reason: RejectReason::LimitReached { limit: 2 }
            }
        );
        // Rejection left the catalog unmodified
        assert_eq!(store.get_record("a3").await.unwrap().unwrap().classification, None);
        assert_eq!(store.selected_count("u1").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn reselect_at_cap_is_a_noop_accept() {
        let store = MemoryCatalog::new();
        seed(&store, "u1", &["a1", "a2"]).await;
        store.merge_profile("u1", Some(2), None).await.unwrap();
        classify(&store, "u1", "a1", Classification::Selected).await.unwrap();
        classify(&store, "u1", "a2", Classification::Selected).await.unwrap();

        let outcome = classify(&store, "u1", "a1", Classification::Selected)
            .await
            .unwrap();
        assert!(matches!(outcome, ClassifyOutcome::Applied { .. }));
    }

    #[tokio::test]
    async fn later_is_never_capped() {
        let store = MemoryCatalog::new();
        seed(&store, "u1", &["a1", "a2", "a3"]).await;
        store.merge_profile("u1", Some(0), None).await.unwrap();

        for id in ["a1", "a2", "a3"] {
            let outcome = classify(&store, "u1", id, Classification::Later)
                .await
                .unwrap();
            assert!(matches!(outcome, ClassifyOutcome::Applied { .. }));
        }
    }

    #[tokio::test]
    async fn later_to_selected_frees_and_takes_headroom() {
        let store = MemoryCatalog::new();
        seed(&store, "u1", &["a1", "a2"]).await;
        store.merge_profile("u1", Some(1), None).await.unwrap();

        classify(&store, "u1", "a1", Classification::Selected).await.unwrap();
        // Demote a1, then a2 fits under the cap
        classify(&store, "u1", "a1", Classification::Later).await.unwrap();
        let outcome = classify(&store, "u1", "a2", Classification::Selected)
            .await
            .unwrap();
        assert!(matches!(outcome, ClassifyOutcome::Applied { .. }));

        let a1 = store.get_record("a1").await.unwrap().unwrap();
        assert_eq!(a1.classification, Some(Classification::Later));
    }

    #[tokio::test]
    async fn unknown_asset_is_an_error_not_a_rejection() {
        let store = MemoryCatalog::new();
        let err = classify(&store, "u1", "ghost", Classification::Selected)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("ghost"));
    }

    #[tokio::test]
    async fn foreign_asset_is_an_error() {
        let store = MemoryCatalog::new();
        seed(&store, "u2", &["a1"]).await;
        let err = classify(&store, "u1", "a1", Classification::Later)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("does not belong"));
    }

    #[tokio::test]
    async fn default_limit_applies_without_profile() {
        let store = MemoryCatalog::new();
        assert_eq!(selection_limit(&store, "u1").await.unwrap(), 150);
    }
}
