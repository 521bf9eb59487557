//! Core data models used throughout Proofdeck.
//!
//! These types represent the folder trees, asset groups, and catalog records
//! that flow through the discovery and reconciliation pipeline, plus the
//! per-user selection and resume state.

use serde::{Deserialize, Serialize};

/// User-assigned category of a catalog asset.
///
/// An unclassified asset is represented as `Option<Classification>::None`;
/// there is no explicit "clear" transition in the selection flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Selected,
    Later,
}

impl Classification {
    /// Stable string form used in SQLite and on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::Selected => "selected",
            Classification::Later => "later",
        }
    }

    /// Parse the stable string form. Returns `None` for anything else.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "selected" => Some(Classification::Selected),
            "later" => Some(Classification::Later),
            _ => None,
        }
    }
}

/// One node of a provider folder tree, built transiently during discovery.
///
/// `asset_ids` holds only image-typed entries; `children` only sub-folders.
/// Never persisted — discarded after flattening.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderNode {
    pub id: String,
    pub name: String,
    pub children: Vec<FolderNode>,
    pub asset_ids: Vec<String>,
}

/// A flattened (path, assets) unit produced from one folder's worth of
/// discovered images. Only folders with at least one direct asset are
/// materialized into a group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetGroup {
    /// `/`-joined chain of ancestor names down to and including this folder.
    pub path: String,
    pub source_folder_id: String,
    pub asset_ids: Vec<String>,
}

/// Persisted per-asset record. Keyed by the provider's stable asset id,
/// which is what makes reconciliation idempotent.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogRecord {
    pub id: String,
    pub owner_id: String,
    pub path: String,
    pub source_folder_id: String,
    pub display_url: String,
    pub thumbnail_url: String,
    /// Unix epoch seconds of the most recent reconciliation that saw this asset.
    pub discovered_at: i64,
    pub classification: Option<Classification>,
}

/// Descriptive fields written by reconciliation.
///
/// Deliberately excludes `classification`: the reconciler's write path and
/// the selection write path are field-disjoint, so neither can clobber the
/// other under concurrent execution.
#[derive(Debug, Clone)]
pub struct CatalogUpsert {
    pub id: String,
    pub owner_id: String,
    pub path: String,
    pub source_folder_id: String,
    pub display_url: String,
    pub thumbnail_url: String,
    pub discovered_at: i64,
}

/// Per-user profile holding the selection cap and optional provider root.
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub id: String,
    /// Upper bound on `classification = selected` records owned by this user.
    pub selection_limit: i64,
    /// Per-user provider root folder; falls back to the configured default.
    pub root_folder_id: Option<String>,
}

/// Last navigation position saved per user. Advisory: losing it only
/// degrades UX, never correctness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResumeState {
    pub owner_id: String,
    pub last_index: i64,
    pub last_asset_id: Option<String>,
    pub updated_at: i64,
}

/// Aggregate counts returned by a reconciliation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub synced: u64,
    pub errors: u64,
}
