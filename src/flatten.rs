//! Folder tree flattening.
//!
//! Converts a discovered [`FolderNode`] tree into a flat, ordered list of
//! [`AssetGroup`]s. Pure and deterministic: re-flattening an identical tree
//! yields an identical, order-stable list.

use crate::models::{AssetGroup, FolderNode};

/// Flatten a folder tree into asset groups, depth-first pre-order.
///
/// A folder's own group (emitted only when it has direct assets) precedes
/// its descendants' groups; children are visited in discovery order. A
/// folder with no direct assets still contributes its descendants' groups.
pub fn flatten(root: &FolderNode) -> Vec<AssetGroup> {
    let mut groups = Vec::new();
    flatten_into(root, "", &mut groups);
    groups
}

fn flatten_into(node: &FolderNode, parent_path: &str, out: &mut Vec<AssetGroup>) {
    let path = if parent_path.is_empty() {
        node.name.clone()
    } else {
        format!("{}/{}", parent_path, node.name)
    };

    if !node.asset_ids.is_empty() {
        out.push(AssetGroup {
            path: path.clone(),
            source_folder_id: node.id.clone(),
            asset_ids: node.asset_ids.clone(),
        });
    }

    for child in &node.children {
        flatten_into(child, &path, out);
    }
}
