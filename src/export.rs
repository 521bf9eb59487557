//! CSV export of one classification bucket.
//!
//! Produces the studio's hand-off file: the assets a client marked
//! `selected` (or `later`), one quoted row per asset.

use anyhow::Result;
use std::sync::Arc;

use crate::config::Config;
use crate::db;
use crate::models::{CatalogRecord, Classification};
use crate::sqlite_store::SqliteCatalog;
use crate::store::CatalogStore;

/// Render the records matching `category` as CSV.
///
/// Columns: `asset_id,path,display_url,category,discovered_at`. All cells
/// are double-quoted; embedded quotes are doubled per RFC 4180.
pub fn export_csv(records: &[CatalogRecord], category: Classification) -> String {
    let mut lines = vec!["asset_id,path,display_url,category,discovered_at".to_string()];

    for record in records {
        if record.classification != Some(category) {
            continue;
        }
        let cells = [
            record.id.as_str(),
            record.path.as_str(),
            record.display_url.as_str(),
            category.as_str(),
            &record.discovered_at.to_string(),
        ];
        let row = cells
            .iter()
            .map(|cell| format!("\"{}\"", cell.replace('"', "\"\"")))
            .collect::<Vec<_>>()
            .join(",");
        lines.push(row);
    }

    lines.join("\n")
}

/// Print one owner's bucket to stdout, as triggered by `pfd export`.
pub async fn run_export(config: &Config, owner_id: &str, category: Classification) -> Result<()> {
    let pool = db::connect(config).await?;
    let store: Arc<dyn CatalogStore> = Arc::new(SqliteCatalog::new(pool.clone()));

    let records = store.records_for_owner(owner_id).await?;
    println!("{}", export_csv(&records, category));

    pool.close().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, path: &str, classification: Option<Classification>) -> CatalogRecord {
        CatalogRecord {
            id: id.to_string(),
            owner_id: "u1".to_string(),
            path: path.to_string(),
            source_folder_id: "r".to_string(),
            display_url: format!("https://example.com/{}", id),
            thumbnail_url: String::new(),
            discovered_at: 1_700_000_000,
            classification,
        }
    }

    #[test]
    fn exports_only_the_requested_bucket() {
        let records = vec![
            record("a1", "R", Some(Classification::Selected)),
            record("a2", "R", Some(Classification::Later)),
            record("a3", "R/S", Some(Classification::Selected)),
            record("a4", "R/S", None),
        ];

        let csv = export_csv(&records, Classification::Selected);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "asset_id,path,display_url,category,discovered_at");
        assert!(lines[1].starts_with("\"a1\""));
        assert!(lines[2].starts_with("\"a3\""));
        assert!(lines[1].contains("\"selected\""));
    }

    #[test]
    fn embedded_quotes_are_doubled() {
        let records = vec![record("a1", "R/\"best\" shots", Some(Classification::Later))];
        let csv = export_csv(&records, Classification::Later);
        assert!(csv.contains("\"R/\"\"best\"\" shots\""));
    }

    #[test]
    fn empty_bucket_is_header_only() {
        let csv = export_csv(&[], Classification::Selected);
        assert_eq!(csv, "asset_id,path,display_url,category,discovered_at");
    }
}
