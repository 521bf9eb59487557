use anyhow::Result;
use sqlx::SqlitePool;

pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    // Catalog of discovered assets. Primary key is the provider's stable
    // asset id; classification is owned by the selection path and is never
    // written by reconciliation.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS catalog (
            id TEXT PRIMARY KEY,
            owner_id TEXT NOT NULL,
            path TEXT NOT NULL,
            source_folder_id TEXT NOT NULL,
            display_url TEXT NOT NULL,
            thumbnail_url TEXT NOT NULL,
            discovered_at INTEGER NOT NULL,
            classification TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Per-user profiles
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS profiles (
            id TEXT PRIMARY KEY,
            selection_limit INTEGER NOT NULL DEFAULT 150,
            root_folder_id TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    // One resume cursor per user
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS resume_state (
            owner_id TEXT PRIMARY KEY,
            last_index INTEGER NOT NULL DEFAULT 0,
            last_asset_id TEXT,
            updated_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Create indexes
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_catalog_owner_id ON catalog(owner_id)")
        .execute(pool)
        .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_catalog_owner_classification \
         ON catalog(owner_id, classification)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
