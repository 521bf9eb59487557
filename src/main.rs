//! # Proofdeck CLI (`pfd`)
//!
//! The `pfd` binary is the operator's interface to Proofdeck. It provides
//! commands for database initialization, provider sync, classification,
//! resume-cursor management, CSV export, and starting the JSON API server.
//!
//! ## Usage
//!
//! ```bash
//! pfd --config ./config/proofdeck.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `pfd init` | Create the SQLite catalog and run schema migrations |
//! | `pfd sync <owner>` | Discover the provider tree and reconcile it into the catalog |
//! | `pfd catalog <owner>` | Print the owner's catalog subset and selected count |
//! | `pfd classify <owner> <asset> <category>` | Run one classification action |
//! | `pfd resume <owner>` | Show or save the owner's resume cursor |
//! | `pfd profile <owner>` | Show or update the owner's profile |
//! | `pfd export <owner> <category>` | CSV export of one classification bucket |
//! | `pfd serve` | Start the JSON HTTP server |

use anyhow::bail;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use proofdeck::models::Classification;
use proofdeck::selection::{ClassifyOutcome, RejectReason};
use proofdeck::sqlite_store::SqliteCatalog;
use proofdeck::store::CatalogStore;
use proofdeck::{config, db, export, migrate, reconcile, resume, selection, server};

/// Proofdeck CLI — a photo-proofing sync and selection engine.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/proofdeck.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "pfd",
    about = "Proofdeck — a photo-proofing sync and selection engine for client galleries",
    version,
    long_about = "Proofdeck discovers a client's folder tree in an external storage provider, \
    reconciles the discovered assets into a local catalog without disturbing client-made \
    selections, and enforces a per-client selection cap with resumable navigation."
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/proofdeck.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the catalog database.
    ///
    /// Creates the SQLite file and all required tables (catalog, profiles,
    /// resume_state). This command is idempotent — running it multiple
    /// times is safe.
    Init,

    /// Discover the provider tree and reconcile it into the catalog.
    ///
    /// Walks the owner's root folder, flattens the tree into asset groups,
    /// and merges every discovered asset into the catalog. Previously set
    /// classifications are always preserved; re-running is safe.
    Sync {
        /// Owner whose tree is synced.
        owner: String,

        /// Walk this folder instead of the profile/config root.
        #[arg(long)]
        root_folder: Option<String>,

        /// Dry run — show group and asset counts without writing to the catalog.
        #[arg(long)]
        dry_run: bool,
    },

    /// Print the owner's catalog subset and running selected count.
    Catalog {
        owner: String,
    },

    /// Run one classification action.
    ///
    /// Marking an asset `selected` is bounded by the owner's selection
    /// limit; a rejected attempt reports the cap and leaves the catalog
    /// untouched.
    Classify {
        owner: String,
        /// Stable asset id from the storage provider.
        asset: String,
        /// Target category: `selected` or `later`.
        category: String,
    },

    /// Show the saved resume cursor, or save a new position.
    Resume {
        owner: String,

        /// Position index to save.
        #[arg(long)]
        index: Option<i64>,

        /// Asset id to save alongside the index.
        #[arg(long)]
        asset: Option<String>,
    },

    /// Show or update the owner's profile.
    Profile {
        owner: String,

        /// Set the selection cap.
        #[arg(long)]
        limit: Option<i64>,

        /// Set the owner's provider root folder.
        #[arg(long)]
        root_folder: Option<String>,
    },

    /// CSV export of one classification bucket to stdout.
    Export {
        owner: String,
        /// Bucket to export: `selected` or `later`.
        category: String,
    },

    /// Start the JSON HTTP server.
    ///
    /// Binds to the address configured in `[server].bind` and serves the
    /// gallery-facing catalog, classification, resume, and sync endpoints.
    Serve,
}

fn parse_category(s: &str) -> anyhow::Result<Classification> {
    match Classification::parse(s) {
        Some(c) => Ok(c),
        None => bail!("unknown category '{}': must be selected or later", s),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            let pool = db::connect(&cfg).await?;
            migrate::run_migrations(&pool).await?;
            pool.close().await;
            println!("Catalog database initialized successfully.");
        }
        Commands::Sync {
            owner,
            root_folder,
            dry_run,
        } => {
            reconcile::run_sync(&cfg, &owner, root_folder, dry_run).await?;
        }
        Commands::Catalog { owner } => {
            let pool = db::connect(&cfg).await?;
            let store = SqliteCatalog::new(pool.clone());
            let records = store.records_for_owner(&owner).await?;
            let selected = store.selected_count(&owner).await?;
            let limit = selection::selection_limit(&store, &owner).await?;

            for record in &records {
                let mark = match record.classification {
                    Some(c) => c.as_str(),
                    None => "-",
                };
                println!("{:10} {}/{}", mark, record.path, record.id);
            }
            println!("{} assets, {} selected (limit {})", records.len(), selected, limit);
            pool.close().await;
        }
        Commands::Classify {
            owner,
            asset,
            category,
        } => {
            let target = parse_category(&category)?;
            let pool = db::connect(&cfg).await?;
            let store = SqliteCatalog::new(pool.clone());

            match selection::classify(&store, &owner, &asset, target).await? {
                ClassifyOutcome::Applied { classification } => {
                    // Downstream notification fires only on a successful apply.
                    match classification {
                        Classification::Selected => println!("Added to favorites: {}", asset),
                        Classification::Later => println!("Saved for later: {}", asset),
                    }
                }
                ClassifyOutcome::Rejected {
                    reason: RejectReason::LimitReached { limit },
                } => {
                    println!(
                        "Selection limit reached — you can only select up to {} photos.",
                        limit
                    );
                }
            }
            pool.close().await;
        }
        Commands::Resume {
            owner,
            index,
            asset,
        } => {
            let pool = db::connect(&cfg).await?;
            let store = SqliteCatalog::new(pool.clone());

            if index.is_some() || asset.is_some() {
                resume::save_position_best_effort(&store, &owner, index, asset.as_deref()).await;
                println!("ok");
            } else {
                match resume::load_position(&store, &owner).await? {
                    Some(state) => {
                        println!("index: {}", state.last_index);
                        println!("asset: {}", state.last_asset_id.as_deref().unwrap_or("-"));
                        println!("updated_at: {}", state.updated_at);
                    }
                    None => println!("no saved position for {}", owner),
                }
            }
            pool.close().await;
        }
        Commands::Profile {
            owner,
            limit,
            root_folder,
        } => {
            let pool = db::connect(&cfg).await?;
            let store = SqliteCatalog::new(pool.clone());

            if limit.is_some() || root_folder.is_some() {
                store
                    .merge_profile(&owner, limit, root_folder.as_deref())
                    .await?;
            }
            match store.get_profile(&owner).await? {
                Some(profile) => {
                    println!("owner: {}", profile.id);
                    println!("selection_limit: {}", profile.selection_limit);
                    println!(
                        "root_folder_id: {}",
                        profile.root_folder_id.as_deref().unwrap_or("-")
                    );
                }
                None => println!("no profile for {}", owner),
            }
            pool.close().await;
        }
        Commands::Export { owner, category } => {
            let bucket = parse_category(&category)?;
            export::run_export(&cfg, &owner, bucket).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
