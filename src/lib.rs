//! # Proofdeck
//!
//! A photo-proofing sync and selection engine for client galleries.
//!
//! Proofdeck discovers a client's folder tree in an external storage
//! provider, flattens it into addressable asset groups, and reconciles the
//! discovered assets into a SQLite catalog without ever disturbing the
//! classifications clients have already made. Clients mark each photo as
//! `selected` or `later`, bounded by a per-client cap, and can resume a
//! session where they left off.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────────┐   ┌──────────┐
//! │   Provider   │──▶│ Walk → Flatten → │──▶│  SQLite  │
//! │ (Drive REST) │   │    Reconcile     │   │  catalog │
//! └──────────────┘   └──────────────────┘   └────┬─────┘
//!                                                │
//!                           ┌────────────────────┤
//!                           ▼                    ▼
//!                      ┌──────────┐        ┌──────────┐
//!                      │   CLI    │        │   HTTP   │
//!                      │  (pfd)   │        │  (JSON)  │
//!                      └──────────┘        └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! pfd init                            # create the catalog database
//! pfd profile alice --limit 150 --root-folder <id>
//! pfd sync alice                      # discover and reconcile
//! pfd classify alice <asset-id> selected
//! pfd export alice selected           # CSV hand-off
//! pfd serve                           # start the JSON API
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`provider`] | Storage provider seam and Drive REST client |
//! | [`walker`] | Recursive concurrent folder discovery |
//! | [`flatten`] | Folder tree → ordered asset groups |
//! | [`reconcile`] | Idempotent catalog merge |
//! | [`selection`] | Classification state machine with cap |
//! | [`resume`] | Per-user resume cursor |
//! | [`store`] | Storage trait and in-memory backend |
//! | [`sqlite_store`] | SQLite backend |
//! | [`export`] | CSV export of a classification bucket |
//! | [`server`] | JSON HTTP API |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |

pub mod config;
pub mod db;
pub mod export;
pub mod flatten;
pub mod migrate;
pub mod models;
pub mod provider;
pub mod reconcile;
pub mod resume;
pub mod selection;
pub mod server;
pub mod sqlite_store;
pub mod store;
pub mod walker;
