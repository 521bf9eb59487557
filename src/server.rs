//! JSON HTTP API for the gallery client.
//!
//! Exposes the catalog subset, classification actions, resume cursor, and
//! the administrative sync trigger over a small JSON API.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Health check (returns version) |
//! | `GET`  | `/catalog/{owner}` | Owner's records, selected count, and cap |
//! | `POST` | `/catalog/{owner}/classify` | Run one classification action |
//! | `GET`  | `/resume/{owner}` | Saved position (`state: null` when absent) |
//! | `PUT`  | `/resume/{owner}` | Best-effort position save |
//! | `POST` | `/sync/{owner}` | Discover and reconcile the owner's tree |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "limit_reached", "message": "selection limit of 150 reached" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404), `limit_reached`
//! (409), `provider_unavailable` (502), `internal` (500). A cap rejection
//! is the expected outcome of a full gallery, hence its own code — clients
//! must show it distinctly from transient failures.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted to support the
//! browser-based gallery client.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;
use crate::db;
use crate::flatten;
use crate::models::{CatalogRecord, Classification, ResumeState};
use crate::provider::{DriveProvider, StorageProvider};
use crate::reconcile;
use crate::resume;
use crate::selection::{self, ClassifyOutcome, RejectReason};
use crate::sqlite_store::SqliteCatalog;
use crate::store::CatalogStore;
use crate::walker;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
    store: Arc<dyn CatalogStore>,
    provider: Arc<dyn StorageProvider>,
}

/// Starts the HTTP server.
///
/// Binds to the address configured in `[server].bind` and serves until the
/// process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let pool = db::connect(config).await?;
    let state = AppState {
        config: Arc::new(config.clone()),
        store: Arc::new(SqliteCatalog::new(pool)),
        provider: Arc::new(DriveProvider::new(&config.provider)),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(handle_health))
        .route("/catalog/{owner}", get(handle_catalog))
        .route("/catalog/{owner}/classify", post(handle_classify))
        .route(
            "/resume/{owner}",
            get(handle_resume_load).put(handle_resume_save),
        )
        .route("/sync/{owner}", post(handle_sync))
        .layer(cors)
        .with_state(state);

    let bind_addr = &config.server.bind;
    println!("Proofdeck API listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found".to_string(),
        message: message.into(),
    }
}

fn limit_reached(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::CONFLICT,
        code: "limit_reached".to_string(),
        message: message.into(),
    }
}

fn provider_unavailable(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_GATEWAY,
        code: "provider_unavailable".to_string(),
        message: message.into(),
    }
}

fn internal(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal".to_string(),
        message: message.into(),
    }
}

/// Maps store/selection errors onto HTTP statuses by message shape, so the
/// library layer needs no HTTP-aware error type.
fn classify_store_error(err: anyhow::Error) -> AppError {
    let msg = err.to_string();
    if msg.contains("no catalog record") || msg.contains("does not belong") {
        not_found(msg)
    } else {
        internal(msg)
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ GET /catalog/{owner} ============

#[derive(Serialize)]
struct CatalogResponse {
    records: Vec<CatalogRecord>,
    selected_count: i64,
    selection_limit: i64,
}

async fn handle_catalog(
    State(state): State<AppState>,
    Path(owner): Path<String>,
) -> Result<Json<CatalogResponse>, AppError> {
    let records = state
        .store
        .records_for_owner(&owner)
        .await
        .map_err(|e| internal(e.to_string()))?;
    let selected_count = state
        .store
        .selected_count(&owner)
        .await
        .map_err(|e| internal(e.to_string()))?;
    let selection_limit = selection::selection_limit(state.store.as_ref(), &owner)
        .await
        .map_err(|e| internal(e.to_string()))?;

    Ok(Json(CatalogResponse {
        records,
        selected_count,
        selection_limit,
    }))
}

// ============ POST /catalog/{owner}/classify ============

#[derive(Deserialize)]
struct ClassifyRequest {
    asset_id: String,
    category: String,
}

#[derive(Serialize)]
struct ClassifyResponse {
    classification: Classification,
    selected_count: i64,
}

async fn handle_classify(
    State(state): State<AppState>,
    Path(owner): Path<String>,
    Json(req): Json<ClassifyRequest>,
) -> Result<Json<ClassifyResponse>, AppError> {
    let target = Classification::parse(&req.category).ok_or_else(|| {
        bad_request(format!(
            "unknown category '{}': must be selected or later",
            req.category
        ))
    })?;

    let outcome = selection::classify(state.store.as_ref(), &owner, &req.asset_id, target)
        .await
        .map_err(classify_store_error)?;

    match outcome {
        ClassifyOutcome::Applied { classification } => {
            let selected_count = state
                .store
                .selected_count(&owner)
                .await
                .map_err(|e| internal(e.to_string()))?;
            Ok(Json(ClassifyResponse {
                classification,
                selected_count,
            }))
        }
        ClassifyOutcome::Rejected {
            reason: RejectReason::LimitReached { limit },
        } => Err(limit_reached(format!(
            "selection limit of {} reached",
            limit
        ))),
    }
}

// ============ GET/PUT /resume/{owner} ============

#[derive(Serialize)]
struct ResumeResponse {
    state: Option<ResumeState>,
}

async fn handle_resume_load(
    State(state): State<AppState>,
    Path(owner): Path<String>,
) -> Result<Json<ResumeResponse>, AppError> {
    // Absent is the normal first-session condition, not a 404.
    let saved = resume::load_position(state.store.as_ref(), &owner)
        .await
        .map_err(|e| internal(e.to_string()))?;
    Ok(Json(ResumeResponse { state: saved }))
}

#[derive(Deserialize)]
struct ResumeSaveRequest {
    last_index: Option<i64>,
    last_asset_id: Option<String>,
}

async fn handle_resume_save(
    State(state): State<AppState>,
    Path(owner): Path<String>,
    Json(req): Json<ResumeSaveRequest>,
) -> StatusCode {
    // Fire-and-forget: failures are logged inside, never surfaced.
    resume::save_position_best_effort(
        state.store.as_ref(),
        &owner,
        req.last_index,
        req.last_asset_id.as_deref(),
    )
    .await;
    StatusCode::NO_CONTENT
}

// ============ POST /sync/{owner} ============

#[derive(Deserialize, Default)]
struct SyncRequest {
    root_folder_id: Option<String>,
}

async fn handle_sync(
    State(state): State<AppState>,
    Path(owner): Path<String>,
    body: Option<Json<SyncRequest>>,
) -> Result<Json<serde_json::Value>, AppError> {
    let req = body.map(|Json(r)| r).unwrap_or_default();

    let root_id = reconcile::resolve_root(
        state.store.as_ref(),
        &state.config,
        &owner,
        req.root_folder_id,
    )
    .await
    .map_err(|e| bad_request(e.to_string()))?;

    let tree = walker::discover(
        state.provider.clone(),
        &root_id,
        &state.config.provider.root_name,
        state.config.sync.max_parallel_requests,
    )
    .await
    .map_err(|e| provider_unavailable(format!("{:#}", e)))?;

    let groups = flatten::flatten(&tree);
    let report = reconcile::reconcile(&state.store, state.provider.as_ref(), &groups, &owner).await;

    Ok(Json(serde_json::json!({
        "synced": report.synced,
        "errors": report.errors,
    })))
}
