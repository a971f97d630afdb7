//! snowguard-dash library - RBAC metadata dashboard service
//!
//! Serves the single-page UI and the JSON/CSV API over one in-memory
//! session: the metadata table, the audit log and the source status loaded
//! at startup.

use std::sync::Arc;

use axum::Router;
use snowguard_common::Session;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod pagination;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Session tables; handlers that append take the write lock
    pub session: Arc<RwLock<Session>>,
}

impl AppState {
    /// Create new application state
    pub fn new(session: Session) -> Self {
        Self {
            session: Arc::new(RwLock::new(session)),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};

    let metadata = Router::new()
        .route("/api/metadata", get(api::list_metadata))
        .route("/api/metadata/export.csv", get(api::export_metadata))
        .route("/api/metadata/by-role", get(api::metadata_by_role))
        .route("/api/metadata/by-database", get(api::metadata_by_database));

    let permissions = Router::new()
        .route("/api/permissions", post(api::add_permission))
        .route("/api/permissions/template.csv", get(api::download_template))
        .route("/api/permissions/bulk/validate", post(api::validate_upload))
        .route("/api/permissions/bulk/errors.csv", post(api::upload_error_report))
        .route("/api/permissions/bulk/import", post(api::import_upload));

    let audit = Router::new()
        .route("/api/audit", get(api::list_audit))
        .route("/api/audit/export.csv", get(api::export_audit));

    let public = Router::new()
        .route("/", get(api::serve_index))
        .route("/static/app.js", get(api::serve_app_js))
        .route("/api/buildinfo", get(api::get_build_info))
        .route("/api/source", get(api::get_source_status))
        .route("/api/dashboard", get(api::get_dashboard))
        .route("/api/dry-run", post(api::run_dry_run))
        .merge(api::health_routes());

    Router::new()
        .merge(metadata)
        .merge(permissions)
        .merge(audit)
        .merge(public)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
