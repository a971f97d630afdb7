//! Source status endpoint
//!
//! Tells the page whether it is looking at warehouse data or the sample set.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct SourceResponse {
    pub available: bool,
    pub error: String,
    /// Informational banner, present only when showing sample data
    pub banner: Option<String>,
}

/// GET /api/source
pub async fn get_source_status(State(state): State<AppState>) -> Json<SourceResponse> {
    let session = state.session.read().await;
    let source = &session.source;
    Json(SourceResponse {
        available: source.available,
        error: source.error.clone(),
        banner: source.banner().map(str::to_string),
    })
}
