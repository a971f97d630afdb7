//! Permission entry API: single add, CSV template, and the bulk upload flow
//! (validate preview, error report, import)

use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use snowguard_common::csv_io;
use snowguard_common::import::{
    add_single, import_batch, validate_batch, AddError, BatchValidation, CandidateRecord,
    ImportOutcome, SingleAddForm,
};
use snowguard_common::time::now;
use tracing::info;

use super::csv_attachment;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct AddResponse {
    pub rbac_id: i64,
    pub message: String,
}

/// POST /api/permissions
pub async fn add_permission(
    State(state): State<AppState>,
    form: Result<Json<SingleAddForm>, JsonRejection>,
) -> Result<(StatusCode, Json<AddResponse>), PermissionError> {
    let Json(form) = form?;
    let mut session = state.session.write().await;
    let rbac_id = add_single(&mut session.metadata, form)?;
    info!(rbac_id, "Permission added");

    Ok((
        StatusCode::CREATED,
        Json(AddResponse {
            rbac_id,
            message: format!("Permission added with ID {}", rbac_id),
        }),
    ))
}

/// GET /api/permissions/template.csv
pub async fn download_template() -> Result<Response, PermissionError> {
    let body = csv_io::template().map_err(|e| PermissionError::Report(e.to_string()))?;
    Ok(csv_attachment("rbac_template.csv", body))
}

/// POST /api/permissions/bulk/validate
///
/// Preview only; the metadata table is not touched.
pub async fn validate_upload(body: Bytes) -> Result<Json<BatchValidation>, PermissionError> {
    let candidates = parse(&body)?;
    Ok(Json(validate_batch(&candidates)))
}

/// POST /api/permissions/bulk/errors.csv
pub async fn upload_error_report(body: Bytes) -> Result<Response, PermissionError> {
    let candidates = parse(&body)?;
    let validation = validate_batch(&candidates);
    let report = csv_io::error_report(&validation.invalid)
        .map_err(|e| PermissionError::Report(e.to_string()))?;
    Ok(csv_attachment("validation_errors.csv", report))
}

/// POST /api/permissions/bulk/import
pub async fn import_upload(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ImportOutcome>, PermissionError> {
    let candidates = parse(&body)?;
    let mut session = state.session.write().await;
    let outcome = import_batch(&mut session.metadata, &candidates, now());
    info!(
        status = ?outcome.status,
        imported = outcome.imported_count,
        rejected = outcome.invalid_rows.len(),
        "Bulk upload processed"
    );
    Ok(Json(outcome))
}

fn parse(body: &[u8]) -> Result<Vec<CandidateRecord>, PermissionError> {
    csv_io::parse_upload(body).map_err(|e| PermissionError::MalformedCsv(e.to_string()))
}

/// Permission API errors
#[derive(Debug)]
pub enum PermissionError {
    Rejected(AddError),
    InvalidForm(StatusCode, String),
    MalformedCsv(String),
    Report(String),
}

impl From<AddError> for PermissionError {
    fn from(e: AddError) -> Self {
        PermissionError::Rejected(e)
    }
}

impl From<JsonRejection> for PermissionError {
    fn from(rejection: JsonRejection) -> Self {
        PermissionError::InvalidForm(rejection.status(), rejection.body_text())
    }
}

impl IntoResponse for PermissionError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            PermissionError::Rejected(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            PermissionError::InvalidForm(status, msg) => (status, msg),
            PermissionError::MalformedCsv(msg) => {
                (StatusCode::BAD_REQUEST, format!("Error reading file: {}", msg))
            }
            PermissionError::Report(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to build CSV: {}", msg),
            ),
        };

        let body = Json(json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}
