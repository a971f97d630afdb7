//! Audit trail API: filtered entries with stats, and CSV export

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use snowguard_common::csv_io;
use snowguard_common::models::AuditLogEntry;
use snowguard_common::summary::{audit_stats, AuditFilter, AuditStats, TimeRange};
use snowguard_common::time::now;

use super::{csv_attachment, split_list};
use crate::AppState;

/// Query parameters for the audit trail
///
/// `operation` and `status` take comma-separated values; omitted means all.
#[derive(Debug, Default, Deserialize)]
pub struct AuditQuery {
    pub operation: Option<String>,
    pub status: Option<String>,
    #[serde(default)]
    pub range: TimeRange,
}

impl AuditQuery {
    fn filter(&self) -> Result<AuditFilter, AuditError> {
        let operation_types = split_list(self.operation.as_deref())
            .into_iter()
            .map(|s| s.parse().map_err(AuditError::InvalidOperation))
            .collect::<Result<_, _>>()?;
        let statuses = split_list(self.status.as_deref())
            .into_iter()
            .map(|s| s.parse().map_err(AuditError::InvalidStatus))
            .collect::<Result<_, _>>()?;
        Ok(AuditFilter {
            operation_types,
            statuses,
            range: self.range,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct AuditResponse {
    /// Newest first
    pub entries: Vec<AuditLogEntry>,
    pub stats: AuditStats,
}

/// GET /api/audit
pub async fn list_audit(
    State(state): State<AppState>,
    Query(query): Query<AuditQuery>,
) -> Result<Json<AuditResponse>, AuditError> {
    let filter = query.filter()?;
    let session = state.session.read().await;
    let matching = filter.apply(session.audit_log.entries(), now());

    Ok(Json(AuditResponse {
        stats: audit_stats(&matching),
        entries: matching.into_iter().cloned().collect(),
    }))
}

/// GET /api/audit/export.csv
pub async fn export_audit(
    State(state): State<AppState>,
    Query(query): Query<AuditQuery>,
) -> Result<Response, AuditError> {
    let filter = query.filter()?;
    let session = state.session.read().await;
    let matching = filter.apply(session.audit_log.entries(), now());

    let body = csv_io::export_audit_log(matching).map_err(|e| AuditError::Export(e.to_string()))?;
    Ok(csv_attachment("rbac_audit_log.csv", body))
}

/// Audit API errors
#[derive(Debug)]
pub enum AuditError {
    InvalidOperation(String),
    InvalidStatus(String),
    Export(String),
}

impl IntoResponse for AuditError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuditError::InvalidOperation(value) => (
                StatusCode::BAD_REQUEST,
                format!("Invalid operation type: {} (expected GRANT, REVOKE or DRY_RUN)", value),
            ),
            AuditError::InvalidStatus(value) => (
                StatusCode::BAD_REQUEST,
                format!("Invalid execution status: {} (expected SUCCESS or FAILED)", value),
            ),
            AuditError::Export(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, format!("Export failed: {}", msg))
            }
        };

        let body = Json(json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snowguard_common::models::{ExecutionStatus, OperationType};

    #[test]
    fn test_filter_parses_lists() {
        let query = AuditQuery {
            operation: Some("grant,dry_run".to_string()),
            status: Some("SUCCESS".to_string()),
            range: TimeRange::All,
        };
        let filter = query.filter().unwrap();
        assert_eq!(filter.operation_types, vec![OperationType::Grant, OperationType::DryRun]);
        assert_eq!(filter.statuses, vec![ExecutionStatus::Success]);
        assert_eq!(filter.range, TimeRange::All);
    }

    #[test]
    fn test_unknown_operation_rejected() {
        let query = AuditQuery {
            operation: Some("DROP".to_string()),
            ..Default::default()
        };
        assert!(matches!(query.filter(), Err(AuditError::InvalidOperation(_))));
    }
}
