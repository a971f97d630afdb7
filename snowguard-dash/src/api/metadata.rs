//! Metadata table API: filtered and paginated listing, CSV export and
//! per-role / per-database summaries

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use snowguard_common::csv_io;
use snowguard_common::models::{PermissionRecord, RecordStatus};
use snowguard_common::summary::{self, DatabaseSummary, MetadataFilter, RoleSummary};

use super::{csv_attachment, split_list};
use crate::pagination::{calculate_pagination, PAGE_SIZE};
use crate::AppState;

/// Query parameters for the metadata view
///
/// `role`, `database` and `status` take comma-separated values. Without a
/// `status` parameter only active-status (`A`) rows are listed; an empty
/// `status=` lists every status.
#[derive(Debug, Default, Deserialize)]
pub struct MetadataQuery {
    pub role: Option<String>,
    pub database: Option<String>,
    pub status: Option<String>,

    /// Page number (1-indexed)
    #[serde(default = "default_page")]
    pub page: usize,
}

fn default_page() -> usize {
    1
}

impl MetadataQuery {
    fn filter(&self) -> Result<MetadataFilter, MetadataError> {
        let statuses = match self.status.as_deref() {
            None => vec![RecordStatus::A],
            Some(value) => split_list(Some(value))
                .into_iter()
                .map(|s| s.parse().map_err(MetadataError::InvalidStatus))
                .collect::<Result<_, _>>()?,
        };
        Ok(MetadataFilter {
            roles: owned(split_list(self.role.as_deref())),
            databases: owned(split_list(self.database.as_deref())),
            statuses,
        })
    }
}

fn owned(values: Vec<&str>) -> Vec<String> {
    values.into_iter().map(str::to_string).collect()
}

/// One page of the filtered metadata table
#[derive(Debug, Serialize)]
pub struct MetadataPage {
    pub total_rows: usize,
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub rows: Vec<PermissionRecord>,
}

/// GET /api/metadata
pub async fn list_metadata(
    State(state): State<AppState>,
    Query(query): Query<MetadataQuery>,
) -> Result<Json<MetadataPage>, MetadataError> {
    let filter = query.filter()?;
    let session = state.session.read().await;
    let matching = filter.apply(session.metadata.records());

    let pagination = calculate_pagination(matching.len(), query.page);
    let rows = pagination.slice(&matching).iter().map(|r| (*r).clone()).collect();

    Ok(Json(MetadataPage {
        total_rows: matching.len(),
        page: pagination.page,
        page_size: PAGE_SIZE,
        total_pages: pagination.total_pages,
        rows,
    }))
}

/// GET /api/metadata/export.csv
pub async fn export_metadata(
    State(state): State<AppState>,
    Query(query): Query<MetadataQuery>,
) -> Result<Response, MetadataError> {
    let filter = query.filter()?;
    let session = state.session.read().await;
    let matching = filter.apply(session.metadata.records());

    let body = csv_io::export_metadata(matching)
        .map_err(|e| MetadataError::Export(e.to_string()))?;
    Ok(csv_attachment("rbac_metadata.csv", body))
}

/// GET /api/metadata/by-role
pub async fn metadata_by_role(State(state): State<AppState>) -> Json<Vec<RoleSummary>> {
    let session = state.session.read().await;
    Json(summary::role_summary(session.metadata.records()))
}

/// GET /api/metadata/by-database
pub async fn metadata_by_database(State(state): State<AppState>) -> Json<Vec<DatabaseSummary>> {
    let session = state.session.read().await;
    Json(summary::database_summary(session.metadata.records()))
}

/// Metadata API errors
#[derive(Debug)]
pub enum MetadataError {
    InvalidStatus(String),
    Export(String),
}

impl IntoResponse for MetadataError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            MetadataError::InvalidStatus(value) => (
                StatusCode::BAD_REQUEST,
                format!("Invalid status: {} (expected A or I)", value),
            ),
            MetadataError::Export(msg) => {
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

    #[test]
    fn test_status_defaults_to_active() {
        let filter = MetadataQuery::default().filter().unwrap();
        assert_eq!(filter.statuses, vec![RecordStatus::A]);
        assert!(filter.roles.is_empty());
    }

    #[test]
    fn test_empty_status_means_any() {
        let query = MetadataQuery {
            status: Some(String::new()),
            ..Default::default()
        };
        assert!(query.filter().unwrap().statuses.is_empty());
    }

    #[test]
    fn test_multi_value_filters() {
        let query = MetadataQuery {
            role: Some("EXEC_ROLE,DEV_TEAM_ROLE".to_string()),
            status: Some("a, I".to_string()),
            ..Default::default()
        };
        let filter = query.filter().unwrap();
        assert_eq!(filter.roles, vec!["EXEC_ROLE", "DEV_TEAM_ROLE"]);
        assert_eq!(filter.statuses, vec![RecordStatus::A, RecordStatus::I]);
    }

    #[test]
    fn test_unknown_status_rejected() {
        let query = MetadataQuery {
            status: Some("X".to_string()),
            ..Default::default()
        };
        assert!(matches!(query.filter(), Err(MetadataError::InvalidStatus(v)) if v == "X"));
    }
}
