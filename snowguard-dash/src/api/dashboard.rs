//! Dashboard overview endpoint

use axum::{extract::State, Json};
use serde::Serialize;
use snowguard_common::models::AuditLogEntry;
use snowguard_common::summary::{self, DashboardMetrics, GroupCount};
use snowguard_common::time::now;

use crate::AppState;

/// Entries shown in the activity table
const RECENT_ACTIVITY_LIMIT: usize = 10;
/// Entries shown on the operations timeline
const RECENT_OPERATIONS_LIMIT: usize = 7;

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub metrics: DashboardMetrics,
    pub by_role: Vec<GroupCount>,
    pub by_database: Vec<GroupCount>,
    pub by_permission_type: Vec<GroupCount>,
    pub recent_activity: Vec<AuditLogEntry>,
    pub recent_operations: Vec<AuditLogEntry>,
}

/// GET /api/dashboard
pub async fn get_dashboard(State(state): State<AppState>) -> Json<DashboardResponse> {
    let session = state.session.read().await;
    let metadata = session.metadata.records();
    let audit = session.audit_log.entries();

    let recent = summary::recent_activity(audit, RECENT_ACTIVITY_LIMIT);
    let recent_operations = recent
        .iter()
        .take(RECENT_OPERATIONS_LIMIT)
        .map(|e| (*e).clone())
        .collect();

    Json(DashboardResponse {
        metrics: summary::dashboard_metrics(metadata, audit, now()),
        by_role: summary::count_by(metadata, |r| r.role_name.clone()),
        by_database: summary::count_by(metadata, |r| r.database_name.clone()),
        by_permission_type: summary::count_by(metadata, |r| r.permission_type.to_string()),
        recent_activity: recent.into_iter().cloned().collect(),
        recent_operations,
    })
}
