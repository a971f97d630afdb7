//! Dry-run planner
//!
//! Works out which grants and revokes the metadata implies at `now` and logs
//! each statement to the audit log as a `DRY_RUN` entry. Nothing is sent to
//! the warehouse.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::models::{
    AuditLogEntry, ExecutionStatus, OperationType, PermissionRecord, RecordStatus,
};
use crate::store::Session;

/// Actor recorded on dry-run audit entries
pub const DRY_RUN_ACTOR: &str = "DRY_RUN";

/// Statement that would be executed for one record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedStatement {
    pub rbac_id: i64,
    pub action: OperationType,
    pub sql_statement: String,
}

/// Report returned to the settings page
#[derive(Debug, Clone, Serialize)]
pub struct DryRunReport {
    pub grants: usize,
    pub revokes: usize,
    pub statements: Vec<PlannedStatement>,
    /// Audit log identifiers of the entries written for this run
    pub logged_ids: Vec<i64>,
}

/// `GRANT <perm> ON TABLE <db>.<schema>.<table> TO ROLE <role>`
pub fn grant_sql(r: &PermissionRecord) -> String {
    format!(
        "GRANT {} ON TABLE {} TO ROLE {}",
        r.permission_type,
        r.object_name(),
        r.role_name
    )
}

/// `REVOKE <perm> ON TABLE <db>.<schema>.<table> FROM ROLE <role>`
pub fn revoke_sql(r: &PermissionRecord) -> String {
    format!(
        "REVOKE {} ON TABLE {} FROM ROLE {}",
        r.permission_type,
        r.object_name(),
        r.role_name
    )
}

/// Grants for active records, revokes for status-A records past their end date
pub fn plan(metadata: &[PermissionRecord], now: DateTime<Utc>) -> Vec<PlannedStatement> {
    planned(metadata, now).into_iter().map(|(_, p)| p).collect()
}

fn planned(
    metadata: &[PermissionRecord],
    now: DateTime<Utc>,
) -> Vec<(&PermissionRecord, PlannedStatement)> {
    metadata
        .iter()
        .filter_map(|r| {
            let (action, sql_statement) = if r.is_active_at(now) {
                (OperationType::Grant, grant_sql(r))
            } else if r.is_expired_at(now) {
                (OperationType::Revoke, revoke_sql(r))
            } else {
                return None;
            };
            Some((
                r,
                PlannedStatement {
                    rbac_id: r.rbac_id,
                    action,
                    sql_statement,
                },
            ))
        })
        .collect()
}

/// Plan against the session metadata and append one audit entry per statement
pub fn run(session: &mut Session, now: DateTime<Utc>) -> DryRunReport {
    let planned = planned(session.metadata.records(), now);
    let first_id = session.audit_log.next_id();

    let entries: Vec<AuditLogEntry> = planned
        .iter()
        .zip(first_id..)
        .map(|((r, stmt), log_id)| AuditLogEntry {
            log_id,
            operation_type: OperationType::DryRun,
            database_name: r.database_name.clone(),
            schema_name: r.schema_name.clone(),
            table_name: r.table_name.clone(),
            role_name: r.role_name.clone(),
            permission_type: r.permission_type,
            sql_statement: stmt.sql_statement.clone(),
            execution_status: ExecutionStatus::Success,
            error_message: None,
            execution_time: now,
            record_status_cd: RecordStatus::A,
            record_created_by: Some(DRY_RUN_ACTOR.to_string()),
            record_create_ts: Some(now),
            record_updated_by: Some(DRY_RUN_ACTOR.to_string()),
            record_updated_ts: Some(now),
        })
        .collect();
    let statements: Vec<PlannedStatement> = planned.into_iter().map(|(_, p)| p).collect();

    let logged_ids = entries.iter().map(|e| e.log_id).collect();
    session.audit_log.append(entries);

    let grants = statements
        .iter()
        .filter(|s| s.action == OperationType::Grant)
        .count();
    let revokes = statements.len() - grants;
    info!(grants, revokes, "Dry run logged");

    DryRunReport {
        grants,
        revokes,
        statements,
        logged_ids,
    }
}
