//! Embedded sample dataset used when the warehouse is unreachable

use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::models::{
    AuditLogEntry, ExecutionStatus, OperationType, PermissionRecord, PermissionType,
    RecordStatus,
};

const SAMPLE_ACTOR: &str = "ADMIN_USER";

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    // Constant calendar dates below are all valid
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

/// Five sample metadata rows, audit timestamps stamped at `now`
pub fn sample_metadata(now: DateTime<Utc>) -> Vec<PermissionRecord> {
    let rows = [
        ("PROD", "ADS", "T_MBR_DIM", "FIN_ANALYST_ROLE", PermissionType::Select,
         date(2025, 1, 1), None,
         "Read access for Finance analysts to member dimension"),
        ("PROD", "ADS", "T_CLM_FACT", "FIN_ANALYST_ROLE", PermissionType::Select,
         date(2025, 1, 1), None,
         "Read access to claims fact data for Finance team"),
        ("PROD", "REPORTING", "V_SUMMARY", "EXEC_ROLE", PermissionType::Select,
         date(2025, 2, 15), Some(date(2025, 12, 31)),
         "Executive summary reports access until year-end"),
        ("ADW_DEV", "ADS", "T_TEST_DATA", "DEV_TEAM_ROLE", PermissionType::All,
         date(2025, 3, 1), None,
         "Full access for dev team testing"),
        ("ADW_DEV", "REPORTING", "V_DEV_ANALYSIS", "DEV_TEAM_ROLE", PermissionType::All,
         date(2025, 3, 1), None,
         "Full access for dev analytics"),
    ];

    rows.into_iter()
        .enumerate()
        .map(|(i, (db, schema, table, role, perm, start, end, desc))| PermissionRecord {
            rbac_id: i as i64 + 1,
            database_name: db.to_string(),
            schema_name: schema.to_string(),
            table_name: table.to_string(),
            role_name: role.to_string(),
            permission_type: perm,
            effective_start_date: start,
            effective_end_date: end,
            description: desc.to_string(),
            record_status_cd: RecordStatus::A,
            record_created_by: Some(SAMPLE_ACTOR.to_string()),
            record_create_ts: Some(now),
            record_updated_by: Some(SAMPLE_ACTOR.to_string()),
            record_updated_ts: Some(now),
        })
        .collect()
}

/// Four sample audit entries spread over the last five days
pub fn sample_audit_log(now: DateTime<Utc>) -> Vec<AuditLogEntry> {
    let rows = [
        (OperationType::Grant, "ADW_PROD", "ADS", "T_MBR_DIM", "FIN_ANALYST_ROLE",
         PermissionType::Select, Duration::days(5)),
        (OperationType::Grant, "ADW_PROD", "REPORTING", "V_SUMMARY", "EXEC_ROLE",
         PermissionType::Select, Duration::days(3)),
        (OperationType::DryRun, "ADW_DEV", "ADS", "T_TEST_DATA", "DEV_TEAM_ROLE",
         PermissionType::All, Duration::days(1)),
        (OperationType::Revoke, "ADW_PROD", "ADS", "T_ARCHIVED", "OLD_ROLE",
         PermissionType::Select, Duration::hours(2)),
    ];

    rows.into_iter()
        .enumerate()
        .map(|(i, (op, db, schema, table, role, perm, age))| {
            let at = now - age;
            let sql_statement = match op {
                OperationType::Revoke => {
                    format!("REVOKE {perm} ON TABLE {db}.{schema}.{table} FROM ROLE {role}")
                }
                _ => format!("GRANT {perm} ON TABLE {db}.{schema}.{table} TO ROLE {role}"),
            };
            AuditLogEntry {
                log_id: i as i64 + 1,
                operation_type: op,
                database_name: db.to_string(),
                schema_name: schema.to_string(),
                table_name: table.to_string(),
                role_name: role.to_string(),
                permission_type: perm,
                sql_statement,
                execution_status: ExecutionStatus::Success,
                error_message: None,
                execution_time: at,
                record_status_cd: RecordStatus::A,
                record_created_by: Some(SAMPLE_ACTOR.to_string()),
                record_create_ts: Some(at),
                record_updated_by: Some(SAMPLE_ACTOR.to_string()),
                record_updated_ts: Some(at),
            }
        })
        .collect()
}
