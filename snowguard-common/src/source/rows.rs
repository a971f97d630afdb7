//! Decoding warehouse result sets into typed rows
//!
//! The SQL API returns every cell as a string (or null), so each column is
//! parsed here. Rows that cannot be decoded are skipped with a warning rather
//! than failing the whole load.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use tracing::warn;

use super::SourceError;
use crate::models::{AuditLogEntry, PermissionRecord, RecordStatus};
use crate::time::{parse_timestamp, parse_warehouse_date};

/// Column list of `audit.adw_rbac_metadata`
pub const METADATA_QUERY: &str = "SELECT
    rbac_id,
    database_name,
    schema_name,
    table_name,
    role_name,
    permission_type,
    effective_start_date,
    effective_end_date,
    description,
    record_status_cd,
    record_created_by,
    record_create_ts,
    record_updated_by,
    record_updated_ts
FROM audit.adw_rbac_metadata";

/// Column list of `audit.adw_rbac_audit_log`
pub const AUDIT_LOG_QUERY: &str = "SELECT
    log_id,
    operation_type,
    database_name,
    schema_name,
    table_name,
    role_name,
    permission_type,
    sql_statement,
    execution_status,
    error_message,
    execution_time,
    record_status_cd,
    record_created_by,
    record_create_ts,
    record_updated_by,
    record_updated_ts
FROM audit.adw_rbac_audit_log";

/// Raw result set: lower-cased column names and nullable text cells
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl RowSet {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Option<String>>>) -> Self {
        Self {
            columns: columns.into_iter().map(|c| c.to_lowercase()).collect(),
            rows,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn row(&self, index: usize) -> Row<'_> {
        Row { set: self, index }
    }
}

struct Row<'a> {
    set: &'a RowSet,
    index: usize,
}

impl Row<'_> {
    fn text(&self, column: &str) -> Option<&str> {
        let pos = self.set.columns.iter().position(|c| c == column)?;
        self.set.rows[self.index]
            .get(pos)?
            .as_deref()
            .filter(|v| !v.is_empty())
    }

    fn required(&self, column: &str) -> Result<&str, String> {
        self.text(column).ok_or_else(|| format!("{column} is null"))
    }

    fn string(&self, column: &str) -> String {
        self.text(column).unwrap_or_default().to_string()
    }

    fn id(&self, column: &str) -> Result<i64, String> {
        let raw = self.required(column)?;
        // NUMBER columns may arrive as "6" or "6.0"
        raw.parse::<i64>()
            .or_else(|_| raw.parse::<f64>().map(|f| f as i64))
            .map_err(|_| format!("{column} is not a number: {raw}"))
    }

    fn parsed<T: FromStr>(&self, column: &str) -> Result<T, String> {
        let raw = self.required(column)?;
        raw.parse::<T>()
            .map_err(|_| format!("{column} has unexpected value: {raw}"))
    }

    fn date(&self, column: &str) -> Result<NaiveDate, String> {
        let raw = self.required(column)?;
        parse_warehouse_date(raw).ok_or_else(|| format!("{column} is not a date: {raw}"))
    }

    fn optional_date(&self, column: &str) -> Option<NaiveDate> {
        self.text(column).and_then(parse_warehouse_date)
    }

    fn optional_timestamp(&self, column: &str) -> Option<DateTime<Utc>> {
        self.text(column).and_then(parse_timestamp)
    }

    fn status(&self) -> RecordStatus {
        self.text("record_status_cd")
            .and_then(|s| s.parse().ok())
            .unwrap_or(RecordStatus::A)
    }
}

fn decode_all<T>(
    set: &RowSet,
    table: &'static str,
    decode: impl Fn(&Row<'_>) -> Result<T, String>,
) -> Result<Vec<T>, SourceError> {
    if set.is_empty() {
        return Err(SourceError::Empty(table));
    }

    let mut out = Vec::with_capacity(set.rows.len());
    for index in 0..set.rows.len() {
        match decode(&set.row(index)) {
            Ok(row) => out.push(row),
            Err(reason) => warn!(table, index, %reason, "Skipping undecodable warehouse row"),
        }
    }

    if out.is_empty() {
        return Err(SourceError::Parse(format!("no decodable rows in {table}")));
    }
    Ok(out)
}

/// Decode a metadata result set
pub fn decode_metadata(set: &RowSet) -> Result<Vec<PermissionRecord>, SourceError> {
    decode_all(set, "metadata", |row| {
        Ok(PermissionRecord {
            rbac_id: row.id("rbac_id")?,
            database_name: row.string("database_name"),
            schema_name: row.string("schema_name"),
            table_name: row.string("table_name"),
            role_name: row.string("role_name"),
            permission_type: row.parsed("permission_type")?,
            effective_start_date: row.date("effective_start_date")?,
            effective_end_date: row.optional_date("effective_end_date"),
            description: row.string("description"),
            record_status_cd: row.status(),
            record_created_by: row.text("record_created_by").map(str::to_string),
            record_create_ts: row.optional_timestamp("record_create_ts"),
            record_updated_by: row.text("record_updated_by").map(str::to_string),
            record_updated_ts: row.optional_timestamp("record_updated_ts"),
        })
    })
}

/// Decode an audit log result set
pub fn decode_audit_log(set: &RowSet) -> Result<Vec<AuditLogEntry>, SourceError> {
    decode_all(set, "audit log", |row| {
        let execution_time = row
            .optional_timestamp("execution_time")
            .ok_or_else(|| "execution_time is missing or malformed".to_string())?;
        Ok(AuditLogEntry {
            log_id: row.id("log_id")?,
            operation_type: row.parsed("operation_type")?,
            database_name: row.string("database_name"),
            schema_name: row.string("schema_name"),
            table_name: row.string("table_name"),
            role_name: row.string("role_name"),
            permission_type: row.parsed("permission_type")?,
            sql_statement: row.string("sql_statement"),
            execution_status: row.parsed("execution_status")?,
            error_message: row.text("error_message").map(str::to_string),
            execution_time,
            record_status_cd: row.status(),
            record_created_by: row.text("record_created_by").map(str::to_string),
            record_create_ts: row.optional_timestamp("record_create_ts"),
            record_updated_by: row.text("record_updated_by").map(str::to_string),
            record_updated_ts: row.optional_timestamp("record_updated_ts"),
        })
    })
}
