//! RBAC metadata and audit log models
//!
//! Column names follow the warehouse tables `audit.adw_rbac_metadata` and
//! `audit.adw_rbac_audit_log` so that exports round-trip with the warehouse.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Privilege granted on a table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PermissionType {
    Select,
    Insert,
    Update,
    Delete,
    All,
}

impl PermissionType {
    /// Every accepted permission type, in display order
    pub const VALUES: [PermissionType; 5] = [
        PermissionType::Select,
        PermissionType::Insert,
        PermissionType::Update,
        PermissionType::Delete,
        PermissionType::All,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionType::Select => "SELECT",
            PermissionType::Insert => "INSERT",
            PermissionType::Update => "UPDATE",
            PermissionType::Delete => "DELETE",
            PermissionType::All => "ALL",
        }
    }

    /// `[SELECT, INSERT, UPDATE, DELETE, ALL]`, used in validation messages
    pub fn allowed_list() -> String {
        let names: Vec<&str> = Self::VALUES.iter().map(|p| p.as_str()).collect();
        format!("[{}]", names.join(", "))
    }
}

impl fmt::Display for PermissionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PermissionType {
    type Err = String;

    /// Case-insensitive; surrounding whitespace ignored
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        Self::VALUES
            .iter()
            .copied()
            .find(|p| p.as_str() == upper)
            .ok_or_else(|| s.to_string())
    }
}

/// Record status code (`record_status_cd`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordStatus {
    /// Active
    A,
    /// Inactive
    I,
}

impl RecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordStatus::A => "A",
            RecordStatus::I => "I",
        }
    }
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "A" => Ok(RecordStatus::A),
            "I" => Ok(RecordStatus::I),
            _ => Err(s.to_string()),
        }
    }
}

/// One row of RBAC metadata: a grant intent with an effective-date window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PermissionRecord {
    pub rbac_id: i64,
    pub database_name: String,
    pub schema_name: String,
    pub table_name: String,
    pub role_name: String,
    pub permission_type: PermissionType,
    pub effective_start_date: NaiveDate,
    /// `None` means the grant never expires
    pub effective_end_date: Option<NaiveDate>,
    pub description: String,
    pub record_status_cd: RecordStatus,
    pub record_created_by: Option<String>,
    pub record_create_ts: Option<DateTime<Utc>>,
    pub record_updated_by: Option<String>,
    pub record_updated_ts: Option<DateTime<Utc>>,
}

impl PermissionRecord {
    /// Active iff status A, started on or before today, and not yet ended.
    ///
    /// Dates are compared at day granularity: a grant ending on `2025-12-31`
    /// is still active throughout that day.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        let today = now.date_naive();
        self.record_status_cd == RecordStatus::A
            && self.effective_start_date <= today
            && self.effective_end_date.map_or(true, |end| end >= today)
    }

    /// Status A but the end date is already behind `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.record_status_cd == RecordStatus::A
            && self
                .effective_end_date
                .is_some_and(|end| end < now.date_naive())
    }

    /// Fully qualified `DB.SCHEMA.TABLE` name
    pub fn object_name(&self) -> String {
        format!("{}.{}.{}", self.database_name, self.schema_name, self.table_name)
    }
}

/// Audit log operation type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationType {
    Grant,
    Revoke,
    DryRun,
}

impl OperationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationType::Grant => "GRANT",
            OperationType::Revoke => "REVOKE",
            OperationType::DryRun => "DRY_RUN",
        }
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "GRANT" => Ok(OperationType::Grant),
            "REVOKE" => Ok(OperationType::Revoke),
            "DRY_RUN" => Ok(OperationType::DryRun),
            _ => Err(s.to_string()),
        }
    }
}

/// Outcome of an executed (or simulated) statement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ExecutionStatus {
    Success,
    Failed,
}

impl ExecutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionStatus::Success => "SUCCESS",
            ExecutionStatus::Failed => "FAILED",
        }
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExecutionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "SUCCESS" => Ok(ExecutionStatus::Success),
            "FAILED" => Ok(ExecutionStatus::Failed),
            _ => Err(s.to_string()),
        }
    }
}

/// One attempted or simulated grant/revoke
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub log_id: i64,
    pub operation_type: OperationType,
    pub database_name: String,
    pub schema_name: String,
    pub table_name: String,
    pub role_name: String,
    pub permission_type: PermissionType,
    pub sql_statement: String,
    pub execution_status: ExecutionStatus,
    pub error_message: Option<String>,
    pub execution_time: DateTime<Utc>,
    pub record_status_cd: RecordStatus,
    pub record_created_by: Option<String>,
    pub record_create_ts: Option<DateTime<Utc>>,
    pub record_updated_by: Option<String>,
    pub record_updated_ts: Option<DateTime<Utc>>,
}
