//! In-session tables
//!
//! Both tables are loaded once per session and only grow afterwards: the
//! import pipelines append metadata rows and the dry-run planner appends audit
//! entries. Nothing is ever removed, so `max + 1` never hands out an
//! identifier twice.

use serde::Serialize;

use crate::models::{AuditLogEntry, PermissionRecord};

/// Owned RBAC metadata table
#[derive(Debug, Clone, Default)]
pub struct MetadataStore {
    records: Vec<PermissionRecord>,
}

impl MetadataStore {
    pub fn new(records: Vec<PermissionRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[PermissionRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Highest identifier in the table, 0 when empty
    pub fn max_id(&self) -> i64 {
        self.records.iter().map(|r| r.rbac_id).max().unwrap_or(0)
    }

    /// Identifier the next appended row will receive
    pub fn next_id(&self) -> i64 {
        self.max_id() + 1
    }

    /// Append rows after the existing ones, preserving order
    pub(crate) fn append(&mut self, rows: impl IntoIterator<Item = PermissionRecord>) {
        self.records.extend(rows);
    }
}

/// Append-only audit log
#[derive(Debug, Clone, Default)]
pub struct AuditLog {
    entries: Vec<AuditLogEntry>,
}

impl AuditLog {
    pub fn new(entries: Vec<AuditLogEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[AuditLogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn next_id(&self) -> i64 {
        self.entries.iter().map(|e| e.log_id).max().unwrap_or(0) + 1
    }

    pub(crate) fn append(&mut self, entries: impl IntoIterator<Item = AuditLogEntry>) {
        self.entries.extend(entries);
    }
}

/// Where the session tables came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceStatus {
    /// `true` only if both tables were fetched from the warehouse
    pub available: bool,
    /// Accumulated load errors, e.g. `Metadata: ...; AuditLog: ...; `
    pub error: String,
}

impl SourceStatus {
    /// Informational banner shown while running on sample data
    pub fn banner(&self) -> Option<&'static str> {
        if self.available {
            None
        } else {
            Some("Snowflake not configured, displaying dummy data")
        }
    }
}

/// Everything one dashboard session owns
#[derive(Debug, Clone)]
pub struct Session {
    pub metadata: MetadataStore,
    pub audit_log: AuditLog,
    pub source: SourceStatus,
}
