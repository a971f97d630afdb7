//! Bulk import pipeline
//!
//! Validates an uploaded batch row by row, then stamps and appends the rows
//! that passed. A failing row never blocks the others; a batch where nothing
//! passed leaves the table untouched and is reported as such.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::candidate::{CandidateRecord, NewPermission};
use super::validator::check;
use super::BULK_UPLOAD_ACTOR;
use crate::models::{PermissionRecord, RecordStatus};
use crate::store::MetadataStore;

/// Lines before the first data row in an uploaded file (the header)
pub const HEADER_ROW_OFFSET: usize = 1;

/// A rejected row, kept with its original values for the error report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvalidRow {
    /// Line number in the uploaded file (first data row is 2)
    pub row_number: usize,
    pub reasons: Vec<String>,
    pub fields: CandidateRecord,
}

/// A row that passed validation and is ready to import
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidRow {
    pub row_number: usize,
    pub permission: NewPermission,
}

/// Result of validating a batch without touching the table
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchValidation {
    pub total_rows: usize,
    pub valid: Vec<ValidRow>,
    pub invalid: Vec<InvalidRow>,
}

/// How an import attempt ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportStatus {
    /// The batch had no rows at all
    EmptyInput,
    /// Rows were given but none passed validation; nothing imported
    NoValidRows,
    /// Some rows imported, some rejected
    Partial,
    /// Every row imported
    Complete,
}

/// Result of an import attempt
#[derive(Debug, Clone, Serialize)]
pub struct ImportOutcome {
    pub status: ImportStatus,
    pub imported_count: usize,
    pub valid_rows: Vec<PermissionRecord>,
    pub invalid_rows: Vec<InvalidRow>,
}

/// User-facing line number for the row at zero-based `index`
pub fn row_number(index: usize) -> usize {
    index + 1 + HEADER_ROW_OFFSET
}

/// Validate every candidate in input order and partition the batch.
///
/// Pure: the same batch always yields the same partition.
pub fn validate_batch(candidates: &[CandidateRecord]) -> BatchValidation {
    let mut validation = BatchValidation {
        total_rows: candidates.len(),
        ..Default::default()
    };

    for (index, candidate) in candidates.iter().enumerate() {
        let row_number = row_number(index);
        match check(candidate) {
            Ok(permission) => validation.valid.push(ValidRow {
                row_number,
                permission,
            }),
            Err(reasons) => {
                debug!(row_number, reasons = ?reasons, "Row failed validation");
                validation.invalid.push(InvalidRow {
                    row_number,
                    reasons,
                    fields: candidate.clone(),
                });
            }
        }
    }

    validation
}

/// Validate a batch and append the rows that pass.
///
/// New rows get consecutive identifiers starting at `max(existing) + 1`, in
/// input order, status `A`, and audit fields stamped with the bulk upload
/// actor at `now`.
pub fn import_batch(
    store: &mut MetadataStore,
    candidates: &[CandidateRecord],
    now: DateTime<Utc>,
) -> ImportOutcome {
    let validation = validate_batch(candidates);
    let invalid_count = validation.invalid.len();

    if validation.valid.is_empty() {
        let status = if candidates.is_empty() {
            ImportStatus::EmptyInput
        } else {
            warn!(rows = candidates.len(), "No valid rows to import");
            ImportStatus::NoValidRows
        };
        return ImportOutcome {
            status,
            imported_count: 0,
            valid_rows: Vec::new(),
            invalid_rows: validation.invalid,
        };
    }

    let first_id = store.next_id();
    let valid_rows: Vec<PermissionRecord> = validation
        .valid
        .into_iter()
        .zip(first_id..)
        .map(|(row, rbac_id)| stamp(row.permission, rbac_id, now))
        .collect();

    store.append(valid_rows.iter().cloned());

    let imported_count = valid_rows.len();
    info!(
        imported = imported_count,
        rejected = invalid_count,
        first_id,
        "Bulk import merged into metadata"
    );

    ImportOutcome {
        status: if invalid_count == 0 {
            ImportStatus::Complete
        } else {
            ImportStatus::Partial
        },
        imported_count,
        valid_rows,
        invalid_rows: validation.invalid,
    }
}

fn stamp(p: NewPermission, rbac_id: i64, now: DateTime<Utc>) -> PermissionRecord {
    PermissionRecord {
        rbac_id,
        database_name: p.database_name,
        schema_name: p.schema_name,
        table_name: p.table_name,
        role_name: p.role_name,
        permission_type: p.permission_type,
        effective_start_date: p.effective_start_date,
        effective_end_date: p.effective_end_date,
        description: p.description,
        record_status_cd: RecordStatus::A,
        record_created_by: Some(BULK_UPLOAD_ACTOR.to_string()),
        record_create_ts: Some(now),
        record_updated_by: Some(BULK_UPLOAD_ACTOR.to_string()),
        record_updated_ts: Some(now),
    }
}
