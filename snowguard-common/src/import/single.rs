//! Single-add pipeline for the manual entry form
//!
//! The form constrains the permission type to a dropdown and the dates to a
//! date picker, so this path only checks that the four names are non-empty.
//! Whitespace-only names pass, and the audit fields are not stamped. Both
//! differ from the bulk path on purpose; see DESIGN.md.

use chrono::NaiveDate;
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::models::{PermissionRecord, PermissionType, RecordStatus};
use crate::store::MetadataStore;

/// Values submitted by the add-permission form
#[derive(Debug, Clone, Deserialize)]
pub struct SingleAddForm {
    #[serde(default)]
    pub database_name: String,
    #[serde(default)]
    pub schema_name: String,
    #[serde(default)]
    pub table_name: String,
    #[serde(default)]
    pub role_name: String,
    pub permission_type: PermissionType,
    pub effective_start_date: NaiveDate,
    #[serde(default)]
    pub effective_end_date: Option<NaiveDate>,
    #[serde(default)]
    pub description: String,
}

/// Single-add errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddError {
    #[error("Please fill in all required fields")]
    MissingRequiredFields,
}

/// Append one form entry and return its new identifier.
///
/// On error the table is left unchanged.
pub fn add_single(store: &mut MetadataStore, form: SingleAddForm) -> Result<i64, AddError> {
    let required = [
        &form.database_name,
        &form.schema_name,
        &form.table_name,
        &form.role_name,
    ];
    if required.iter().any(|v| v.is_empty()) {
        return Err(AddError::MissingRequiredFields);
    }

    let rbac_id = store.next_id();
    store.append([PermissionRecord {
        rbac_id,
        database_name: form.database_name,
        schema_name: form.schema_name,
        table_name: form.table_name,
        role_name: form.role_name,
        permission_type: form.permission_type,
        effective_start_date: form.effective_start_date,
        effective_end_date: form.effective_end_date,
        description: form.description,
        record_status_cd: RecordStatus::A,
        record_created_by: None,
        record_create_ts: None,
        record_updated_by: None,
        record_updated_ts: None,
    }]);

    info!(rbac_id, "Permission added from form");
    Ok(rbac_id)
}
