//! Raw and validated candidate rows

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::PermissionType;

/// One uploaded row exactly as received.
///
/// Every field is optional: a missing CSV column and an empty cell both end
/// up as `None` or an empty string, and the validator treats them alike.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateRecord {
    #[serde(default)]
    pub database_name: Option<String>,
    #[serde(default)]
    pub schema_name: Option<String>,
    #[serde(default)]
    pub table_name: Option<String>,
    #[serde(default)]
    pub role_name: Option<String>,
    #[serde(default)]
    pub permission_type: Option<String>,
    #[serde(default)]
    pub effective_start_date: Option<String>,
    #[serde(default)]
    pub effective_end_date: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl CandidateRecord {
    /// Field value by column name, trimmed; `None` when absent or blank
    pub fn field(&self, name: &str) -> Option<&str> {
        let value = match name {
            "database_name" => &self.database_name,
            "schema_name" => &self.schema_name,
            "table_name" => &self.table_name,
            "role_name" => &self.role_name,
            "permission_type" => &self.permission_type,
            "effective_start_date" => &self.effective_start_date,
            "effective_end_date" => &self.effective_end_date,
            "description" => &self.description,
            _ => return None,
        };
        value.as_deref().map(str::trim).filter(|v| !v.is_empty())
    }
}

/// A candidate that passed validation, with normalized, typed fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewPermission {
    pub database_name: String,
    pub schema_name: String,
    pub table_name: String,
    pub role_name: String,
    pub permission_type: PermissionType,
    pub effective_start_date: NaiveDate,
    pub effective_end_date: Option<NaiveDate>,
    pub description: String,
}
