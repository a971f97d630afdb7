//! Permission record validator
//!
//! Checks run in a fixed order and every failure is collected, so a user
//! fixing an upload sees all problems with a row at once:
//!
//! 1. required fields present and non-blank
//! 2. permission type is one of the allowed privileges (blank included)
//! 3. start date parses
//! 4. end date parses, when given (blank means open-ended)
//!
//! Date checks only look at dates that are present, so a blank start date
//! yields exactly one "missing" reason. A blank permission type yields two.

use serde::Serialize;

use super::candidate::{CandidateRecord, NewPermission};
use crate::models::PermissionType;
use crate::time::parse_calendar_date;

/// Columns every uploaded row must fill, in reporting order
pub const REQUIRED_FIELDS: [&str; 6] = [
    "database_name",
    "schema_name",
    "table_name",
    "role_name",
    "permission_type",
    "effective_start_date",
];

/// Validator verdict for one candidate
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub ok: bool,
    pub reasons: Vec<String>,
}

impl ValidationResult {
    pub fn is_ok(&self) -> bool {
        self.ok
    }
}

/// Validate one candidate without producing a typed record
pub fn validate(candidate: &CandidateRecord) -> ValidationResult {
    match check(candidate) {
        Ok(_) => ValidationResult {
            ok: true,
            reasons: Vec::new(),
        },
        Err(reasons) => ValidationResult { ok: false, reasons },
    }
}

/// Validate one candidate, returning its normalized form or every reason it
/// was rejected.
pub fn check(candidate: &CandidateRecord) -> Result<NewPermission, Vec<String>> {
    let mut reasons = Vec::new();

    for name in REQUIRED_FIELDS {
        if candidate.field(name).is_none() {
            reasons.push(format!("Missing required field: {name}"));
        }
    }

    // Runs even on a blank value, which then also counts as invalid
    let raw_permission = candidate.field("permission_type").unwrap_or_default();
    let permission_type = match raw_permission.parse::<PermissionType>() {
        Ok(p) => Some(p),
        Err(_) => {
            reasons.push(format!(
                "Invalid permission type: {raw_permission}. Must be one of {}",
                PermissionType::allowed_list()
            ));
            None
        }
    };

    let start = candidate.field("effective_start_date").and_then(|raw| {
        let parsed = parse_calendar_date(raw);
        if parsed.is_none() {
            reasons.push("Invalid effective_start_date format (use YYYY-MM-DD)".to_string());
        }
        parsed
    });

    let end = match candidate.field("effective_end_date") {
        None => Ok(None),
        Some(raw) => match parse_calendar_date(raw) {
            Some(d) => Ok(Some(d)),
            None => {
                reasons.push("Invalid effective_end_date format (use YYYY-MM-DD)".to_string());
                Err(())
            }
        },
    };

    if !reasons.is_empty() {
        return Err(reasons);
    }

    // No reasons means every required field was present and parsed
    match (permission_type, start, end) {
        (Some(permission_type), Some(effective_start_date), Ok(effective_end_date)) => {
            Ok(NewPermission {
                database_name: owned(candidate, "database_name"),
                schema_name: owned(candidate, "schema_name"),
                table_name: owned(candidate, "table_name"),
                role_name: owned(candidate, "role_name"),
                permission_type,
                effective_start_date,
                effective_end_date,
                description: owned(candidate, "description"),
            })
        }
        _ => Err(vec!["Row could not be normalized".to_string()]),
    }
}

fn owned(candidate: &CandidateRecord, name: &str) -> String {
    candidate.field(name).unwrap_or_default().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn candidate(
        db: &str,
        schema: &str,
        table: &str,
        role: &str,
        perm: &str,
        start: &str,
    ) -> CandidateRecord {
        CandidateRecord {
            database_name: Some(db.to_string()),
            schema_name: Some(schema.to_string()),
            table_name: Some(table.to_string()),
            role_name: Some(role.to_string()),
            permission_type: Some(perm.to_string()),
            effective_start_date: Some(start.to_string()),
            effective_end_date: None,
            description: None,
        }
    }

    #[test]
    fn test_valid_record_passes() {
        let c = candidate("ADW_PROD", "ADS", "T1", "R1", "SELECT", "2025-01-01");
        let result = validate(&c);
        assert!(result.is_ok());
        assert!(result.reasons.is_empty());
    }

    #[test]
    fn test_lowercase_permission_normalized() {
        let c = candidate("ADW_PROD", "ADS", "T1", "R1", "select", "2025-01-01");
        let p = check(&c).unwrap();
        assert_eq!(p.permission_type, PermissionType::Select);
    }

    #[test]
    fn test_read_rejected_with_allowed_list() {
        let c = candidate("ADW_PROD", "ADS", "T1", "R1", "READ", "2025-01-01");
        let result = validate(&c);
        assert!(!result.is_ok());
        assert_eq!(
            result.reasons,
            vec!["Invalid permission type: READ. Must be one of [SELECT, INSERT, UPDATE, DELETE, ALL]"]
        );
    }

    #[test]
    fn test_all_failures_accumulated_in_order() {
        let c = candidate("", "ADS", "T2", "R2", "BAD", "not-a-date");
        let result = validate(&c);
        assert_eq!(result.reasons.len(), 3);
        assert_eq!(result.reasons[0], "Missing required field: database_name");
        assert!(result.reasons[1].starts_with("Invalid permission type: BAD"));
        assert_eq!(
            result.reasons[2],
            "Invalid effective_start_date format (use YYYY-MM-DD)"
        );
    }

    #[test]
    fn test_every_missing_field_reported() {
        let result = validate(&CandidateRecord::default());
        assert_eq!(result.reasons.len(), REQUIRED_FIELDS.len() + 1);
        for (reason, field) in result.reasons.iter().zip(REQUIRED_FIELDS) {
            assert_eq!(reason, &format!("Missing required field: {field}"));
        }
        assert!(result.reasons[REQUIRED_FIELDS.len()].starts_with("Invalid permission type: ."));
    }

    #[test]
    fn test_blank_permission_type_is_missing_and_invalid() {
        let c = candidate("ADW_PROD", "ADS", "T1", "R1", "  ", "2025-01-01");
        assert_eq!(
            validate(&c).reasons,
            vec![
                "Missing required field: permission_type".to_string(),
                format!(
                    "Invalid permission type: . Must be one of {}",
                    PermissionType::allowed_list()
                ),
            ]
        );
    }

    #[test]
    fn test_blank_start_date_only_missing() {
        let c = candidate("ADW_PROD", "ADS", "T1", "R1", "SELECT", "");
        assert_eq!(
            validate(&c).reasons,
            vec!["Missing required field: effective_start_date"]
        );
    }

    #[test]
    fn test_whitespace_only_counts_as_missing() {
        let c = candidate("ADW_PROD", "   ", "T1", "R1", "SELECT", "2025-01-01");
        assert_eq!(
            validate(&c).reasons,
            vec!["Missing required field: schema_name"]
        );
    }

    #[test]
    fn test_blank_end_date_is_open_ended() {
        let mut c = candidate("ADW_PROD", "ADS", "T1", "R1", "ALL", "2025-01-01");
        c.effective_end_date = Some("  ".to_string());
        let p = check(&c).unwrap();
        assert_eq!(p.effective_end_date, None);
    }

    #[test]
    fn test_bad_end_date_rejected() {
        let mut c = candidate("ADW_PROD", "ADS", "T1", "R1", "ALL", "2025-01-01");
        c.effective_end_date = Some("2025-31-12".to_string());
        assert_eq!(
            validate(&c).reasons,
            vec!["Invalid effective_end_date format (use YYYY-MM-DD)"]
        );
    }

    #[test]
    fn test_valid_end_date_kept() {
        let mut c = candidate("ADW_PROD", "ADS", "T1", "R1", "INSERT", "2025-01-01");
        c.effective_end_date = Some("2025-12-31".to_string());
        let p = check(&c).unwrap();
        assert_eq!(p.effective_end_date, NaiveDate::from_ymd_opt(2025, 12, 31));
    }

    #[test]
    fn test_fields_trimmed_on_normalize() {
        let mut c = candidate(" ADW_PROD ", "ADS", "T1 ", "R1", " update ", " 2025-01-01");
        c.description = Some(" Quarterly refresh ".to_string());
        let p = check(&c).unwrap();
        assert_eq!(p.database_name, "ADW_PROD");
        assert_eq!(p.table_name, "T1");
        assert_eq!(p.permission_type, PermissionType::Update);
        assert_eq!(p.description, "Quarterly refresh");
    }

    #[test]
    fn test_validation_is_deterministic() {
        let c = candidate("", "ADS", "T2", "", "write", "2025-99-99");
        assert_eq!(validate(&c), validate(&c));
    }
}
