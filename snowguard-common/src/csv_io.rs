//! CSV upload parsing and report/export rendering

use serde::Serialize;

use crate::error::{Error, Result};
use crate::import::{CandidateRecord, InvalidRow};
use crate::models::{AuditLogEntry, PermissionRecord};

/// Columns of the bulk upload file, in template order
pub const UPLOAD_COLUMNS: [&str; 8] = [
    "database_name",
    "schema_name",
    "table_name",
    "role_name",
    "permission_type",
    "effective_start_date",
    "effective_end_date",
    "description",
];

/// Columns of a metadata export, in model field order
pub const METADATA_COLUMNS: [&str; 14] = [
    "rbac_id",
    "database_name",
    "schema_name",
    "table_name",
    "role_name",
    "permission_type",
    "effective_start_date",
    "effective_end_date",
    "description",
    "record_status_cd",
    "record_created_by",
    "record_create_ts",
    "record_updated_by",
    "record_updated_ts",
];

/// Columns of an audit log export, in model field order
pub const AUDIT_LOG_COLUMNS: [&str; 16] = [
    "log_id",
    "operation_type",
    "database_name",
    "schema_name",
    "table_name",
    "role_name",
    "permission_type",
    "sql_statement",
    "execution_status",
    "error_message",
    "execution_time",
    "record_status_cd",
    "record_created_by",
    "record_create_ts",
    "record_updated_by",
    "record_updated_ts",
];

/// Parse an uploaded CSV into candidates, one per data row.
///
/// Columns are matched by header name; missing columns and short rows leave
/// the corresponding fields empty and unknown columns are ignored. Only a
/// structurally unreadable file is an error.
pub fn parse_upload(data: &[u8]) -> Result<Vec<CandidateRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(data);

    let mut candidates = Vec::new();
    for record in reader.deserialize() {
        let candidate: CandidateRecord = record?;
        candidates.push(candidate);
    }
    Ok(candidates)
}

/// `row, errors` report for rejected rows
pub fn error_report(invalid: &[InvalidRow]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["row", "errors"])?;
    for row in invalid {
        writer.write_record([row.row_number.to_string(), row.reasons.join(" | ")])?;
    }
    finish(writer)
}

/// Metadata table export, same columns as the model; header even when empty
pub fn export_metadata<'a>(records: impl IntoIterator<Item = &'a PermissionRecord>) -> Result<String> {
    serialize_all(&METADATA_COLUMNS, records)
}

/// Audit log export, same columns as the model; header even when empty
pub fn export_audit_log<'a>(entries: impl IntoIterator<Item = &'a AuditLogEntry>) -> Result<String> {
    serialize_all(&AUDIT_LOG_COLUMNS, entries)
}

/// Two example rows showing an open-ended and a bounded grant
pub fn template() -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(UPLOAD_COLUMNS)?;
    writer.write_record([
        "ADW_PROD",
        "ADS",
        "T_MBR_DIM",
        "FIN_ANALYST_ROLE",
        "SELECT",
        "2025-01-01",
        "",
        "Member dimension access",
    ])?;
    writer.write_record([
        "ADW_PROD",
        "REPORTING",
        "V_SUMMARY",
        "EXEC_ROLE",
        "SELECT",
        "2025-01-01",
        "2025-12-31",
        "Executive reports",
    ])?;
    finish(writer)
}

fn serialize_all<'a, T: Serialize + 'a>(
    columns: &[&str],
    rows: impl IntoIterator<Item = &'a T>,
) -> Result<String> {
    // The header is written here, not derived from the first row
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(columns)?;
    for row in rows {
        writer.serialize(row)?;
    }
    finish(writer)
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<String> {
    let bytes = writer.into_inner().map_err(|e| Error::Io(e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| Error::Internal(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fallback::{sample_audit_log, sample_metadata};
    use crate::import::validate_batch;
    use crate::time::now;

    #[test]
    fn test_parse_upload_full_columns() {
        let data = "database_name,schema_name,table_name,role_name,permission_type,effective_start_date,effective_end_date,description\n\
                    ADW_PROD,ADS,T_X,R1,select,2025-01-01,,first\n";
        let rows = parse_upload(data.as_bytes()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].permission_type.as_deref(), Some("select"));
        assert_eq!(rows[0].effective_end_date, None);
        assert_eq!(rows[0].description.as_deref(), Some("first"));
    }

    #[test]
    fn test_parse_upload_missing_column_and_short_row() {
        // no effective_end_date or description column; second row is short
        let data = "database_name,schema_name,table_name,role_name,permission_type,effective_start_date\n\
                    ADW_PROD,ADS,T_X,R1,SELECT,2025-01-01\n\
                    ADW_PROD,ADS\n";
        let rows = parse_upload(data.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].effective_end_date, None);
        assert_eq!(rows[1].schema_name.as_deref(), Some("ADS"));
        assert_eq!(rows[1].table_name, None);
    }

    #[test]
    fn test_parse_upload_header_only() {
        let rows = parse_upload(b"database_name,schema_name\n").unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_parse_upload_rejects_invalid_utf8() {
        let data = b"database_name\n\xff\xfe\n";
        assert!(matches!(parse_upload(data), Err(Error::Csv(_))));
    }

    #[test]
    fn test_error_report_joins_reasons() {
        let candidates = vec![CandidateRecord {
            database_name: Some("ADW_PROD".to_string()),
            permission_type: Some("READ".to_string()),
            effective_start_date: Some("2025-01-01".to_string()),
            ..Default::default()
        }];
        let batch = validate_batch(&candidates);

        let report = error_report(&batch.invalid).unwrap();

        let mut lines = report.lines();
        assert_eq!(lines.next(), Some("row,errors"));
        let line = lines.next().unwrap();
        assert!(line.starts_with("2,"));
        assert!(line.contains("Missing required field: schema_name | Missing required field: table_name"));
    }

    #[test]
    fn test_template_round_trips_through_parser() {
        let template = template().unwrap();
        let rows = parse_upload(template.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(validate_batch(&rows).invalid.is_empty());
        assert_eq!(rows[1].effective_end_date.as_deref(), Some("2025-12-31"));
    }

    #[test]
    fn test_export_metadata_columns() {
        let records = sample_metadata(now());
        let csv = export_metadata(&records).unwrap();
        let header = csv.lines().next().unwrap();
        assert!(header.starts_with("rbac_id,database_name,schema_name,table_name,role_name,permission_type"));
        assert!(header.ends_with("record_updated_by,record_updated_ts"));
        assert_eq!(csv.lines().count(), 6);
        assert!(csv.contains("1,PROD,ADS,T_MBR_DIM,FIN_ANALYST_ROLE,SELECT,2025-01-01,,"));
    }

    #[test]
    fn test_empty_exports_keep_header() {
        let csv = export_metadata(&Vec::<PermissionRecord>::new()).unwrap();
        assert_eq!(csv, format!("{}\n", METADATA_COLUMNS.join(",")));

        let csv = export_audit_log(&Vec::<AuditLogEntry>::new()).unwrap();
        assert_eq!(csv, format!("{}\n", AUDIT_LOG_COLUMNS.join(",")));
    }

    #[test]
    fn test_export_columns_match_model_fields() {
        // serde's own header for one row must equal the fixed column lists
        let now = now();
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.serialize(&sample_metadata(now)[0]).unwrap();
        let text = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        assert_eq!(text.lines().next(), Some(METADATA_COLUMNS.join(",").as_str()));

        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.serialize(&sample_audit_log(now)[0]).unwrap();
        let text = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        assert_eq!(text.lines().next(), Some(AUDIT_LOG_COLUMNS.join(",").as_str()));
    }
}
