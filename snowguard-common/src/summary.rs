//! Dashboard aggregates, filters and group-by summaries

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{
    AuditLogEntry, ExecutionStatus, OperationType, PermissionRecord, RecordStatus,
};

/// Headline numbers for the dashboard page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardMetrics {
    pub total_permissions: usize,
    /// Status A and inside the effective-date window
    pub active_permissions: usize,
    pub unique_roles: usize,
    pub unique_databases: usize,
    pub successful_operations_last_7_days: usize,
}

pub fn dashboard_metrics(
    metadata: &[PermissionRecord],
    audit: &[AuditLogEntry],
    now: DateTime<Utc>,
) -> DashboardMetrics {
    let week_ago = now - Duration::days(7);
    DashboardMetrics {
        total_permissions: metadata.len(),
        active_permissions: metadata.iter().filter(|r| r.is_active_at(now)).count(),
        unique_roles: distinct(metadata.iter().map(|r| r.role_name.as_str())).len(),
        unique_databases: distinct(metadata.iter().map(|r| r.database_name.as_str())).len(),
        successful_operations_last_7_days: audit
            .iter()
            .filter(|e| e.execution_status == ExecutionStatus::Success && e.execution_time >= week_ago)
            .count(),
    }
}

/// One bar/slice of a count chart
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupCount {
    pub key: String,
    pub count: usize,
}

/// Count rows per key, ordered by key
pub fn count_by<'a, T: 'a>(
    rows: impl IntoIterator<Item = &'a T>,
    key: impl Fn(&T) -> String,
) -> Vec<GroupCount> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for row in rows {
        *counts.entry(key(row)).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|(key, count)| GroupCount { key, count })
        .collect()
}

/// Per-role rollup for the "By Role" tab
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleSummary {
    pub role_name: String,
    pub total_permissions: usize,
    /// Distinct values in first-seen order, joined with `, `
    pub permission_types: String,
    pub databases: String,
    pub schemas: String,
}

pub fn role_summary(metadata: &[PermissionRecord]) -> Vec<RoleSummary> {
    let mut groups: BTreeMap<&str, Vec<&PermissionRecord>> = BTreeMap::new();
    for r in metadata {
        groups.entry(r.role_name.as_str()).or_default().push(r);
    }

    groups
        .into_iter()
        .map(|(role, rows)| RoleSummary {
            role_name: role.to_string(),
            total_permissions: rows.len(),
            permission_types: join_unique(rows.iter().map(|r| r.permission_type.as_str())),
            databases: join_unique(rows.iter().map(|r| r.database_name.as_str())),
            schemas: join_unique(rows.iter().map(|r| r.schema_name.as_str())),
        })
        .collect()
}

/// Per database/schema rollup for the "By Database" tab
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatabaseSummary {
    pub database_name: String,
    pub schema_name: String,
    pub total_permissions: usize,
    pub unique_roles: usize,
    pub unique_tables: usize,
}

pub fn database_summary(metadata: &[PermissionRecord]) -> Vec<DatabaseSummary> {
    let mut groups: BTreeMap<(&str, &str), Vec<&PermissionRecord>> = BTreeMap::new();
    for r in metadata {
        groups
            .entry((r.database_name.as_str(), r.schema_name.as_str()))
            .or_default()
            .push(r);
    }

    groups
        .into_iter()
        .map(|((db, schema), rows)| DatabaseSummary {
            database_name: db.to_string(),
            schema_name: schema.to_string(),
            total_permissions: rows.len(),
            unique_roles: distinct(rows.iter().map(|r| r.role_name.as_str())).len(),
            unique_tables: distinct(rows.iter().map(|r| r.table_name.as_str())).len(),
        })
        .collect()
}

/// Metadata table filter; empty lists match everything
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetadataFilter {
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub databases: Vec<String>,
    #[serde(default)]
    pub statuses: Vec<RecordStatus>,
}

impl MetadataFilter {
    pub fn matches(&self, r: &PermissionRecord) -> bool {
        (self.roles.is_empty() || self.roles.contains(&r.role_name))
            && (self.databases.is_empty() || self.databases.contains(&r.database_name))
            && (self.statuses.is_empty() || self.statuses.contains(&r.record_status_cd))
    }

    pub fn apply<'a>(&self, metadata: &'a [PermissionRecord]) -> Vec<&'a PermissionRecord> {
        metadata.iter().filter(|r| self.matches(r)).collect()
    }
}

/// Audit log time window
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeRange {
    #[default]
    Last7,
    Last30,
    All,
}

impl TimeRange {
    fn cutoff(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            TimeRange::Last7 => Some(now - Duration::days(7)),
            TimeRange::Last30 => Some(now - Duration::days(30)),
            TimeRange::All => None,
        }
    }
}

/// Audit log filter; empty lists match everything
#[derive(Debug, Clone, Default)]
pub struct AuditFilter {
    pub operation_types: Vec<OperationType>,
    pub statuses: Vec<ExecutionStatus>,
    pub range: TimeRange,
}

impl AuditFilter {
    /// Matching entries, newest first
    pub fn apply<'a>(&self, audit: &'a [AuditLogEntry], now: DateTime<Utc>) -> Vec<&'a AuditLogEntry> {
        let cutoff = self.range.cutoff(now);
        let mut out: Vec<&AuditLogEntry> = audit
            .iter()
            .filter(|e| self.operation_types.is_empty() || self.operation_types.contains(&e.operation_type))
            .filter(|e| self.statuses.is_empty() || self.statuses.contains(&e.execution_status))
            .filter(|e| cutoff.map_or(true, |c| e.execution_time >= c))
            .collect();
        out.sort_by(|a, b| b.execution_time.cmp(&a.execution_time));
        out
    }
}

/// Counts shown under the audit trail
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditStats {
    pub successful: usize,
    pub failed: usize,
    pub total: usize,
}

pub fn audit_stats(entries: &[&AuditLogEntry]) -> AuditStats {
    let successful = entries
        .iter()
        .filter(|e| e.execution_status == ExecutionStatus::Success)
        .count();
    let failed = entries
        .iter()
        .filter(|e| e.execution_status == ExecutionStatus::Failed)
        .count();
    AuditStats {
        successful,
        failed,
        total: entries.len(),
    }
}

/// The `limit` newest audit entries
pub fn recent_activity(audit: &[AuditLogEntry], limit: usize) -> Vec<&AuditLogEntry> {
    let mut sorted: Vec<&AuditLogEntry> = audit.iter().collect();
    sorted.sort_by(|a, b| b.execution_time.cmp(&a.execution_time));
    sorted.truncate(limit);
    sorted
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> BTreeSet<&'a str> {
    values.collect()
}

fn join_unique<'a>(values: impl Iterator<Item = &'a str>) -> String {
    let mut seen: Vec<&str> = Vec::new();
    for v in values {
        if !seen.contains(&v) {
            seen.push(v);
        }
    }
    seen.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fallback::{sample_audit_log, sample_metadata};
    use chrono::TimeZone;

    fn mid_2025() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_dashboard_metrics_on_sample() {
        let now = mid_2025();
        let m = dashboard_metrics(&sample_metadata(now), &sample_audit_log(now), now);
        assert_eq!(m.total_permissions, 5);
        assert_eq!(m.active_permissions, 5);
        assert_eq!(m.unique_roles, 3);
        assert_eq!(m.unique_databases, 2);
        assert_eq!(m.successful_operations_last_7_days, 4);
    }

    #[test]
    fn test_expired_rows_not_active() {
        let now = Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap();
        let m = dashboard_metrics(&sample_metadata(now), &[], now);
        // V_SUMMARY ended 2025-12-31
        assert_eq!(m.active_permissions, 4);
    }

    #[test]
    fn test_count_by_role() {
        let rows = sample_metadata(mid_2025());
        let counts = count_by(&rows, |r| r.role_name.clone());
        assert_eq!(
            counts,
            vec![
                GroupCount { key: "DEV_TEAM_ROLE".into(), count: 2 },
                GroupCount { key: "EXEC_ROLE".into(), count: 1 },
                GroupCount { key: "FIN_ANALYST_ROLE".into(), count: 2 },
            ]
        );
    }

    #[test]
    fn test_role_summary_joins_distinct() {
        let summary = role_summary(&sample_metadata(mid_2025()));
        let dev = summary.iter().find(|s| s.role_name == "DEV_TEAM_ROLE").unwrap();
        assert_eq!(dev.total_permissions, 2);
        assert_eq!(dev.permission_types, "ALL");
        assert_eq!(dev.databases, "ADW_DEV");
        assert_eq!(dev.schemas, "ADS, REPORTING");
    }

    #[test]
    fn test_database_summary() {
        let summary = database_summary(&sample_metadata(mid_2025()));
        let prod_ads = summary
            .iter()
            .find(|s| s.database_name == "PROD" && s.schema_name == "ADS")
            .unwrap();
        assert_eq!(prod_ads.total_permissions, 2);
        assert_eq!(prod_ads.unique_roles, 1);
        assert_eq!(prod_ads.unique_tables, 2);
        assert_eq!(summary.len(), 4);
    }

    #[test]
    fn test_metadata_filter() {
        let rows = sample_metadata(mid_2025());
        let filter = MetadataFilter {
            roles: vec!["DEV_TEAM_ROLE".into()],
            statuses: vec![RecordStatus::A],
            ..Default::default()
        };
        assert_eq!(filter.apply(&rows).len(), 2);
        assert_eq!(MetadataFilter::default().apply(&rows).len(), 5);

        let inactive_only = MetadataFilter {
            statuses: vec![RecordStatus::I],
            ..Default::default()
        };
        assert!(inactive_only.apply(&rows).is_empty());
    }

    #[test]
    fn test_audit_filter_range_and_order() {
        let now = mid_2025();
        let log = sample_audit_log(now);

        let all = AuditFilter {
            range: TimeRange::All,
            ..Default::default()
        }
        .apply(&log, now);
        assert_eq!(all.len(), 4);
        assert_eq!(all[0].operation_type, OperationType::Revoke);

        let later = now + Duration::days(5);
        let week = AuditFilter::default().apply(&log, later);
        // only the -1d and -2h entries stay inside a week counted from now+5d
        assert_eq!(week.len(), 2);
    }

    #[test]
    fn test_audit_filter_by_operation() {
        let now = mid_2025();
        let log = sample_audit_log(now);
        let grants = AuditFilter {
            operation_types: vec![OperationType::Grant],
            range: TimeRange::All,
            ..Default::default()
        }
        .apply(&log, now);
        assert_eq!(grants.len(), 2);
        assert_eq!(audit_stats(&grants), AuditStats { successful: 2, failed: 0, total: 2 });
    }

    #[test]
    fn test_recent_activity_limit() {
        let now = mid_2025();
        let log = sample_audit_log(now);
        let recent = recent_activity(&log, 2);
        assert_eq!(recent.len(), 2);
        assert!(recent[0].execution_time > recent[1].execution_time);
    }

    #[test]
    fn test_time_range_deserialize() {
        let r: TimeRange = serde_json::from_str("\"last30\"").unwrap();
        assert_eq!(r, TimeRange::Last30);
    }
}
