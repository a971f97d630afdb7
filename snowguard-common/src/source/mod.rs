//! Source adapter: warehouse tables with sample-data fallback
//!
//! Each table is fetched once at session start. Any failure (missing
//! credentials, transport error, API error, undecodable or empty result,
//! timeout) is caught here and turned into the embedded sample table plus
//! `available = false` and a message. Callers never see an error.

pub mod rows;
pub mod snowflake;

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::WarehouseConfig;
use crate::fallback;
use crate::models::{AuditLogEntry, PermissionRecord};
use crate::store::{AuditLog, MetadataStore, Session, SourceStatus};

pub use rows::{RowSet, AUDIT_LOG_QUERY, METADATA_QUERY};
pub use snowflake::SnowflakeClient;

/// Reasons a warehouse fetch did not produce a table
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("{0}")]
    MissingCredentials(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("Empty {0} from Snowflake")]
    Empty(&'static str),
}

/// Anything that can run a query and return text rows
pub trait WarehouseClient {
    fn query(&self, sql: &str) -> impl Future<Output = Result<RowSet, SourceError>> + Send;
}

/// A loaded table and where it came from
#[derive(Debug, Clone)]
pub struct Loaded<T> {
    pub rows: Vec<T>,
    /// `false` when `rows` is the embedded sample
    pub available: bool,
    /// Empty on success
    pub error: String,
}

/// Fetches the two session tables, substituting sample data on failure
pub struct SourceAdapter<C> {
    client: Result<C, String>,
    timeout: Duration,
}

impl<C: WarehouseClient> SourceAdapter<C> {
    pub fn new(client: C, timeout: Duration) -> Self {
        Self {
            client: Ok(client),
            timeout,
        }
    }

    /// Adapter that always falls back, for a warehouse that is not configured
    pub fn unconfigured(reason: impl Into<String>) -> Self {
        Self {
            client: Err(reason.into()),
            timeout: Duration::ZERO,
        }
    }

    pub async fn load_metadata(&self, now: DateTime<Utc>) -> Loaded<PermissionRecord> {
        let result = self.fetch(METADATA_QUERY, rows::decode_metadata).await;
        settle("metadata", result, || fallback::sample_metadata(now))
    }

    pub async fn load_audit_log(&self, now: DateTime<Utc>) -> Loaded<AuditLogEntry> {
        let result = self.fetch(AUDIT_LOG_QUERY, rows::decode_audit_log).await;
        settle("audit log", result, || fallback::sample_audit_log(now))
    }

    async fn fetch<T>(
        &self,
        sql: &str,
        decode: fn(&RowSet) -> Result<Vec<T>, SourceError>,
    ) -> Result<Vec<T>, SourceError> {
        let client = self
            .client
            .as_ref()
            .map_err(|reason| SourceError::MissingCredentials(reason.clone()))?;

        let set = tokio::time::timeout(self.timeout, client.query(sql))
            .await
            .map_err(|_| SourceError::Timeout(self.timeout))??;
        decode(&set)
    }
}

impl SourceAdapter<SnowflakeClient> {
    /// Adapter for the configured Snowflake account
    pub fn from_config(config: &WarehouseConfig) -> Self {
        match SnowflakeClient::from_config(config) {
            Ok(client) => Self::new(client, config.timeout()),
            Err(e) => Self::unconfigured(e.to_string()),
        }
    }
}

fn settle<T>(
    table: &'static str,
    result: Result<Vec<T>, SourceError>,
    sample: impl FnOnce() -> Vec<T>,
) -> Loaded<T> {
    match result {
        Ok(rows) => {
            info!(table, rows = rows.len(), "Loaded from Snowflake");
            Loaded {
                rows,
                available: true,
                error: String::new(),
            }
        }
        Err(e) => {
            warn!(table, error = %e, "Snowflake unavailable, using sample data");
            Loaded {
                rows: sample(),
                available: false,
                error: e.to_string(),
            }
        }
    }
}

/// Load both tables and assemble the session.
///
/// The warehouse counts as available only if both tables came from it.
pub async fn load_session<C: WarehouseClient>(
    adapter: &SourceAdapter<C>,
    now: DateTime<Utc>,
) -> Session {
    let metadata = adapter.load_metadata(now).await;
    let audit_log = adapter.load_audit_log(now).await;

    let mut error = String::new();
    if !metadata.available {
        error.push_str(&format!("Metadata: {}; ", metadata.error));
    }
    if !audit_log.available {
        error.push_str(&format!("AuditLog: {}; ", audit_log.error));
    }

    Session {
        metadata: MetadataStore::new(metadata.rows),
        audit_log: AuditLog::new(audit_log.rows),
        source: SourceStatus {
            available: metadata.available && audit_log.available,
            error,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::now;

    /// Client returning canned results per query
    struct FakeClient {
        metadata: Result<RowSet, ()>,
        audit: Result<RowSet, ()>,
        delay: Duration,
    }

    impl WarehouseClient for FakeClient {
        async fn query(&self, sql: &str) -> Result<RowSet, SourceError> {
            tokio::time::sleep(self.delay).await;
            let result = if sql.contains("adw_rbac_metadata") {
                &self.metadata
            } else {
                &self.audit
            };
            result
                .clone()
                .map_err(|_| SourceError::Network("connection refused".to_string()))
        }
    }

    fn metadata_set() -> RowSet {
        RowSet::new(
            vec![
                "RBAC_ID".into(), "DATABASE_NAME".into(), "SCHEMA_NAME".into(),
                "TABLE_NAME".into(), "ROLE_NAME".into(), "PERMISSION_TYPE".into(),
                "EFFECTIVE_START_DATE".into(), "EFFECTIVE_END_DATE".into(),
            ],
            vec![vec![
                Some("42".into()), Some("ADW_PROD".into()), Some("ADS".into()),
                Some("T_MBR_DIM".into()), Some("FIN_ANALYST_ROLE".into()),
                Some("SELECT".into()), Some("2025-01-01".into()), None,
            ]],
        )
    }

    fn audit_set() -> RowSet {
        RowSet::new(
            vec![
                "LOG_ID".into(), "OPERATION_TYPE".into(), "PERMISSION_TYPE".into(),
                "EXECUTION_STATUS".into(), "EXECUTION_TIME".into(),
            ],
            vec![vec![
                Some("9".into()), Some("GRANT".into()), Some("SELECT".into()),
                Some("SUCCESS".into()), Some("1735689600".into()),
            ]],
        )
    }

    #[tokio::test]
    async fn test_both_tables_from_warehouse() {
        let adapter = SourceAdapter::new(
            FakeClient {
                metadata: Ok(metadata_set()),
                audit: Ok(audit_set()),
                delay: Duration::ZERO,
            },
            Duration::from_secs(5),
        );

        let session = load_session(&adapter, now()).await;

        assert!(session.source.available);
        assert!(session.source.error.is_empty());
        assert_eq!(session.metadata.max_id(), 42);
        assert_eq!(session.audit_log.len(), 1);
    }

    #[tokio::test]
    async fn test_unconfigured_falls_back() {
        let adapter: SourceAdapter<FakeClient> =
            SourceAdapter::unconfigured("Snowflake credentials not found");

        let metadata = adapter.load_metadata(now()).await;

        assert!(!metadata.available);
        assert_eq!(metadata.rows.len(), 5);
        assert_eq!(metadata.error, "Snowflake credentials not found");
    }

    #[tokio::test]
    async fn test_empty_result_falls_back() {
        let adapter = SourceAdapter::new(
            FakeClient {
                metadata: Ok(RowSet::default()),
                audit: Ok(audit_set()),
                delay: Duration::ZERO,
            },
            Duration::from_secs(5),
        );

        let session = load_session(&adapter, now()).await;

        assert!(!session.source.available);
        assert_eq!(session.source.error, "Metadata: Empty metadata from Snowflake; ");
        assert_eq!(session.metadata.len(), 5);
        assert_eq!(session.audit_log.len(), 1);
    }

    #[tokio::test]
    async fn test_errors_accumulate_per_table() {
        let adapter = SourceAdapter::new(
            FakeClient {
                metadata: Err(()),
                audit: Err(()),
                delay: Duration::ZERO,
            },
            Duration::from_secs(5),
        );

        let session = load_session(&adapter, now()).await;

        assert_eq!(
            session.source.error,
            "Metadata: Network error: connection refused; AuditLog: Network error: connection refused; "
        );
        assert_eq!(session.audit_log.len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_warehouse_times_out() {
        let adapter = SourceAdapter::new(
            FakeClient {
                metadata: Ok(metadata_set()),
                audit: Ok(audit_set()),
                delay: Duration::from_secs(60),
            },
            Duration::from_secs(2),
        );

        let metadata = adapter.load_metadata(now()).await;

        assert!(!metadata.available);
        assert!(metadata.error.starts_with("Timed out"));
        assert_eq!(metadata.rows.len(), 5);
    }

    #[test]
    fn test_from_config_without_credentials() {
        let adapter = SourceAdapter::from_config(&WarehouseConfig::default());
        assert!(adapter.client.is_err());
    }
}
