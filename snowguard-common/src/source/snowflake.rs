//! Snowflake SQL API client
//!
//! Submits a statement to `POST /api/v2/statements`, waits for it if the
//! server answers `202 Accepted`, and pages through any extra result
//! partitions. All cells come back as text and are decoded in [`super::rows`].

use std::time::Duration;

use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::rows::RowSet;
use super::{SourceError, WarehouseClient};
use crate::config::WarehouseConfig;

const USER_AGENT: &str = concat!("SnowGuard/", env!("CARGO_PKG_VERSION"));
const STATEMENTS_PATH: &str = "/api/v2/statements";
const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Statement response body (first partition)
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatementResponse {
    #[serde(default)]
    statement_handle: Option<String>,
    #[serde(default)]
    result_set_meta_data: Option<ResultSetMetaData>,
    #[serde(default)]
    data: Vec<Vec<Option<String>>>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResultSetMetaData {
    row_type: Vec<ColumnType>,
    #[serde(default)]
    partition_info: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ColumnType {
    name: String,
}

/// Later partitions carry rows only
#[derive(Debug, Deserialize)]
struct PartitionResponse {
    #[serde(default)]
    data: Vec<Vec<Option<String>>>,
}

/// Snowflake SQL API client
#[derive(Debug, Clone)]
pub struct SnowflakeClient {
    http_client: reqwest::Client,
    base_url: String,
    token: String,
    token_type: String,
    context: StatementContext,
    timeout: Duration,
}

#[derive(Debug, Clone, Default)]
struct StatementContext {
    warehouse: Option<String>,
    role: Option<String>,
    database: Option<String>,
    schema: Option<String>,
}

impl SnowflakeClient {
    /// Build a client, or explain which connection parameters are missing
    pub fn from_config(config: &WarehouseConfig) -> Result<Self, SourceError> {
        if let Some(reason) = config.missing_credentials() {
            return Err(SourceError::MissingCredentials(reason));
        }
        let base_url = config.api_base_url().ok_or_else(|| {
            SourceError::MissingCredentials("Snowflake account not configured".to_string())
        })?;

        let timeout = config.timeout();
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .map_err(|e| SourceError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url,
            token: config.token.clone().unwrap_or_default(),
            token_type: config.token_type.clone(),
            context: StatementContext {
                warehouse: config.warehouse.clone(),
                role: config.role.clone(),
                database: config.database.clone(),
                schema: config.schema.clone(),
            },
            timeout,
        })
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .bearer_auth(&self.token)
            .header("X-Snowflake-Authorization-Token-Type", self.token_type.as_str())
            .header(reqwest::header::ACCEPT, "application/json")
    }

    async fn submit(&self, sql: &str) -> Result<StatementResponse, SourceError> {
        let mut body = json!({
            "statement": sql,
            "timeout": self.timeout.as_secs(),
        });
        let ctx = &self.context;
        for (key, value) in [
            ("warehouse", &ctx.warehouse),
            ("role", &ctx.role),
            ("database", &ctx.database),
            ("schema", &ctx.schema),
        ] {
            if let Some(v) = value.as_deref().filter(|v| !v.is_empty()) {
                body[key] = json!(v);
            }
        }

        let url = format!("{}{}", self.base_url, STATEMENTS_PATH);
        let response = self
            .authorized(self.http_client.post(&url))
            .json(&body)
            .send()
            .await
            .map_err(|e| SourceError::Network(e.to_string()))?;

        let mut statement = read_statement(response).await?;

        // 202: still executing; poll the handle until results are ready
        while statement.result_set_meta_data.is_none() {
            let handle = statement.statement_handle.clone().ok_or_else(|| {
                SourceError::Parse(
                    statement
                        .message
                        .clone()
                        .unwrap_or_else(|| "response has neither results nor handle".to_string()),
                )
            })?;
            debug!(%handle, "Statement still running, polling");
            tokio::time::sleep(POLL_INTERVAL).await;
            let response = self
                .authorized(self.http_client.get(format!("{url}/{handle}")))
                .send()
                .await
                .map_err(|e| SourceError::Network(e.to_string()))?;
            statement = read_statement(response).await?;
        }

        Ok(statement)
    }

    async fn fetch_partition(
        &self,
        handle: &str,
        partition: usize,
    ) -> Result<Vec<Vec<Option<String>>>, SourceError> {
        let url = format!("{}{}/{}", self.base_url, STATEMENTS_PATH, handle);
        let response = self
            .authorized(self.http_client.get(&url))
            .query(&[("partition", partition)])
            .send()
            .await
            .map_err(|e| SourceError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(SourceError::Api(status.as_u16(), text));
        }
        let page: PartitionResponse = response
            .json()
            .await
            .map_err(|e| SourceError::Parse(e.to_string()))?;
        Ok(page.data)
    }
}

async fn read_statement(response: reqwest::Response) -> Result<StatementResponse, SourceError> {
    let status = response.status();
    if status == reqwest::StatusCode::UNAUTHORIZED {
        return Err(SourceError::Api(401, "authentication rejected".to_string()));
    }
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        return Err(SourceError::Api(status.as_u16(), text));
    }
    response
        .json()
        .await
        .map_err(|e| SourceError::Parse(e.to_string()))
}

impl WarehouseClient for SnowflakeClient {
    async fn query(&self, sql: &str) -> Result<RowSet, SourceError> {
        let statement = self.submit(sql).await?;
        let meta = statement
            .result_set_meta_data
            .ok_or_else(|| SourceError::Parse("missing resultSetMetaData".to_string()))?;

        let mut rows = statement.data;
        if meta.partition_info.len() > 1 {
            let handle = statement.statement_handle.unwrap_or_default();
            for partition in 1..meta.partition_info.len() {
                rows.extend(self.fetch_partition(&handle, partition).await?);
            }
        }

        let columns = meta.row_type.into_iter().map(|c| c.name).collect();
        debug!(rows = rows.len(), "Warehouse query returned");
        Ok(RowSet::new(columns, rows))
    }
}
