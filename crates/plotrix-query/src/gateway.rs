//! Query gateway: executes SQL text against the MindsDB engine.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use plotrix_core::config::GatewayConfig;
use plotrix_core::types::{RawRow, RowSet};

use crate::error::QueryError;

/// Executes a query string and returns its rows in engine order.
#[async_trait]
pub trait QueryGateway: Send + Sync {
    async fn execute(&self, sql: &str) -> Result<RowSet, QueryError>;

    /// Whether the gateway has the wiring it needs (endpoint, project).
    fn is_configured(&self) -> bool {
        true
    }
}

#[derive(Debug, Serialize)]
struct SqlRequest<'a> {
    query: &'a str,
    context: SqlContext<'a>,
}

#[derive(Debug, Serialize)]
struct SqlContext<'a> {
    db: &'a str,
}

/// Body of `POST /api/sql/query`.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum SqlResponse {
    Table {
        #[serde(default)]
        column_names: Vec<String>,
        #[serde(default)]
        data: Vec<Vec<Value>>,
    },
    #[serde(rename = "ok")]
    Done {},
    Error {
        #[serde(default)]
        error_message: Option<String>,
    },
}

impl SqlResponse {
    fn into_rows(self) -> Result<RowSet, QueryError> {
        match self {
            SqlResponse::Table { column_names, data } => Ok(data
                .into_iter()
                .map(|values| RawRow::from_columns(&column_names, values))
                .collect()),
            SqlResponse::Done {} => Ok(Vec::new()),
            SqlResponse::Error { error_message } => Err(QueryError::Gateway(
                error_message.unwrap_or_else(|| "query failed".to_string()),
            )),
        }
    }
}

/// HTTP client for a MindsDB server.
///
/// One instance is created at startup and shared by every request. The
/// request deadline is enforced by [`crate::MovieService`]; only the
/// connect phase is bounded here.
pub struct MindsDbGateway {
    client: reqwest::Client,
    endpoint: String,
    project: String,
}

impl MindsDbGateway {
    pub fn new(config: &GatewayConfig) -> Result<Self, QueryError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/api/sql/query", config.url.trim_end_matches('/')),
            project: config.project.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl QueryGateway for MindsDbGateway {
    async fn execute(&self, sql: &str) -> Result<RowSet, QueryError> {
        let body = SqlRequest {
            query: sql,
            context: SqlContext { db: &self.project },
        };

        let response = self.client.post(&self.endpoint).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(QueryError::Gateway(format!(
                "MindsDB returned {}: {}",
                status,
                text.trim()
            )));
        }

        let parsed: SqlResponse = response.json().await?;
        let rows = parsed.into_rows()?;
        debug!(rows = rows.len(), "MindsDB query completed");
        Ok(rows)
    }

    fn is_configured(&self) -> bool {
        !self.project.trim().is_empty() && self.endpoint.starts_with("http")
    }
}
