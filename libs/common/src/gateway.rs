//! Record fetch gateway
//!
//! Authenticated reads of named tables in the hosted record store, optionally
//! constrained by a filter formula. Transient failures are retried a bounded
//! number of times with a fixed delay; refusals (`Unauthorized`, `NotFound`)
//! are surfaced untouched so the caller can try another table or formula.

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::backend::{BackendConfig, BackendCredentials};
use crate::error::{RecordError, RecordResult};

/// A loosely-typed backend row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl Record {
    /// Build a record from a JSON object, anything else yields no fields
    pub fn new(id: impl Into<String>, fields: Value) -> Self {
        let fields = match fields {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self {
            id: id.into(),
            fields,
        }
    }
}

/// Largest page the backend serves
pub const MAX_PAGE_SIZE: usize = 100;

/// Filter and extra query parameters of a table read
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordQuery {
    pub filter: Option<String>,
    pub params: Vec<(String, String)>,
}

impl RecordQuery {
    /// Every record of the table
    pub fn all() -> Self {
        Self::default()
    }

    /// Records matching a filter formula
    pub fn filtered(formula: impl Into<String>) -> Self {
        Self {
            filter: Some(formula.into()),
            params: Vec::new(),
        }
    }

    /// Every record of the table, in pages as large as the backend allows
    pub fn scan() -> Self {
        Self::all().param("pageSize", MAX_PAGE_SIZE.to_string())
    }

    /// Add a raw query parameter (e.g. `view`, `pageSize`)
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }
}

/// Read access to the record store
#[async_trait]
pub trait RecordGateway: Send + Sync {
    /// Fetch the records of `table` (name or opaque id) matching `query`.
    /// Order is whatever the backend returns.
    async fn fetch(
        &self,
        config: &BackendConfig,
        table: &str,
        query: &RecordQuery,
    ) -> RecordResult<Vec<Record>>;
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    records: Vec<Record>,
    #[serde(default)]
    offset: Option<String>,
}

/// Gateway talking HTTP to the hosted record store
#[derive(Clone, Default)]
pub struct HttpRecordGateway {
    client: Client,
}

impl HttpRecordGateway {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    fn table_url(
        config: &BackendConfig,
        credentials: &BackendCredentials,
        table: &str,
    ) -> RecordResult<Url> {
        let mut url = Url::parse(&config.api_url)
            .map_err(|e| RecordError::InvalidConfig(format!("API URL {}: {}", config.api_url, e)))?;

        url.path_segments_mut()
            .map_err(|_| {
                RecordError::InvalidConfig(format!("API URL {} cannot hold a path", config.api_url))
            })?
            .pop_if_empty()
            .push(&credentials.base_id)
            .push(table);

        Ok(url)
    }

    /// One page of one attempt
    async fn fetch_page(
        &self,
        config: &BackendConfig,
        credentials: &BackendCredentials,
        table: &str,
        query: &RecordQuery,
        offset: Option<&str>,
    ) -> RecordResult<ListResponse> {
        let url = Self::table_url(config, credentials, table)?;

        let mut pairs: Vec<(&str, &str)> = Vec::new();
        if let Some(filter) = &query.filter {
            pairs.push(("filterByFormula", filter.as_str()));
        }
        for (key, value) in &query.params {
            pairs.push((key.as_str(), value.as_str()));
        }
        if let Some(offset) = offset {
            pairs.push(("offset", offset));
        }

        debug!(%url, filter = ?query.filter, offset = ?offset, "Fetching records");

        let response = self
            .client
            .get(url)
            .query(&pairs)
            .bearer_auth(&credentials.api_key)
            .timeout(config.request_timeout)
            .send()
            .await
            .map_err(|e| RecordError::Transient(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, table, &body));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| RecordError::Transient(e.to_string()))?;

        serde_json::from_slice(&bytes).map_err(|e| RecordError::Malformed(e.to_string()))
    }

    async fn fetch_page_with_retry(
        &self,
        config: &BackendConfig,
        credentials: &BackendCredentials,
        table: &str,
        query: &RecordQuery,
        offset: Option<&str>,
    ) -> RecordResult<ListResponse> {
        let max_attempts = config.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            match self
                .fetch_page(config, credentials, table, query, offset)
                .await
            {
                Err(e) if e.is_transient() && attempt < max_attempts => {
                    warn!(
                        table,
                        attempt,
                        max_attempts,
                        delay_ms = config.retry_delay.as_millis() as u64,
                        error = %e,
                        "Transient record store failure, retrying"
                    );
                    tokio::time::sleep(config.retry_delay).await;
                }
                result => return result,
            }
        }
    }
}

#[async_trait]
impl RecordGateway for HttpRecordGateway {
    async fn fetch(
        &self,
        config: &BackendConfig,
        table: &str,
        query: &RecordQuery,
    ) -> RecordResult<Vec<Record>> {
        let credentials = config.credentials()?;

        let mut records = Vec::new();
        let mut offset: Option<String> = None;
        let mut pages = 0;

        loop {
            let page = self
                .fetch_page_with_retry(config, credentials, table, query, offset.as_deref())
                .await?;
            pages += 1;
            records.extend(page.records);

            match page.offset {
                Some(next) if pages < config.max_pages => offset = Some(next),
                Some(_) => {
                    warn!(table, pages, "Pagination cap reached, returning partial table");
                    break;
                }
                None => break,
            }
        }

        debug!(table, count = records.len(), pages, "Records fetched");
        Ok(records)
    }
}

/// Map a non-success HTTP status onto the gateway taxonomy
pub fn classify_status(status: StatusCode, table: &str, body: &str) -> RecordError {
    let detail = format!("{} on {}: {}", status, table, body.trim());
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => RecordError::Unauthorized(detail),
        StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS => {
            RecordError::Transient(detail)
        }
        s if s.is_server_error() => RecordError::Transient(detail),
        _ => RecordError::NotFound(detail),
    }
}
