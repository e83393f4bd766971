//! Snowflake SQL API backend
//!
//! Statements go to `POST /api/v2/statements` with positional `?` bindings.
//! A 202 response means the statement is still running; its status URL is
//! polled until the result is ready or the configured timeout passes. Large
//! results arrive in partitions, fetched with `?partition=N`.
//!
//! The API returns every cell as a string (or null), so decoding happens here:
//! numbers are parsed, booleans are `"true"`/`"false"`, and timestamps are
//! epoch seconds with an optional fraction and timezone offset.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use gwas_common::config::SnowflakeConfig;
use gwas_common::{
    DocumentSummary, ImagePageRef, PageRecord, TextPageStat, TraitRecord, TRAIT_FIELDS,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use super::{trait_field_columns, Warehouse, WarehouseError};

const USER_AGENT: &str = concat!("gwas-viewer/", env!("CARGO_PKG_VERSION"));
const STATEMENTS_PATH: &str = "/api/v2/statements";
const POLL_INTERVAL_MS: u64 = 500;

/// One positional binding
#[derive(Debug, Clone, Serialize)]
struct Binding<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    value: &'a str,
}

#[derive(Debug, Serialize)]
struct StatementRequest<'a> {
    statement: &'a str,
    timeout: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    warehouse: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    bindings: BTreeMap<String, Binding<'a>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatementResponse {
    #[serde(default)]
    statement_handle: Option<String>,
    #[serde(default)]
    statement_status_url: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    result_set_meta_data: Option<ResultSetMetaData>,
    #[serde(default)]
    data: Vec<Vec<Option<String>>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResultSetMetaData {
    #[serde(default)]
    row_type: Vec<ColumnType>,
    #[serde(default)]
    partition_info: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ColumnType {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// Decoded statement result: upper-cased column names and string cells
#[derive(Debug, Clone, Default)]
pub struct StatementResult {
    columns: HashMap<String, usize>,
    rows: Vec<Vec<Option<String>>>,
}

impl StatementResult {
    fn from_parts(row_type: &[ColumnType], rows: Vec<Vec<Option<String>>>) -> Self {
        let columns = row_type
            .iter()
            .enumerate()
            .map(|(i, c)| (c.name.to_ascii_uppercase(), i))
            .collect();
        Self { columns, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = ResultRow<'_>> {
        self.rows.iter().map(move |values| ResultRow {
            columns: &self.columns,
            values,
        })
    }
}

/// Borrowed view of one result row
#[derive(Debug, Clone, Copy)]
pub struct ResultRow<'a> {
    columns: &'a HashMap<String, usize>,
    values: &'a [Option<String>],
}

impl<'a> ResultRow<'a> {
    /// Cell by column name (case-insensitive); `None` for SQL NULL
    pub fn text(&self, column: &str) -> Option<&'a str> {
        let index = *self.columns.get(&column.to_ascii_uppercase())?;
        self.values.get(index)?.as_deref()
    }

    pub fn required(&self, column: &str) -> Result<&'a str, WarehouseError> {
        self.text(column)
            .ok_or_else(|| WarehouseError::Decode(format!("column {} is null or missing", column)))
    }

    pub fn int(&self, column: &str) -> Result<Option<i64>, WarehouseError> {
        self.text(column).map(parse_int).transpose()
    }

    pub fn float(&self, column: &str) -> Result<Option<f64>, WarehouseError> {
        self.text(column)
            .map(|v| {
                v.trim()
                    .parse::<f64>()
                    .map_err(|_| WarehouseError::Decode(format!("{} is not a number: {}", column, v)))
            })
            .transpose()
    }

    pub fn boolean(&self, column: &str) -> Result<bool, WarehouseError> {
        match self.text(column) {
            None => Ok(false),
            Some(v) => parse_bool(v),
        }
    }
}

fn parse_int(value: &str) -> Result<i64, WarehouseError> {
    let value = value.trim();
    value
        .parse::<i64>()
        .or_else(|_| value.parse::<f64>().map(|f| f as i64))
        .map_err(|_| WarehouseError::Decode(format!("not an integer: {}", value)))
}

fn parse_bool(value: &str) -> Result<bool, WarehouseError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        other => Err(WarehouseError::Decode(format!("not a boolean: {}", other))),
    }
}

/// Parse a timestamp cell
///
/// Accepts `"1712345678.123000000"`, `"1712345678.123000000 1440"`
/// (TIMESTAMP_TZ, offset ignored since the epoch part is already UTC) and
/// RFC 3339 text.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, WarehouseError> {
    let value = value.trim();
    let epoch = value.split_whitespace().next().unwrap_or_default();

    if let Ok(seconds) = epoch.parse::<f64>() {
        let whole = seconds.trunc() as i64;
        let nanos = ((seconds - seconds.trunc()) * 1e9).round() as u32;
        return Utc
            .timestamp_opt(whole, nanos.min(999_999_999))
            .single()
            .ok_or_else(|| WarehouseError::Decode(format!("timestamp out of range: {}", value)));
    }

    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| WarehouseError::Decode(format!("not a timestamp: {}", value)))
}

/// Parse a VECTOR cell (`"[0.12, -0.4, ...]"`)
pub fn parse_vector(value: &str) -> Result<Vec<f32>, WarehouseError> {
    serde_json::from_str(value)
        .map_err(|e| WarehouseError::Decode(format!("not a vector: {}", e)))
}

/// Snowflake SQL API client
pub struct SnowflakeClient {
    http_client: reqwest::Client,
    account_url: String,
    token: String,
    token_type: String,
    warehouse: Option<String>,
    role: Option<String>,
    timeout: Duration,
}

impl SnowflakeClient {
    /// Build a client from config; the bearer token is read from `token_env`
    pub fn from_config(config: &SnowflakeConfig) -> Result<Self, WarehouseError> {
        let account_url = config
            .account_url
            .as_deref()
            .map(|u| u.trim().trim_end_matches('/').to_string())
            .filter(|u| !u.is_empty())
            .ok_or_else(|| WarehouseError::Unavailable("snowflake.account_url is not set".to_string()))?;

        let token = std::env::var(&config.token_env).map_err(|_| {
            WarehouseError::Unavailable(format!("{} is not set in the environment", config.token_env))
        })?;

        Self::new(
            account_url,
            token,
            config.token_type.clone(),
            config.warehouse.clone(),
            config.role.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn new(
        account_url: String,
        token: String,
        token_type: String,
        warehouse: Option<String>,
        role: Option<String>,
        timeout: Duration,
    ) -> Result<Self, WarehouseError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout + Duration::from_secs(10))
            .build()?;

        Ok(Self {
            http_client,
            account_url,
            token,
            token_type,
            warehouse,
            role,
            timeout,
        })
    }

    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        self.http_client
            .request(method, url)
            .bearer_auth(&self.token)
            .header("X-Snowflake-Authorization-Token-Type", &self.token_type)
            .header(reqwest::header::ACCEPT, "application/json")
    }

    fn absolute(&self, path_or_url: &str) -> String {
        if path_or_url.starts_with("http://") || path_or_url.starts_with("https://") {
            path_or_url.to_string()
        } else {
            format!("{}{}", self.account_url, path_or_url)
        }
    }

    /// Run one statement with TEXT bindings and collect every partition
    pub async fn execute(&self, sql: &str, params: &[&str]) -> Result<StatementResult, WarehouseError> {
        let bindings = params
            .iter()
            .enumerate()
            .map(|(i, value)| ((i + 1).to_string(), Binding { kind: "TEXT", value: *value }))
            .collect();

        let body = StatementRequest {
            statement: sql,
            timeout: self.timeout.as_secs(),
            warehouse: self.warehouse.as_deref(),
            role: self.role.as_deref(),
            bindings,
        };

        debug!(params = params.len(), "Submitting statement to Snowflake");

        let response = self
            .request(reqwest::Method::POST, &self.absolute(STATEMENTS_PATH))
            .json(&body)
            .send()
            .await?;

        let first = self.finish(response).await?;
        self.collect_partitions(first).await
    }

    /// Resolve a response to a completed statement, polling while it runs
    async fn finish(&self, response: reqwest::Response) -> Result<StatementResponse, WarehouseError> {
        let started = Instant::now();
        let mut response = response;

        loop {
            let status = response.status();

            if status == reqwest::StatusCode::ACCEPTED {
                let pending: StatementResponse = response.json().await?;
                let handle = pending.statement_handle.clone().unwrap_or_default();
                let status_url = match pending.statement_status_url {
                    Some(url) => url,
                    None if !handle.is_empty() => format!("{}/{}", STATEMENTS_PATH, handle),
                    None => {
                        return Err(WarehouseError::Decode(
                            "202 response without a statement handle".to_string(),
                        ))
                    }
                };

                if started.elapsed() >= self.timeout {
                    return Err(WarehouseError::Timeout(handle));
                }

                debug!(handle = %handle, "Statement still running; polling");
                tokio::time::sleep(Duration::from_millis(POLL_INTERVAL_MS)).await;
                response = self
                    .request(reqwest::Method::GET, &self.absolute(&status_url))
                    .send()
                    .await?;
                continue;
            }

            if !status.is_success() {
                let text = response.text().await.unwrap_or_default();
                let message = serde_json::from_str::<ErrorBody>(&text)
                    .ok()
                    .and_then(|b| b.message)
                    .unwrap_or(text);
                warn!(status = status.as_u16(), "Snowflake statement failed: {}", message);
                return Err(WarehouseError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            return Ok(response.json().await?);
        }
    }

    async fn collect_partitions(&self, first: StatementResponse) -> Result<StatementResult, WarehouseError> {
        let meta = first.result_set_meta_data.ok_or_else(|| {
            WarehouseError::Decode(
                first
                    .message
                    .unwrap_or_else(|| "response has no result set metadata".to_string()),
            )
        })?;

        let mut rows = first.data;
        let partitions = meta.partition_info.len();

        if partitions > 1 {
            let handle = first
                .statement_handle
                .ok_or_else(|| WarehouseError::Decode("partitioned result without handle".to_string()))?;

            for partition in 1..partitions {
                let url = format!(
                    "{}{}/{}?partition={}",
                    self.account_url, STATEMENTS_PATH, handle, partition
                );
                let page: StatementResponse = self.finish(self.request(reqwest::Method::GET, &url).send().await?).await?;
                rows.extend(page.data);
            }
            debug!(partitions, rows = rows.len(), "Fetched partitioned result");
        }

        Ok(StatementResult::from_parts(&meta.row_type, rows))
    }
}

/// Warehouse backed by the Snowflake SQL API
#[derive(Clone)]
pub struct SnowflakeWarehouse {
    client: Arc<SnowflakeClient>,
}

impl SnowflakeWarehouse {
    pub fn new(client: Arc<SnowflakeClient>) -> Self {
        Self { client }
    }
}

fn document_from_row(row: ResultRow<'_>) -> Result<DocumentSummary, WarehouseError> {
    Ok(DocumentSummary {
        document_id: row.required("DOCUMENT_ID")?.to_string(),
        pdf_filename: row.required("PDF_FILENAME")?.to_string(),
        page_count: row.int("PAGE_COUNT")?.unwrap_or(0),
        extraction_timestamp: parse_timestamp(row.required("EXTRACTION_TIMESTAMP")?)?,
        file_url: row.text("FILE_URL").unwrap_or_default().to_string(),
    })
}

fn trait_record_from_row(document_id: &str, row: ResultRow<'_>) -> Result<TraitRecord, WarehouseError> {
    let mut record = TraitRecord::new(document_id);
    for field in TRAIT_FIELDS {
        record.set(field, row.text(field.column()).map(str::to_string));
    }
    record.extraction_source = row.text("EXTRACTION_SOURCE").map(str::to_string);
    record.field_citations = row.text("FIELD_CITATIONS").map(str::to_string);
    record.traits_extracted = row.int("TRAITS_EXTRACTED")?;
    record.traits_not_reported = row.int("TRAITS_NOT_REPORTED")?;
    record.extraction_accuracy_pct = row.float("EXTRACTION_ACCURACY_PCT")?;
    Ok(record)
}

fn page_from_row(row: ResultRow<'_>) -> Result<PageRecord, WarehouseError> {
    Ok(PageRecord {
        page_number: row.int("PAGE_NUMBER")?.unwrap_or(0),
        page_text: row.text("PAGE_TEXT").map(str::to_string),
        image_path: row.text("IMAGE_PATH").map(str::to_string),
        has_text: row.boolean("HAS_TEXT")?,
        has_image: row.boolean("HAS_IMAGE")?,
    })
}

#[async_trait]
impl Warehouse for SnowflakeWarehouse {
    async fn list_documents(&self) -> Result<Vec<DocumentSummary>, WarehouseError> {
        let result = self
            .client
            .execute(
                r#"
                SELECT
                    DOCUMENT_ID AS document_id,
                    FILE_NAME AS pdf_filename,
                    TOTAL_PAGES AS page_count,
                    CREATED_AT AS extraction_timestamp,
                    FILE_PATH AS file_url
                FROM GWAS.PDF_RAW.PARSED_DOCUMENTS
                ORDER BY CREATED_AT DESC
                "#,
                &[],
            )
            .await?;

        debug!(count = result.len(), "Loaded documents from Snowflake");
        result.rows().map(document_from_row).collect()
    }

    async fn trait_record(&self, document_id: &str) -> Result<Option<TraitRecord>, WarehouseError> {
        let sql = format!(
            r#"
            SELECT
                {},
                extraction_source,
                field_citations,
                traits_extracted,
                traits_not_reported,
                extraction_accuracy_pct
            FROM GWAS.PDF_PROCESSING.GWAS_TRAIT_ANALYTICS
            WHERE document_id = ?
            LIMIT 1
            "#,
            trait_field_columns()
        );

        let result = self.client.execute(&sql, &[document_id]).await?;
        let record = result
            .rows()
            .next()
            .map(|row| trait_record_from_row(document_id, row))
            .transpose();
        record
    }

    async fn document_pages(&self, document_id: &str) -> Result<Vec<PageRecord>, WarehouseError> {
        let result = self
            .client
            .execute(
                r#"
                SELECT page_number, page_text, image_path, has_text, has_image
                FROM GWAS.PDF_PROCESSING.MULTIMODAL_PAGES
                WHERE document_id = ?
                ORDER BY page_number
                "#,
                &[document_id],
            )
            .await?;

        result.rows().map(page_from_row).collect()
    }

    async fn text_page_lengths(&self, document_id: &str) -> Result<Vec<TextPageStat>, WarehouseError> {
        let result = self
            .client
            .execute(
                r#"
                SELECT page_number, COALESCE(LENGTH(page_text), 0) AS text_length
                FROM GWAS.PDF_PROCESSING.TEXT_PAGES
                WHERE document_id = ?
                ORDER BY page_number
                "#,
                &[document_id],
            )
            .await?;

        result
            .rows()
            .map(|row| {
                Ok(TextPageStat {
                    page_number: row.int("PAGE_NUMBER")?.unwrap_or(0),
                    text_length: row.int("TEXT_LENGTH")?.unwrap_or(0),
                })
            })
            .collect()
    }

    async fn image_pages(&self, document_id: &str) -> Result<Vec<ImagePageRef>, WarehouseError> {
        let result = self
            .client
            .execute(
                r#"
                SELECT page_number, image_file_path AS image_path
                FROM GWAS.PDF_PROCESSING.IMAGE_PAGES
                WHERE document_id = ?
                ORDER BY page_number
                "#,
                &[document_id],
            )
            .await?;

        result
            .rows()
            .map(|row| {
                Ok(ImagePageRef {
                    page_number: row.int("PAGE_NUMBER")?.unwrap_or(0),
                    image_path: row.text("IMAGE_PATH").unwrap_or_default().to_string(),
                })
            })
            .collect()
    }
}
