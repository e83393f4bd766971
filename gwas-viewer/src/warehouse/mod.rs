//! Warehouse access layer
//!
//! All reads go through the [`Warehouse`] trait. Two backends exist:
//! - [`sqlite::SqliteWarehouse`]: read-only local mirror of the warehouse tables
//! - [`snowflake::SnowflakeWarehouse`]: Snowflake SQL API
//!
//! [`cache::CachedWarehouse`] memoizes any backend for a fixed TTL.

use async_trait::async_trait;
use gwas_common::{DocumentSummary, ImagePageRef, PageRecord, TextPageStat, TraitRecord, TRAIT_FIELDS};
use thiserror::Error;

pub mod cache;
pub mod snowflake;
pub mod sqlite;

pub use cache::CachedWarehouse;
pub use snowflake::{SnowflakeClient, SnowflakeWarehouse};
pub use sqlite::SqliteWarehouse;

/// Warehouse read errors
#[derive(Debug, Error)]
pub enum WarehouseError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("SQL API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("unexpected result shape: {0}")]
    Decode(String),

    #[error("statement {0} did not finish in time")]
    Timeout(String),

    #[error("{0}")]
    Unavailable(String),
}

/// Read-only queries against the five warehouse tables
#[async_trait]
pub trait Warehouse: Send + Sync {
    /// All parsed documents, newest first
    async fn list_documents(&self) -> Result<Vec<DocumentSummary>, WarehouseError>;

    /// Trait row for a document, if one was extracted
    async fn trait_record(&self, document_id: &str) -> Result<Option<TraitRecord>, WarehouseError>;

    /// Multimodal pages ordered by page number
    async fn document_pages(&self, document_id: &str) -> Result<Vec<PageRecord>, WarehouseError>;

    /// Text length per text page, ordered by page number
    async fn text_page_lengths(&self, document_id: &str) -> Result<Vec<TextPageStat>, WarehouseError>;

    /// Rendered page images, ordered by page number
    async fn image_pages(&self, document_id: &str) -> Result<Vec<ImagePageRef>, WarehouseError>;
}

/// Comma-separated trait field columns, taken from the shared field table
pub(crate) fn trait_field_columns() -> String {
    TRAIT_FIELDS
        .iter()
        .map(|f| f.column())
        .collect::<Vec<_>>()
        .join(", ")
}
