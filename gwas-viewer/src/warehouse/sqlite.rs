//! SQLite mirror of the warehouse tables
//!
//! The mirror keeps the upstream column names, lower-cased, in five tables:
//! `parsed_documents`, `gwas_trait_analytics`, `multimodal_pages`,
//! `text_pages` and `image_pages`. The viewer only ever opens it read-only.

use anyhow::Context;
use async_trait::async_trait;
use gwas_common::{
    DocumentSummary, ImagePageRef, PageRecord, TextPageStat, TraitRecord, TRAIT_FIELDS,
};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::path::Path;
use tracing::debug;

use super::{trait_field_columns, Warehouse, WarehouseError};

/// Schema of the mirror, used by loaders and tests to create it
pub const MIRROR_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS parsed_documents (
    document_id TEXT PRIMARY KEY,
    file_name TEXT NOT NULL,
    total_pages INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    file_path TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS gwas_trait_analytics (
    document_id TEXT NOT NULL REFERENCES parsed_documents(document_id),
    trait TEXT,
    germplasm_name TEXT,
    genome_version TEXT,
    chromosome TEXT,
    physical_position TEXT,
    gene TEXT,
    snp_name TEXT,
    variant_id TEXT,
    variant_type TEXT,
    effect_size TEXT,
    gwas_model TEXT,
    evidence_type TEXT,
    allele TEXT,
    annotation TEXT,
    candidate_region TEXT,
    extraction_source TEXT,
    field_citations TEXT,
    traits_extracted INTEGER,
    traits_not_reported INTEGER,
    extraction_accuracy_pct REAL
);

CREATE TABLE IF NOT EXISTS multimodal_pages (
    document_id TEXT NOT NULL REFERENCES parsed_documents(document_id),
    page_number INTEGER NOT NULL,
    page_text TEXT,
    image_path TEXT,
    has_text INTEGER NOT NULL DEFAULT 0,
    has_image INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS text_pages (
    document_id TEXT NOT NULL REFERENCES parsed_documents(document_id),
    page_number INTEGER NOT NULL,
    page_text TEXT
);

CREATE TABLE IF NOT EXISTS image_pages (
    document_id TEXT NOT NULL REFERENCES parsed_documents(document_id),
    page_number INTEGER NOT NULL,
    image_file_path TEXT NOT NULL
);
"#;

/// Connect to the mirror in read-only mode
///
/// Uses SQLite `mode=ro` so no statement issued by the viewer can write.
pub async fn connect_readonly(db_path: &Path) -> anyhow::Result<SqlitePool> {
    if !db_path.exists() {
        anyhow::bail!(
            "Warehouse mirror not found: {}\nLoad the extraction results into it first.",
            db_path.display()
        );
    }

    let db_url = format!("sqlite://{}?mode=ro", db_path.display());

    SqlitePool::connect(&db_url)
        .await
        .context("Failed to connect to warehouse mirror in read-only mode")
}

/// Warehouse backed by the SQLite mirror
#[derive(Clone)]
pub struct SqliteWarehouse {
    pool: SqlitePool,
}

impl SqliteWarehouse {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn trait_record_from_row(document_id: &str, row: &SqliteRow) -> Result<TraitRecord, sqlx::Error> {
    let mut record = TraitRecord::new(document_id);
    for field in TRAIT_FIELDS {
        record.set(field, row.try_get::<Option<String>, _>(field.column())?);
    }
    record.extraction_source = row.try_get("extraction_source")?;
    record.field_citations = row.try_get("field_citations")?;
    record.traits_extracted = row.try_get("traits_extracted")?;
    record.traits_not_reported = row.try_get("traits_not_reported")?;
    record.extraction_accuracy_pct = row.try_get("extraction_accuracy_pct")?;
    Ok(record)
}

#[async_trait]
impl Warehouse for SqliteWarehouse {
    async fn list_documents(&self) -> Result<Vec<DocumentSummary>, WarehouseError> {
        let rows = sqlx::query(
            r#"
            SELECT
                document_id,
                file_name AS pdf_filename,
                total_pages AS page_count,
                created_at AS extraction_timestamp,
                file_path AS file_url
            FROM parsed_documents
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        debug!(count = rows.len(), "Loaded documents from mirror");

        rows.iter()
            .map(|row| {
                Ok(DocumentSummary {
                    document_id: row.try_get("document_id")?,
                    pdf_filename: row.try_get("pdf_filename")?,
                    page_count: row.try_get("page_count")?,
                    extraction_timestamp: row.try_get("extraction_timestamp")?,
                    file_url: row.try_get("file_url")?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()
            .map_err(WarehouseError::from)
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
            FROM gwas_trait_analytics
            WHERE document_id = ?
            LIMIT 1
            "#,
            trait_field_columns()
        );

        let row = sqlx::query(&sql)
            .bind(document_id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(trait_record_from_row(document_id, &row)?)),
            None => Ok(None),
        }
    }

    async fn document_pages(&self, document_id: &str) -> Result<Vec<PageRecord>, WarehouseError> {
        let rows = sqlx::query(
            r#"
            SELECT page_number, page_text, image_path, has_text, has_image
            FROM multimodal_pages
            WHERE document_id = ?
            ORDER BY page_number
            "#,
        )
        .bind(document_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(PageRecord {
                    page_number: row.try_get("page_number")?,
                    page_text: row.try_get("page_text")?,
                    image_path: row.try_get("image_path")?,
                    has_text: row.try_get("has_text")?,
                    has_image: row.try_get("has_image")?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()
            .map_err(WarehouseError::from)
    }

    async fn text_page_lengths(&self, document_id: &str) -> Result<Vec<TextPageStat>, WarehouseError> {
        let rows = sqlx::query_as::<_, (i64, i64)>(
            r#"
            SELECT page_number, COALESCE(LENGTH(page_text), 0) AS text_length
            FROM text_pages
            WHERE document_id = ?
            ORDER BY page_number
            "#,
        )
        .bind(document_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(page_number, text_length)| TextPageStat {
                page_number,
                text_length,
            })
            .collect())
    }

    async fn image_pages(&self, document_id: &str) -> Result<Vec<ImagePageRef>, WarehouseError> {
        let rows = sqlx::query_as::<_, (i64, String)>(
            r#"
            SELECT page_number, image_file_path AS image_path
            FROM image_pages
            WHERE document_id = ?
            ORDER BY page_number
            "#,
        )
        .bind(document_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(page_number, image_path)| ImagePageRef {
                page_number,
                image_path,
            })
            .collect())
    }
}
