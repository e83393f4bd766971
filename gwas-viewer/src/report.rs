//! Per-document reports shared by the JSON API and the HTML views
//!
//! Handlers fetch rows through the [`Warehouse`] and hand them to the pure
//! scoring functions of `gwas-common`; the results are bundled here so both
//! surfaces show the same numbers.

use gwas_common::accuracy::{reconcile, AccuracyReport};
use gwas_common::citations::confidence_summary;
use gwas_common::completeness::{classify_record, score_record};
use gwas_common::display::{pipeline_label, source_title};
use gwas_common::{
    Completeness, DocumentSummary, FieldStatus, SourceCount, TextPageStat, TraitField,
    TraitRecord,
};
use serde::Serialize;

use crate::warehouse::{Warehouse, WarehouseError};

/// Evidence type shown when the record has none
pub const DEFAULT_EVIDENCE_TYPE: &str = "GWAS";

/// One field card
#[derive(Debug, Clone, Serialize)]
pub struct FieldEntry {
    pub field: TraitField,
    pub label: &'static str,
    pub icon: &'static str,
    #[serde(flatten)]
    pub status: FieldStatus,
}

/// Everything the traits page and `/api/documents/:id/traits` show
#[derive(Debug, Clone, Serialize)]
pub struct TraitReport {
    pub record: TraitRecord,
    pub fields: Vec<FieldEntry>,
    pub completeness: Completeness,
    pub accuracy: AccuracyReport,
    pub sources: Vec<SourceCount>,
    pub confidence_summary: String,
    pub pipeline_label: &'static str,
    pub source_title: String,
}

impl TraitReport {
    pub fn build(record: TraitRecord, divergence_threshold_pct: f64) -> Self {
        let completeness = score_record(&record);
        let accuracy = reconcile(
            &record.document_id,
            &completeness,
            record.extraction_accuracy_pct,
            divergence_threshold_pct,
        );

        let fields = classify_record(&record)
            .into_iter()
            .map(|(field, status)| FieldEntry {
                field,
                label: field.label(),
                icon: field.icon(),
                status,
            })
            .collect();

        Self {
            sources: gwas_common::tally_sources(record.field_citations.as_deref()),
            confidence_summary: confidence_summary(record.field_citations.as_deref()),
            pipeline_label: pipeline_label(record.extraction_source.as_deref()),
            source_title: source_title(record.extraction_source.as_deref()),
            fields,
            completeness,
            accuracy,
            record,
        }
    }

    /// Evidence type when found, `GWAS` for blanks and absence sentinels
    pub fn evidence_type(&self) -> &str {
        self.fields
            .iter()
            .find(|entry| entry.field == TraitField::EvidenceType)
            .and_then(|entry| match &entry.status {
                FieldStatus::Found(value) if !value.trim().is_empty() => Some(value.as_str()),
                _ => None,
            })
            .unwrap_or(DEFAULT_EVIDENCE_TYPE)
    }
}

/// Page counts of the processing-stats strip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageCounts {
    /// Page count recorded for the source PDF
    pub total_pages: i64,
    pub text_pages: usize,
    pub image_pages: usize,
    pub multimodal_pages: usize,
}

/// Analytics page and `/api/documents/:id/analytics`
#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsReport {
    pub document_id: String,
    pub traits: Option<TraitReport>,
    pub page_counts: PageCounts,
    pub text_lengths: Vec<TextPageStat>,
}

pub async fn load_trait_report(
    warehouse: &dyn Warehouse,
    document_id: &str,
    divergence_threshold_pct: f64,
) -> Result<Option<TraitReport>, WarehouseError> {
    Ok(warehouse
        .trait_record(document_id)
        .await?
        .map(|record| TraitReport::build(record, divergence_threshold_pct)))
}

pub async fn load_analytics(
    warehouse: &dyn Warehouse,
    document: &DocumentSummary,
    divergence_threshold_pct: f64,
) -> Result<AnalyticsReport, WarehouseError> {
    let document_id = document.document_id.as_str();

    let traits = load_trait_report(warehouse, document_id, divergence_threshold_pct).await?;
    let text_lengths = warehouse.text_page_lengths(document_id).await?;
    let image_pages = warehouse.image_pages(document_id).await?;
    let pages = warehouse.document_pages(document_id).await?;

    Ok(AnalyticsReport {
        document_id: document_id.to_string(),
        traits,
        page_counts: PageCounts {
            total_pages: document.page_count,
            text_pages: text_lengths.len(),
            image_pages: image_pages.len(),
            multimodal_pages: pages.len(),
        },
        text_lengths,
    })
}
