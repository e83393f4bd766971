//! Read-only records produced by the upstream extraction pipeline

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::fields::TraitField;

/// One source document (`PARSED_DOCUMENTS`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub document_id: String,
    pub pdf_filename: String,
    pub page_count: i64,
    pub extraction_timestamp: DateTime<Utc>,
    /// Stage location of the source PDF
    pub file_url: String,
}

impl DocumentSummary {
    /// Selector label: `filename (first-8-of-id...)`
    pub fn selector_label(&self) -> String {
        let short: String = self.document_id.chars().take(8).collect();
        format!("{} ({}...)", self.pdf_filename, short)
    }
}

/// Extracted trait row for a document (`GWAS_TRAIT_ANALYTICS`)
///
/// Field values are kept exactly as delivered, sentinels included. A field
/// with no entry in `values` was NULL upstream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TraitRecord {
    pub document_id: String,
    pub values: BTreeMap<TraitField, String>,
    pub extraction_source: Option<String>,
    /// JSON object of field name → provenance string
    pub field_citations: Option<String>,
    pub traits_extracted: Option<i64>,
    pub traits_not_reported: Option<i64>,
    /// Accuracy reported by the pipeline; informational only
    pub extraction_accuracy_pct: Option<f64>,
}

impl TraitRecord {
    pub fn new(document_id: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
            ..Default::default()
        }
    }

    /// Raw value of a field, if present
    pub fn value(&self, field: TraitField) -> Option<&str> {
        self.values.get(&field).map(String::as_str)
    }

    /// Set a field value, or clear it with `None`
    pub fn set(&mut self, field: TraitField, value: Option<String>) {
        match value {
            Some(v) => {
                self.values.insert(field, v);
            }
            None => {
                self.values.remove(&field);
            }
        }
    }

    /// Builder-style variant of [`TraitRecord::set`]
    pub fn with(mut self, field: TraitField, value: impl Into<String>) -> Self {
        self.values.insert(field, value.into());
        self
    }
}

/// Per-page multimodal record (`MULTIMODAL_PAGES`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRecord {
    pub page_number: i64,
    pub page_text: Option<String>,
    pub image_path: Option<String>,
    pub has_text: bool,
    pub has_image: bool,
}

impl PageRecord {
    /// Characters of page text, zero when missing
    pub fn text_length(&self) -> usize {
        self.page_text.as_deref().map_or(0, |t| t.chars().count())
    }

    /// Both text and image were extracted for this page
    pub fn is_complete(&self) -> bool {
        self.has_text && self.has_image
    }
}

/// Text length of one page (`TEXT_PAGES`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextPageStat {
    pub page_number: i64,
    pub text_length: i64,
}

/// Rendered page image location (`IMAGE_PAGES`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImagePageRef {
    pub page_number: i64,
    pub image_path: String,
}

/// One semantic-search result, in ranking order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub page_number: Option<i64>,
    pub page_text: String,
}
