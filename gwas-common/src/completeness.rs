//! Completeness Scorer
//!
//! Counts how many trait fields hold a real value rather than an absence
//! sentinel, and derives an accuracy percentage from the count.
//!
//! # Classification
//! A raw value is "not found" when it is missing, or when, after stripping
//! surrounding quotes, it case-insensitively:
//! - is empty, `none`, `null` or `not in paper`
//! - contains `not_found` or `not found`
//!
//! Every other value counts as found, whitespace-only values included, so
//! unfamiliar shapes degrade to "found" and only explicit sentinels count as
//! absence.
//!
//! # Example
//! ```
//! use std::collections::HashMap;
//! use gwas_common::completeness::score;
//!
//! let mut row = HashMap::new();
//! row.insert("trait".to_string(), "Plant height".to_string());
//! row.insert("gene".to_string(), "NOT_FOUND".to_string());
//! row.insert("chromosome".to_string(), String::new());
//!
//! let result = score(&row, &["trait", "gene", "chromosome"]);
//! assert_eq!(result.found_count, 1);
//! assert_eq!(result.total, 3);
//! assert!((result.accuracy_pct - 33.33).abs() < 0.01);
//! ```

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use crate::fields::{TraitField, TRAIT_FIELDS};
use crate::models::TraitRecord;

/// Lower-cased values that mark a field as absent
const ABSENT_VALUES: [&str; 4] = ["none", "null", "not in paper", ""];

/// Lower-cased substrings that mark a field as absent
const ABSENT_MARKERS: [&str; 2] = ["not_found", "not found"];

/// Anything a field value can be read from by column name
///
/// A name the source does not know is reported as `None` and is scored
/// exactly like an explicit absence sentinel.
pub trait FieldLookup {
    fn field_value(&self, name: &str) -> Option<&str>;
}

impl FieldLookup for TraitRecord {
    fn field_value(&self, name: &str) -> Option<&str> {
        TraitField::from_column(name).and_then(|field| self.value(field))
    }
}

impl FieldLookup for HashMap<String, String> {
    fn field_value(&self, name: &str) -> Option<&str> {
        match self.get(name) {
            Some(value) => Some(value.as_str()),
            None => lookup_ignoring_case(self.iter().map(|(k, v)| (k.as_str(), Some(v.as_str()))), name),
        }
    }
}

impl FieldLookup for HashMap<String, Option<String>> {
    fn field_value(&self, name: &str) -> Option<&str> {
        match self.get(name) {
            Some(value) => value.as_deref(),
            None => lookup_ignoring_case(self.iter().map(|(k, v)| (k.as_str(), v.as_deref())), name),
        }
    }
}

impl FieldLookup for BTreeMap<String, Option<String>> {
    fn field_value(&self, name: &str) -> Option<&str> {
        match self.get(name) {
            Some(value) => value.as_deref(),
            None => lookup_ignoring_case(self.iter().map(|(k, v)| (k.as_str(), v.as_deref())), name),
        }
    }
}

/// Fallback when the exact key is absent; the smallest matching key wins
fn lookup_ignoring_case<'a>(
    entries: impl Iterator<Item = (&'a str, Option<&'a str>)>,
    name: &str,
) -> Option<&'a str> {
    entries
        .filter(|(key, _)| key.eq_ignore_ascii_case(name))
        .min_by_key(|(key, _)| *key)
        .and_then(|(_, value)| value)
}

/// Classification of a single field value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum FieldStatus {
    /// Real value, with surrounding quotes removed
    Found(String),
    NotFound,
}

impl FieldStatus {
    pub fn is_found(&self) -> bool {
        matches!(self, FieldStatus::Found(_))
    }
}

/// Result of scoring a record
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Completeness {
    pub found_count: usize,
    pub total: usize,
    pub accuracy_pct: f64,
}

impl Completeness {
    /// Fields holding an absence sentinel (or nothing at all)
    pub fn not_reported(&self) -> usize {
        self.total - self.found_count
    }
}

/// Remove leading and trailing quote characters from an upstream value
///
/// Values sometimes arrive JSON-quoted (`"\"NOT_FOUND\""`) or SQL-quoted.
/// Whitespace is kept.
pub fn strip_quotes(raw: &str) -> &str {
    raw.trim_matches('"').trim_matches('\'')
}

/// Classify one raw field value
pub fn classify(raw: Option<&str>) -> FieldStatus {
    let Some(raw) = raw else {
        return FieldStatus::NotFound;
    };

    let cleaned = strip_quotes(raw);
    let lowered = cleaned.to_lowercase();

    let absent = ABSENT_VALUES.contains(&lowered.as_str())
        || ABSENT_MARKERS.iter().any(|marker| lowered.contains(marker));

    if absent {
        FieldStatus::NotFound
    } else {
        FieldStatus::Found(cleaned.to_string())
    }
}

/// Score a record over an ordered list of field names
pub fn score<R, F>(record: &R, fields: &[F]) -> Completeness
where
    R: FieldLookup + ?Sized,
    F: AsRef<str>,
{
    let found_count = fields
        .iter()
        .filter(|field| classify(record.field_value(field.as_ref())).is_found())
        .count();
    let total = fields.len();

    let accuracy_pct = if total > 0 {
        100.0 * found_count as f64 / total as f64
    } else {
        0.0
    };

    Completeness {
        found_count,
        total,
        accuracy_pct,
    }
}

/// Score a trait record over the shared field table
pub fn score_record(record: &TraitRecord) -> Completeness {
    score(record, &TRAIT_FIELDS)
}

/// Classify every field of the shared table, in table order
pub fn classify_record(record: &TraitRecord) -> Vec<(TraitField, FieldStatus)> {
    TRAIT_FIELDS
        .iter()
        .map(|&field| (field, classify(record.value(field))))
        .collect()
}
