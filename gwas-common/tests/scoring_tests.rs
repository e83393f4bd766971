//! Property tests for completeness scoring and citation tally
//!
//! Covers idempotence, the all-found / all-sentinel extremes, the empty field
//! list, quote stripping, and the tally's degrade-to-zero behavior.

use gwas_common::citations::{tally, tally_sources};
use gwas_common::completeness::{classify, score, score_record};
use gwas_common::{TraitField, TraitRecord, TRAIT_FIELDS};
use std::collections::HashMap;

fn record_with_all(value: &str) -> TraitRecord {
    TRAIT_FIELDS
        .iter()
        .fold(TraitRecord::new("doc-props"), |record, &field| record.with(field, value))
}

#[test]
fn test_score_is_idempotent() {
    let record = TraitRecord::new("doc-1")
        .with(TraitField::Trait, "Grain weight")
        .with(TraitField::Gene, "\"NOT_FOUND\"")
        .with(TraitField::Allele, "A/G");

    let first = score_record(&record);
    let second = score_record(&record);
    assert_eq!(first, second);
}

#[test]
fn test_all_real_values_score_full() {
    let record = TRAIT_FIELDS.iter().fold(TraitRecord::new("doc-full"), |record, &field| {
        record.with(field, format!("value for {}", field.label()))
    });

    let result = score_record(&record);
    assert_eq!(result.found_count, result.total);
    assert_eq!(result.total, 15);
    assert_eq!(result.accuracy_pct, 100.0);
}

#[test]
fn test_all_sentinels_score_zero() {
    let result = score_record(&record_with_all("NOT_FOUND"));
    assert_eq!(result.found_count, 0);
    assert_eq!(result.accuracy_pct, 0.0);
}

#[test]
fn test_missing_record_fields_score_zero() {
    let result = score_record(&TraitRecord::new("doc-empty"));
    assert_eq!(result.found_count, 0);
    assert_eq!(result.total, 15);
    assert_eq!(result.not_reported(), 15);
}

#[test]
fn test_empty_field_list_is_zero_not_error() {
    let row: HashMap<String, String> = HashMap::new();
    let fields: Vec<String> = Vec::new();
    let result = score(&row, &fields);
    assert_eq!(result.total, 0);
    assert_eq!(result.accuracy_pct, 0.0);
}

#[test]
fn test_quoted_and_unquoted_sentinels_match() {
    assert_eq!(classify(Some("'\"NOT_FOUND\"'")), classify(Some("NOT_FOUND")));
    assert_eq!(classify(Some("\"NOT_FOUND\"")), classify(Some("NOT_FOUND")));
}

#[test]
fn test_reference_example_over_map() {
    let mut row = HashMap::new();
    row.insert("trait".to_string(), "Plant height".to_string());
    row.insert("gene".to_string(), "NOT_FOUND".to_string());
    row.insert("chromosome".to_string(), String::new());

    let result = score(&row, &["trait", "gene", "chromosome"]);
    assert_eq!(result.found_count, 1);
    assert_eq!(result.total, 3);
    assert!((result.accuracy_pct - 33.33).abs() < 0.01);
}

#[test]
fn test_tally_none_is_all_zero() {
    let counts = tally(None, &["Phase1", "Phase2", "LLM"]);
    assert_eq!(counts.len(), 3);
    assert!(counts.values().all(|&c| c == 0));
}

#[test]
fn test_tally_reference_example() {
    let json = r#"{"gene":"Phase1 extraction","trait":"Phase1/Phase2 consensus"}"#;
    let counts = tally(Some(json), &["Phase1", "Phase2"]);
    assert_eq!(counts.get("Phase1"), Some(&2));
    assert_eq!(counts.get("Phase2"), Some(&1));
}

#[test]
fn test_tally_malformed_json_is_all_zero() {
    let counts = tally(Some("{not valid"), &["Phase1", "Phase2", "LLM"]);
    assert_eq!(counts["Phase1"], 0);
    assert_eq!(counts["Phase2"], 0);
    assert_eq!(counts["LLM"], 0);
}

#[test]
fn test_tally_sources_blank_input() {
    let sources = tally_sources(Some("   "));
    assert_eq!(sources.len(), 3);
    assert!(sources.iter().all(|s| s.count == 0));
}
