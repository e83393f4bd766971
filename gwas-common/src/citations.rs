//! Citation Source Tally
//!
//! Field citations arrive as a JSON object mapping field name to a free-text
//! provenance string (`{"gene": "Phase1 extraction (page 4)", ...}`). The tally
//! counts how many provenance strings mention each source label.
//!
//! Labels are matched by case-sensitive substring containment, independently
//! of each other: `"Phase1/Phase2 consensus"` counts once for `Phase1` and once
//! for `Phase2`.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::warn;

/// A provenance label and how it is shown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CitationSource {
    pub label: &'static str,
    pub display_name: &'static str,
}

/// Extraction phases the pipeline writes into provenance strings
pub const CITATION_SOURCES: [CitationSource; 3] = [
    CitationSource {
        label: "Phase1",
        display_name: "Phase 1 (Text)",
    },
    CitationSource {
        label: "Phase2",
        display_name: "Phase 2 (Multimodal)",
    },
    CitationSource {
        label: "LLM",
        display_name: "LLM Tie-Breaker",
    },
];

/// Count of provenance strings for one source, in display order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceCount {
    pub label: String,
    pub display_name: String,
    pub count: usize,
}

/// Parse citations into provenance strings
///
/// Returns `None` for absent, blank, malformed or non-object input.
fn parse_provenance(citations_json: Option<&str>) -> Option<Vec<String>> {
    let raw = citations_json?.trim();
    if raw.is_empty() {
        return None;
    }

    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Some(
            map.into_iter()
                .map(|(_, value)| match value {
                    Value::String(s) => s,
                    other => other.to_string(),
                })
                .collect(),
        ),
        Ok(_) => {
            warn!("Field citations are not a JSON object; tallying as empty");
            None
        }
        Err(e) => {
            warn!("Could not parse field citations: {}", e);
            None
        }
    }
}

/// Tally provenance strings per label
///
/// Never fails: unusable input yields a zero count for every label.
pub fn tally<L: AsRef<str>>(citations_json: Option<&str>, labels: &[L]) -> BTreeMap<String, usize> {
    let provenance = parse_provenance(citations_json).unwrap_or_default();

    labels
        .iter()
        .map(|label| {
            let label = label.as_ref();
            let count = provenance.iter().filter(|p| p.contains(label)).count();
            (label.to_string(), count)
        })
        .collect()
}

/// Tally over [`CITATION_SOURCES`], keeping display order
pub fn tally_sources(citations_json: Option<&str>) -> Vec<SourceCount> {
    let labels: Vec<&str> = CITATION_SOURCES.iter().map(|s| s.label).collect();
    let counts = tally(citations_json, labels.as_slice());

    CITATION_SOURCES
        .iter()
        .map(|source| SourceCount {
            label: source.label.to_string(),
            display_name: source.display_name.to_string(),
            count: counts.get(source.label).copied().unwrap_or(0),
        })
        .collect()
}

/// Short confidence summary taken from the raw citations text
///
/// When the text mentions `HIGH` the first three words are shown (or the
/// first 20 characters if there are no more than three words); otherwise
/// the first 30 characters.
pub fn confidence_summary(citations: Option<&str>) -> String {
    let text = match citations {
        Some(t) if !t.is_empty() && t != "N/A" => t,
        _ => return "Not available".to_string(),
    };

    if text.contains("HIGH") {
        let words: Vec<&str> = text.split_whitespace().collect();
        if words.len() > 3 {
            words[..3].join(" ")
        } else {
            text.chars().take(20).collect()
        }
    } else {
        text.chars().take(30).collect()
    }
}
