//! Services for the SQLite backend

use async_trait::async_trait;
use gwas_common::SearchHit;
use std::collections::BTreeSet;
use std::sync::Arc;

use super::{CompletionService, CortexError, SearchQuery, SearchService};
use crate::warehouse::Warehouse;

/// Ranks a document's pages by how many distinct question terms they contain
pub struct KeywordPageSearch {
    warehouse: Arc<dyn Warehouse>,
}

impl KeywordPageSearch {
    pub fn new(warehouse: Arc<dyn Warehouse>) -> Self {
        Self { warehouse }
    }
}

/// Lower-cased alphanumeric terms of at least three characters
fn terms(text: &str) -> BTreeSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() >= 3)
        .map(str::to_lowercase)
        .collect()
}

#[async_trait]
impl SearchService for KeywordPageSearch {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchHit>, CortexError> {
        let wanted = terms(&query.text);
        if wanted.is_empty() {
            return Ok(Vec::new());
        }

        let pages = self.warehouse.document_pages(&query.document_id).await?;

        let mut scored: Vec<(usize, i64, String)> = pages
            .into_iter()
            .filter_map(|page| {
                let text = page.page_text?;
                let lowered = text.to_lowercase();
                let score = wanted.iter().filter(|t| lowered.contains(t.as_str())).count();
                (score > 0).then_some((score, page.page_number, text))
            })
            .collect();

        // Best score first, earlier page on ties
        scored.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));

        Ok(scored
            .into_iter()
            .take(query.limit as usize)
            .map(|(_, page_number, page_text)| SearchHit {
                page_number: Some(page_number),
                page_text,
            })
            .collect())
    }
}

/// Completion service for deployments without Cortex access
pub struct UnconfiguredCompletion;

#[async_trait]
impl CompletionService for UnconfiguredCompletion {
    async fn complete(&self, _model: &str, _prompt: &str) -> Result<String, CortexError> {
        Err(CortexError::Unavailable(
            "no completion service is configured; set warehouse.backend = \"snowflake\" to enable chat"
                .to_string(),
        ))
    }
}
