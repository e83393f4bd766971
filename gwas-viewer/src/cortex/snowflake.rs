//! Cortex functions over the Snowflake SQL API

use async_trait::async_trait;
use gwas_common::SearchHit;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

use super::{CompletionService, CortexError, EmbeddingService, QuestionEmbedding, SearchQuery, SearchService};
use crate::warehouse::snowflake::parse_vector;
use crate::warehouse::SnowflakeClient;

/// Quote text as a SQL string literal
///
/// Used only where Snowflake requires a constant argument (model names for
/// `AI_EMBED`, the `SEARCH_PREVIEW` service and request).
pub fn sql_string_literal(text: &str) -> String {
    format!("'{}'", text.replace('\\', "\\\\").replace('\'', "''"))
}

/// `SNOWFLAKE.CORTEX.COMPLETE`
pub struct SnowflakeCompletion {
    client: Arc<SnowflakeClient>,
}

impl SnowflakeCompletion {
    pub fn new(client: Arc<SnowflakeClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CompletionService for SnowflakeCompletion {
    async fn complete(&self, model: &str, prompt: &str) -> Result<String, CortexError> {
        debug!(model = %model, prompt_chars = prompt.len(), "Calling Cortex COMPLETE");

        let result = self
            .client
            .execute("SELECT SNOWFLAKE.CORTEX.COMPLETE(?, ?) AS response", &[model, prompt])
            .await?;

        let response = result
            .rows()
            .next()
            .and_then(|row| row.text("RESPONSE"))
            .unwrap_or_default()
            .to_string();
        Ok(response)
    }
}

/// `AI_EMBED` for the text and image indexes of the search service
pub struct SnowflakeEmbedding {
    client: Arc<SnowflakeClient>,
    model: String,
}

impl SnowflakeEmbedding {
    pub fn new(client: Arc<SnowflakeClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

#[async_trait]
impl EmbeddingService for SnowflakeEmbedding {
    async fn embed(&self, text: &str) -> Result<QuestionEmbedding, CortexError> {
        let model = sql_string_literal(&self.model);
        let sql = format!(
            "SELECT AI_EMBED({model}, ?) AS text_vector, AI_EMBED({model}, ?) AS image_vector"
        );

        let result = self.client.execute(&sql, &[text, text]).await?;
        let row = result
            .rows()
            .next()
            .ok_or_else(|| CortexError::InvalidResponse("AI_EMBED returned no rows".to_string()))?;

        let text_vector = parse_vector(row.required("TEXT_VECTOR")?)?;
        let image_vector = parse_vector(row.required("IMAGE_VECTOR")?)?;

        Ok(QuestionEmbedding {
            text_vector,
            image_vector,
        })
    }
}

/// Cortex Search over the multimodal page index
pub struct SnowflakeSearch {
    client: Arc<SnowflakeClient>,
    service: String,
}

impl SnowflakeSearch {
    pub fn new(client: Arc<SnowflakeClient>, service: impl Into<String>) -> Self {
        Self {
            client,
            service: service.into(),
        }
    }
}

/// `SEARCH_PREVIEW` request body for a document-scoped multi-index query
pub fn search_request(query: &SearchQuery) -> Value {
    let mut indexes = json!({
        "page_text": { "text": query.text },
    });
    if let Some(embedding) = &query.embedding {
        indexes["text_embedding"] = json!({ "vector": embedding.text_vector });
        indexes["image_embedding"] = json!({ "vector": embedding.image_vector });
    }

    json!({
        "multi_index_query": indexes,
        "columns": ["page_text", "page_number"],
        "limit": query.limit,
        "filter": { "@eq": { "document_id": query.document_id } },
    })
}

#[async_trait]
impl SearchService for SnowflakeSearch {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchHit>, CortexError> {
        let request = serde_json::to_string(&search_request(query))?;
        let sql = format!(
            r#"
            SELECT
                result.value:page_text::STRING AS page_text,
                result.value:page_number::INT AS page_number
            FROM TABLE(
                FLATTEN(
                    PARSE_JSON(
                        SNOWFLAKE.CORTEX.SEARCH_PREVIEW({}, {})
                    )['results']
                )
            ) AS result
            "#,
            sql_string_literal(&self.service),
            sql_string_literal(&request)
        );

        let result = self.client.execute(&sql, &[]).await?;
        debug!(hits = result.len(), document_id = %query.document_id, "Cortex Search returned");

        result
            .rows()
            .map(|row| {
                Ok(SearchHit {
                    page_number: row.int("PAGE_NUMBER")?,
                    page_text: row.text("PAGE_TEXT").unwrap_or_default().to_string(),
                })
            })
            .collect()
    }
}
