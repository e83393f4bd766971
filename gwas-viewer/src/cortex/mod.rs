//! Completion, embedding and page search services used by chat
//!
//! The Snowflake implementations call Cortex functions through the SQL API.
//! The local implementations serve the SQLite backend: keyword ranking over
//! the mirrored pages and a completion service that reports it is not
//! configured.

use async_trait::async_trait;
use gwas_common::SearchHit;
use thiserror::Error;

use crate::warehouse::WarehouseError;

pub mod local;
pub mod snowflake;

pub use local::{KeywordPageSearch, UnconfiguredCompletion};
pub use snowflake::{SnowflakeCompletion, SnowflakeEmbedding, SnowflakeSearch};

#[derive(Debug, Error)]
pub enum CortexError {
    #[error("warehouse call failed: {0}")]
    Warehouse(#[from] WarehouseError),

    #[error("request encoding failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid service response: {0}")]
    InvalidResponse(String),

    #[error("{0}")]
    Unavailable(String),
}

/// Text and image-space vectors for one question
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionEmbedding {
    pub text_vector: Vec<f32>,
    pub image_vector: Vec<f32>,
}

/// Page search request, scoped to one document
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub document_id: String,
    pub text: String,
    pub embedding: Option<QuestionEmbedding>,
    pub limit: u32,
}

#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Complete `prompt` with `model`; may return an empty string
    async fn complete(&self, model: &str, prompt: &str) -> Result<String, CortexError>;
}

#[async_trait]
pub trait EmbeddingService: Send + Sync {
    async fn embed(&self, text: &str) -> Result<QuestionEmbedding, CortexError>;
}

#[async_trait]
pub trait SearchService: Send + Sync {
    /// Pages of `query.document_id` most relevant to the question, best first
    async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchHit>, CortexError>;
}
