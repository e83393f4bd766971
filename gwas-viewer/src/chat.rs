//! Document chat
//!
//! Retrieval-augmented question answering over one document's pages. The
//! conversation belongs to the caller: each request carries its
//! [`SessionContext`] and the history so far, and gets the extended history
//! back. Nothing is kept server-side between requests.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

use crate::cortex::{CompletionService, CortexError, EmbeddingService, SearchQuery, SearchService};
use gwas_common::SearchHit;

/// Assistant reply when the completion comes back empty
pub const EMPTY_RESPONSE: &str = "Sorry, I couldn't generate a response.";

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("question must not be empty")]
    EmptyQuestion,

    #[error("model '{0}' is not available")]
    UnknownModel(String),

    #[error("page search failed: {0}")]
    Search(CortexError),

    #[error("completion failed: {0}")]
    Completion(CortexError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Ordered chat history owned by the caller
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_messages(messages: Vec<ChatMessage>) -> Self {
        Self { messages }
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn into_messages(self) -> Vec<ChatMessage> {
        self.messages
    }
}

/// Per-request chat settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub session_id: String,
    pub document_id: String,
    pub model: String,
    pub context_pages: u32,
}

/// Page context block and the distinct page numbers it cites
pub fn build_context(hits: &[SearchHit]) -> (String, Vec<i64>) {
    let mut context = String::new();
    let mut pages = BTreeSet::new();

    for hit in hits {
        match hit.page_number {
            Some(n) => {
                let _ = write!(context, "[Page {}]: {}\n\n", n, hit.page_text);
                pages.insert(n);
            }
            None => {
                let _ = write!(context, "[Page Unknown]: {}\n\n", hit.page_text);
            }
        }
    }

    (context, pages.into_iter().collect())
}

pub fn build_prompt(context: &str, question: &str) -> String {
    format!(
        r#"[INST]
You are a helpful AI assistant specialized in genomic research and GWAS studies. A user is asking about a research paper.

Use the context provided from the research paper to answer the user's question accurately and concisely.

Context from the paper (with page numbers):
{context}

User Question: {question}

Instructions:
- Answer based on the provided context
- Be specific and cite page numbers when relevant
- If the context doesn't contain enough information to answer, say so
- Focus on GWAS-related insights, genomic findings, and research methodology
- Be concise but thorough

[/INST]
Answer:"#
    )
}

/// Append the sources line; `pages` must already be sorted and distinct
pub fn with_sources(answer: &str, pages: &[i64]) -> String {
    if pages.is_empty() {
        return answer.to_string();
    }

    let refs = pages
        .iter()
        .map(|p| format!("Page {}", p))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{}\n\n**Sources:** {}", answer, refs)
}

/// Answers questions about a document from its most relevant pages
pub struct ChatService {
    search: Arc<dyn SearchService>,
    completion: Arc<dyn CompletionService>,
    embedding: Option<Arc<dyn EmbeddingService>>,
    models: Vec<String>,
}

impl ChatService {
    pub fn new(
        search: Arc<dyn SearchService>,
        completion: Arc<dyn CompletionService>,
        embedding: Option<Arc<dyn EmbeddingService>>,
        models: Vec<String>,
    ) -> Self {
        Self {
            search,
            completion,
            embedding,
            models,
        }
    }

    pub fn models(&self) -> &[String] {
        &self.models
    }

    /// Answer `question`, appending both turns to `conversation`
    ///
    /// On a search or completion failure an `"Error: ..."` assistant message
    /// is appended and the error returned.
    pub async fn ask(
        &self,
        ctx: &SessionContext,
        conversation: &mut Conversation,
        question: &str,
    ) -> Result<String, ChatError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(ChatError::EmptyQuestion);
        }
        if !self.models.iter().any(|m| m == &ctx.model) {
            return Err(ChatError::UnknownModel(ctx.model.clone()));
        }

        conversation.push(ChatMessage::user(question));

        match self.answer(ctx, question).await {
            Ok(answer) => {
                conversation.push(ChatMessage::assistant(answer.clone()));
                Ok(answer)
            }
            Err(e) => {
                warn!(session = %ctx.session_id, document_id = %ctx.document_id, "Chat failed: {}", e);
                conversation.push(ChatMessage::assistant(format!("Error: {}", e)));
                Err(e)
            }
        }
    }

    async fn answer(&self, ctx: &SessionContext, question: &str) -> Result<String, ChatError> {
        let embedding = match &self.embedding {
            Some(embedder) => Some(embedder.embed(question).await.map_err(ChatError::Search)?),
            None => None,
        };

        let query = SearchQuery {
            document_id: ctx.document_id.clone(),
            text: question.to_string(),
            embedding,
            limit: ctx.context_pages,
        };
        let hits = self.search.search(&query).await.map_err(ChatError::Search)?;

        let (context, pages) = build_context(&hits);
        debug!(
            session = %ctx.session_id,
            hits = hits.len(),
            pages = ?pages,
            "Built chat context"
        );

        let prompt = build_prompt(&context, question);
        let response = self
            .completion
            .complete(&ctx.model, &prompt)
            .await
            .map_err(ChatError::Completion)?;

        let response = if response.trim().is_empty() {
            EMPTY_RESPONSE.to_string()
        } else {
            response
        };

        Ok(with_sources(&response, &pages))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FixedSearch(Vec<SearchHit>);

    #[async_trait]
    impl SearchService for FixedSearch {
        async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchHit>, CortexError> {
            Ok(self.0.iter().take(query.limit as usize).cloned().collect())
        }
    }

    struct FailingSearch;

    #[async_trait]
    impl SearchService for FailingSearch {
        async fn search(&self, _: &SearchQuery) -> Result<Vec<SearchHit>, CortexError> {
            Err(CortexError::Unavailable("search service offline".to_string()))
        }
    }

    /// Records prompts and replies with a fixed answer
    struct Recorder {
        reply: String,
        prompts: Mutex<Vec<(String, String)>>,
    }

    impl Recorder {
        fn new(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.to_string(),
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl CompletionService for Recorder {
        async fn complete(&self, model: &str, prompt: &str) -> Result<String, CortexError> {
            self.prompts
                .lock()
                .unwrap()
                .push((model.to_string(), prompt.to_string()));
            Ok(self.reply.clone())
        }
    }

    fn hit(page: Option<i64>, text: &str) -> SearchHit {
        SearchHit {
            page_number: page,
            page_text: text.to_string(),
        }
    }

    fn ctx() -> SessionContext {
        SessionContext {
            session_id: "s-1".to_string(),
            document_id: "doc-1".to_string(),
            model: "mistral-large2".to_string(),
            context_pages: 5,
        }
    }

    fn models() -> Vec<String> {
        vec!["mistral-large2".to_string(), "llama3.1-8b".to_string()]
    }

    #[test]
    fn test_build_context_formats_pages() {
        let (context, pages) = build_context(&[
            hit(Some(4), "Table 2"),
            hit(None, "orphan"),
            hit(Some(2), "Methods"),
            hit(Some(4), "again"),
        ]);
        assert_eq!(
            context,
            "[Page 4]: Table 2\n\n[Page Unknown]: orphan\n\n[Page 2]: Methods\n\n[Page 4]: again\n\n"
        );
        assert_eq!(pages, [2, 4]);
    }

    #[test]
    fn test_with_sources() {
        assert_eq!(with_sources("Yes.", &[3, 7]), "Yes.\n\n**Sources:** Page 3, Page 7");
        assert_eq!(with_sources("Yes.", &[]), "Yes.");
    }

    #[test]
    fn test_prompt_contains_context_and_question() {
        let prompt = build_prompt("[Page 1]: hello\n\n", "What trait?");
        assert!(prompt.starts_with("[INST]"));
        assert!(prompt.contains("[Page 1]: hello"));
        assert!(prompt.contains("User Question: What trait?"));
        assert!(prompt.ends_with("Answer:"));
    }

    #[test]
    fn test_conversation_serializes_as_list() {
        let mut conversation = Conversation::new();
        conversation.push(ChatMessage::user("hi"));
        let json = serde_json::to_value(&conversation).unwrap();
        assert_eq!(json, serde_json::json!([{"role": "user", "content": "hi"}]));
        conversation.clear();
        assert!(conversation.is_empty());
    }

    #[tokio::test]
    async fn test_ask_appends_both_turns_with_sources() {
        let completion = Recorder::new("Plant height maps to chromosome 7.");
        let service = ChatService::new(
            Arc::new(FixedSearch(vec![hit(Some(5), "chr7 peak"), hit(Some(2), "height")])),
            completion.clone(),
            None,
            models(),
        );

        let mut conversation = Conversation::new();
        let answer = service
            .ask(&ctx(), &mut conversation, "  Where is the height QTL?  ")
            .await
            .unwrap();

        assert_eq!(answer, "Plant height maps to chromosome 7.\n\n**Sources:** Page 2, Page 5");
        assert_eq!(conversation.len(), 2);
        assert_eq!(conversation.messages()[0], ChatMessage::user("Where is the height QTL?"));
        assert_eq!(conversation.messages()[1].role, Role::Assistant);

        let prompts = completion.prompts.lock().unwrap();
        assert_eq!(prompts[0].0, "mistral-large2");
        assert!(prompts[0].1.contains("[Page 5]: chr7 peak"));
    }

    #[tokio::test]
    async fn test_search_limit_is_context_pages() {
        let completion = Recorder::new("ok");
        let service = ChatService::new(
            Arc::new(FixedSearch(vec![hit(Some(1), "a"), hit(Some(2), "b"), hit(Some(3), "c")])),
            completion,
            None,
            models(),
        );
        let mut context = ctx();
        context.context_pages = 2;

        let answer = service.ask(&context, &mut Conversation::new(), "q?").await.unwrap();
        assert!(answer.ends_with("**Sources:** Page 1, Page 2"));
    }

    #[tokio::test]
    async fn test_empty_completion_uses_fallback() {
        let service = ChatService::new(Arc::new(FixedSearch(Vec::new())), Recorder::new("  "), None, models());
        let answer = service.ask(&ctx(), &mut Conversation::new(), "q?").await.unwrap();
        assert_eq!(answer, EMPTY_RESPONSE);
    }

    #[tokio::test]
    async fn test_empty_question_rejected_without_history() {
        let service = ChatService::new(Arc::new(FixedSearch(Vec::new())), Recorder::new("x"), None, models());
        let mut conversation = Conversation::new();
        let result = service.ask(&ctx(), &mut conversation, "   ").await;
        assert!(matches!(result, Err(ChatError::EmptyQuestion)));
        assert!(conversation.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_model_rejected() {
        let service = ChatService::new(Arc::new(FixedSearch(Vec::new())), Recorder::new("x"), None, models());
        let mut context = ctx();
        context.model = "gpt-4".to_string();
        let result = service.ask(&context, &mut Conversation::new(), "q?").await;
        assert!(matches!(result, Err(ChatError::UnknownModel(m)) if m == "gpt-4"));
    }

    #[tokio::test]
    async fn test_failure_records_error_message() {
        let service = ChatService::new(Arc::new(FailingSearch), Recorder::new("x"), None, models());
        let mut conversation = Conversation::new();
        let result = service.ask(&ctx(), &mut conversation, "q?").await;

        assert!(matches!(result, Err(ChatError::Search(_))));
        assert_eq!(conversation.len(), 2);
        assert_eq!(
            conversation.messages()[1].content,
            "Error: page search failed: search service offline"
        );
    }
}
