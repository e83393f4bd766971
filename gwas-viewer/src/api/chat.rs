//! Chat JSON endpoints

use axum::{extract::State, Json};
use gwas_common::config::{ChatConfig, MAX_CONTEXT_PAGES, MIN_CONTEXT_PAGES};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::documents::find_document;
use crate::chat::{ChatMessage, Conversation, SessionContext};
use crate::error::ApiResult;
use crate::AppState;

/// GET /api/chat/models response
#[derive(Debug, Serialize)]
pub struct ChatModels {
    pub models: Vec<String>,
    pub default_model: String,
    pub default_context_pages: u32,
    pub min_context_pages: u32,
    pub max_context_pages: u32,
}

/// POST /api/chat request; `history` is the conversation so far
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub session_id: Option<String>,
    pub document_id: String,
    pub question: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub context_pages: Option<u32>,
    #[serde(default)]
    pub history: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub session_id: String,
    pub answer: String,
    pub history: Conversation,
}

/// GET /api/chat/models
pub async fn chat_models(State(state): State<AppState>) -> Json<ChatModels> {
    Json(ChatModels {
        models: state.chat.models().to_vec(),
        default_model: state.settings.default_model.clone(),
        default_context_pages: state.settings.default_context_pages,
        min_context_pages: MIN_CONTEXT_PAGES,
        max_context_pages: MAX_CONTEXT_PAGES,
    })
}

/// POST /api/chat
///
/// Answers one question and returns the extended history. Missing model and
/// context-page settings fall back to the configured defaults; the page
/// count is clamped to the allowed range.
pub async fn ask_question(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> ApiResult<Json<ChatResponse>> {
    find_document(&state, &request.document_id).await?;

    let session_id = request
        .session_id
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let ctx = SessionContext {
        session_id: session_id.clone(),
        document_id: request.document_id,
        model: request
            .model
            .unwrap_or_else(|| state.settings.default_model.clone()),
        context_pages: ChatConfig::clamp_context_pages(
            request.context_pages,
            state.settings.default_context_pages,
        ),
    };

    info!(
        session = %ctx.session_id,
        document_id = %ctx.document_id,
        model = %ctx.model,
        context_pages = ctx.context_pages,
        "Chat question"
    );

    let mut conversation = Conversation::from_messages(request.history);
    let answer = state.chat.ask(&ctx, &mut conversation, &request.question).await?;

    Ok(Json(ChatResponse {
        session_id,
        answer,
        history: conversation,
    }))
}
