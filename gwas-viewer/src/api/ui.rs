//! HTML view routes
//!
//! Each handler resolves the `doc` query parameter against the document list
//! (falling back to the most recent document), fetches what the view needs
//! and renders it inside the shared layout.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use gwas_common::DocumentSummary;
use serde::Deserialize;
use tracing::{error, warn};

use crate::error::ApiError;
use crate::report::{load_analytics, load_trait_report, TraitReport};
use crate::views::{self, QuickStats, Sidebar, View};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ViewQuery {
    pub doc: Option<String>,
    pub page: Option<i64>,
}

/// Documents, the selected one and its trait report
struct ViewContext {
    documents: Vec<DocumentSummary>,
    selected: usize,
    traits: Option<TraitReport>,
}

impl ViewContext {
    fn document(&self) -> &DocumentSummary {
        &self.documents[self.selected]
    }

    fn page(&self, view: View, title: &str, body: &str) -> Response {
        let quick_stats = self.traits.as_ref().map(|t| QuickStats {
            completeness: t.completeness,
            source: t.source_title.clone(),
        });
        let sidebar = Sidebar {
            view,
            documents: &self.documents,
            selected: self.document(),
            quick_stats,
        };
        Html(views::render_page(title, &sidebar, body)).into_response()
    }
}

/// Load the view context; `Ok(None)` when there are no documents at all
async fn load_context(state: &AppState, requested: Option<&str>) -> Result<Option<ViewContext>, ApiError> {
    let documents = state.warehouse.list_documents().await?;
    if documents.is_empty() {
        return Ok(None);
    }

    let selected = match requested {
        Some(id) => match documents.iter().position(|d| d.document_id == id) {
            Some(index) => index,
            None => {
                warn!(document_id = %id, "Unknown document requested; showing most recent");
                0
            }
        },
        None => 0,
    };

    let traits = load_trait_report(
        state.warehouse.as_ref(),
        &documents[selected].document_id,
        state.settings.divergence_threshold_pct,
    )
    .await?;

    Ok(Some(ViewContext {
        documents,
        selected,
        traits,
    }))
}

/// Fetch failure rendered as an HTML page
fn error_page(err: ApiError) -> Response {
    error!("View failed: {}", err);
    let body = format!(
        r#"<!DOCTYPE html><html lang="en"><head><meta charset="UTF-8"><title>GWAS Trait Explorer</title></head>
<body><h1>🧬 GWAS Trait Explorer</h1><div class="notice error">❌ {}</div></body></html>"#,
        views::escape_html(&err.to_string())
    );
    (err.status_code(), Html(body)).into_response()
}

fn no_documents() -> Response {
    (StatusCode::OK, Html(views::render_no_documents())).into_response()
}

macro_rules! try_view {
    ($expr:expr) => {
        match $expr {
            Ok(value) => value,
            Err(err) => return error_page(ApiError::from(err)),
        }
    };
}

/// GET /
pub async fn traits_page(State(state): State<AppState>, Query(query): Query<ViewQuery>) -> Response {
    let Some(ctx) = try_view!(load_context(&state, query.doc.as_deref()).await) else {
        return no_documents();
    };

    let body = views::traits::render(ctx.traits.as_ref());
    ctx.page(View::Traits, "Extracted Traits", &body)
}

/// GET /pages
pub async fn pages_page(State(state): State<AppState>, Query(query): Query<ViewQuery>) -> Response {
    let Some(ctx) = try_view!(load_context(&state, query.doc.as_deref()).await) else {
        return no_documents();
    };

    let document_id = ctx.document().document_id.clone();
    let pages = try_view!(state.warehouse.document_pages(&document_id).await);
    let body = views::pages::render(&document_id, &pages, query.page);
    ctx.page(View::Pages, "Page Browser", &body)
}

/// GET /analytics
pub async fn analytics_page(State(state): State<AppState>, Query(query): Query<ViewQuery>) -> Response {
    let Some(ctx) = try_view!(load_context(&state, query.doc.as_deref()).await) else {
        return no_documents();
    };

    let report = try_view!(
        load_analytics(
            state.warehouse.as_ref(),
            ctx.document(),
            state.settings.divergence_threshold_pct
        )
        .await
    );
    let body = views::analytics::render(&report);
    ctx.page(View::Analytics, "Analytics", &body)
}

/// GET /raw
pub async fn raw_page(State(state): State<AppState>, Query(query): Query<ViewQuery>) -> Response {
    let Some(ctx) = try_view!(load_context(&state, query.doc.as_deref()).await) else {
        return no_documents();
    };

    let pages = try_view!(state.warehouse.document_pages(&ctx.document().document_id).await);
    let record = ctx.traits.as_ref().map(|t| &t.record);
    let body = views::raw::render(ctx.document(), record, &pages);
    ctx.page(View::Raw, "Raw Data", &body)
}

/// GET /chat
pub async fn chat_page(State(state): State<AppState>, Query(query): Query<ViewQuery>) -> Response {
    let Some(ctx) = try_view!(load_context(&state, query.doc.as_deref()).await) else {
        return no_documents();
    };

    let body = views::chat::render(&views::chat::ChatPage {
        document_id: &ctx.document().document_id,
        models: state.chat.models(),
        default_model: &state.settings.default_model,
        default_context_pages: state.settings.default_context_pages,
    });
    ctx.page(View::Chat, "Ask Questions", &body)
}
