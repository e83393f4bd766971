//! gwas-viewer library - read-only GWAS trait extraction viewer
//!
//! Serves the extracted trait records, per-page content and analytics of
//! documents processed by the upstream extraction pipeline, plus a
//! retrieval-augmented chat over a document's pages.

use axum::Router;
use gwas_common::config::ViewerConfig;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod chat;
pub mod cortex;
pub mod error;
pub mod report;
pub mod views;
pub mod warehouse;

use chat::ChatService;
use warehouse::Warehouse;

/// View and chat defaults taken from configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ViewSettings {
    pub default_model: String,
    pub default_context_pages: u32,
    /// Gap (percentage points) at which reported accuracy is flagged
    pub divergence_threshold_pct: f64,
}

impl ViewSettings {
    pub fn from_config(config: &ViewerConfig) -> Self {
        Self {
            default_model: config.chat.default_model.clone(),
            default_context_pages: config.chat.default_context_pages,
            divergence_threshold_pct: config.analytics.divergence_threshold_pct,
        }
    }
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self::from_config(&ViewerConfig::default())
    }
}

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Read-only warehouse access (usually cached)
    pub warehouse: Arc<dyn Warehouse>,
    pub chat: Arc<ChatService>,
    pub settings: Arc<ViewSettings>,
}

impl AppState {
    pub fn new(warehouse: Arc<dyn Warehouse>, chat: Arc<ChatService>, settings: ViewSettings) -> Self {
        Self {
            warehouse,
            chat,
            settings: Arc::new(settings),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};

    let json_api = Router::new()
        .route("/api/buildinfo", get(api::get_build_info))
        .route("/api/documents", get(api::list_documents))
        .route("/api/documents/:id/traits", get(api::document_traits))
        .route("/api/documents/:id/pages", get(api::document_pages))
        .route("/api/documents/:id/analytics", get(api::document_analytics))
        .route("/api/chat/models", get(api::chat_models))
        .route("/api/chat", post(api::ask_question));

    let views = Router::new()
        .route("/", get(api::traits_page))
        .route("/pages", get(api::pages_page))
        .route("/analytics", get(api::analytics_page))
        .route("/raw", get(api::raw_page))
        .route("/chat", get(api::chat_page));

    Router::new()
        .merge(json_api)
        .merge(views)
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
