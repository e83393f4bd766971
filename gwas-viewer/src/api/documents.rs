//! Document JSON endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use gwas_common::{DocumentSummary, PageRecord};
use tracing::error;

use crate::error::{ApiError, ApiResult};
use crate::report::{load_analytics, load_trait_report, AnalyticsReport, TraitReport};
use crate::AppState;

/// Look up a document, 404 when the warehouse does not know it
pub async fn find_document(state: &AppState, document_id: &str) -> ApiResult<DocumentSummary> {
    let documents = state.warehouse.list_documents().await.map_err(|e| {
        error!("Failed to load documents: {}", e);
        ApiError::from(e)
    })?;

    documents
        .into_iter()
        .find(|d| d.document_id == document_id)
        .ok_or_else(|| ApiError::NotFound(format!("document {}", document_id)))
}

/// GET /api/documents
///
/// All documents, most recently extracted first.
pub async fn list_documents(State(state): State<AppState>) -> ApiResult<Json<Vec<DocumentSummary>>> {
    let documents = state.warehouse.list_documents().await.map_err(|e| {
        error!("Failed to load documents: {}", e);
        ApiError::from(e)
    })?;
    Ok(Json(documents))
}

/// GET /api/documents/:id/traits
pub async fn document_traits(
    State(state): State<AppState>,
    Path(document_id): Path<String>,
) -> ApiResult<Json<TraitReport>> {
    find_document(&state, &document_id).await?;

    let report = load_trait_report(
        state.warehouse.as_ref(),
        &document_id,
        state.settings.divergence_threshold_pct,
    )
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("trait data for document {}", document_id)))?;

    Ok(Json(report))
}

/// GET /api/documents/:id/pages
pub async fn document_pages(
    State(state): State<AppState>,
    Path(document_id): Path<String>,
) -> ApiResult<Json<Vec<PageRecord>>> {
    find_document(&state, &document_id).await?;
    let pages = state.warehouse.document_pages(&document_id).await?;
    Ok(Json(pages))
}

/// GET /api/documents/:id/analytics
pub async fn document_analytics(
    State(state): State<AppState>,
    Path(document_id): Path<String>,
) -> ApiResult<Json<AnalyticsReport>> {
    let document = find_document(&state, &document_id).await?;
    let report = load_analytics(
        state.warehouse.as_ref(),
        &document,
        state.settings.divergence_threshold_pct,
    )
    .await?;
    Ok(Json(report))
}
