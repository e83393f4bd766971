//! Integration tests for gwas-viewer HTTP endpoints
//!
//! Each test builds a temporary SQLite warehouse mirror, opens it read-only
//! and drives the router with `oneshot`.

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tower::util::ServiceExt; // for `oneshot` method

use gwas_common::{DocumentSummary, ImagePageRef, PageRecord, TextPageStat, TraitRecord};
use gwas_viewer::chat::ChatService;
use gwas_viewer::cortex::{CompletionService, CortexError, KeywordPageSearch, UnconfiguredCompletion};
use gwas_viewer::warehouse::sqlite::{connect_readonly, MIRROR_SCHEMA};
use gwas_viewer::warehouse::{CachedWarehouse, SqliteWarehouse, Warehouse, WarehouseError};
use gwas_viewer::{build_router, AppState, ViewSettings};

const SEED: &str = r#"
INSERT INTO parsed_documents VALUES
    ('doc-old-0001', 'maize_flowering.pdf', 6, '2024-06-01T12:00:00Z', '@GWAS.PDF_RAW.PDF_STAGE/maize_flowering.pdf'),
    ('doc-new-0002', 'rice_yield.pdf', 3, '2025-02-10T08:15:00Z', '@GWAS.PDF_RAW.PDF_STAGE/rice_yield.pdf');

INSERT INTO gwas_trait_analytics (document_id, trait, germplasm_name, chromosome, gene, snp_name,
    extraction_source, field_citations, traits_extracted, traits_not_reported, extraction_accuracy_pct)
VALUES ('doc-new-0002', 'Grain yield', '''Nipponbare''', '3', 'NOT_FOUND', 'Not in paper',
    'multimodal_pipeline',
    '{"trait":"Phase1 table 2","chromosome":"Phase1/Phase2 consensus","germplasm_name":"LLM tie-break"}',
    5, 10, 60.0);

INSERT INTO multimodal_pages VALUES
    ('doc-new-0002', 3, 'References', 'pages/rice_p3.png', 1, 1),
    ('doc-new-0002', 1, 'Abstract: grain yield GWAS in rice', NULL, 1, 0),
    ('doc-new-0002', 2, 'Results: a major QTL for grain yield on chromosome 3', 'pages/rice_p2.png', 1, 1);

INSERT INTO text_pages VALUES
    ('doc-new-0002', 1, 'Abstract: grain yield GWAS in rice'),
    ('doc-new-0002', 2, 'Results: a major QTL for grain yield on chromosome 3'),
    ('doc-new-0002', 3, 'References');

INSERT INTO image_pages VALUES
    ('doc-new-0002', 2, 'pages/rice_p2.png'),
    ('doc-new-0002', 3, 'pages/rice_p3.png');
"#;

/// Completion that always gives the same answer
struct FixedCompletion;

#[async_trait]
impl CompletionService for FixedCompletion {
    async fn complete(&self, _model: &str, prompt: &str) -> Result<String, CortexError> {
        assert!(prompt.contains("User Question:"));
        Ok("The grain yield QTL is on chromosome 3.".to_string())
    }
}

/// Warehouse whose every query fails
struct OfflineWarehouse;

#[async_trait]
impl Warehouse for OfflineWarehouse {
    async fn list_documents(&self) -> Result<Vec<DocumentSummary>, WarehouseError> {
        Err(WarehouseError::Unavailable("warehouse offline".to_string()))
    }

    async fn trait_record(&self, _: &str) -> Result<Option<TraitRecord>, WarehouseError> {
        Err(WarehouseError::Unavailable("warehouse offline".to_string()))
    }

    async fn document_pages(&self, _: &str) -> Result<Vec<PageRecord>, WarehouseError> {
        Err(WarehouseError::Unavailable("warehouse offline".to_string()))
    }

    async fn text_page_lengths(&self, _: &str) -> Result<Vec<TextPageStat>, WarehouseError> {
        Err(WarehouseError::Unavailable("warehouse offline".to_string()))
    }

    async fn image_pages(&self, _: &str) -> Result<Vec<ImagePageRef>, WarehouseError> {
        Err(WarehouseError::Unavailable("warehouse offline".to_string()))
    }
}

/// Test helper: temporary mirror, kept alive for the test's duration
struct TestMirror {
    _dir: TempDir,
    pool: SqlitePool,
}

async fn setup_mirror(seed: &str) -> TestMirror {
    let dir = tempfile::tempdir().expect("Should create temp dir");
    let db_path = dir.path().join("gwas.db");

    let writer = SqlitePool::connect(&format!("sqlite://{}?mode=rwc", db_path.display()))
        .await
        .expect("Should create mirror");
    sqlx::raw_sql(MIRROR_SCHEMA).execute(&writer).await.expect("Should create schema");
    if !seed.is_empty() {
        sqlx::raw_sql(seed).execute(&writer).await.expect("Should seed mirror");
    }
    writer.close().await;

    let pool = connect_readonly(&db_path).await.expect("Should open mirror read-only");
    TestMirror { _dir: dir, pool }
}

fn setup_app(pool: SqlitePool, completion: Arc<dyn CompletionService>) -> axum::Router {
    let warehouse: Arc<dyn Warehouse> = Arc::new(CachedWarehouse::new(
        Arc::new(SqliteWarehouse::new(pool)),
        Duration::from_secs(600),
    ));
    let settings = ViewSettings::default();
    let models = vec![
        "mistral-large2".to_string(),
        "llama3.1-70b".to_string(),
        "llama3.1-8b".to_string(),
    ];
    let chat = ChatService::new(
        Arc::new(KeywordPageSearch::new(warehouse.clone())),
        completion,
        None,
        models,
    );
    build_router(AppState::new(warehouse, Arc::new(chat), settings))
}

async fn seeded_app() -> (TestMirror, axum::Router) {
    let mirror = setup_mirror(SEED).await;
    let app = setup_app(mirror.pool.clone(), Arc::new(FixedCompletion));
    (mirror, app)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

async fn extract_text(body: Body) -> String {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    String::from_utf8(bytes.to_vec()).expect("Should be UTF-8")
}

// =============================================================================
// Health and build info
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let (_mirror, app) = seeded_app().await;

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "gwas-viewer");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_buildinfo_endpoint() {
    let (_mirror, app) = seeded_app().await;

    let response = app.oneshot(get("/api/buildinfo")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert!(body["git_hash"].is_string());
    assert!(body["build_profile"].is_string());
}

// =============================================================================
// Documents
// =============================================================================

#[tokio::test]
async fn test_documents_newest_first() {
    let (_mirror, app) = seeded_app().await;

    let response = app.oneshot(get("/api/documents")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    let docs = body.as_array().unwrap();
    assert_eq!(docs.len(), 2);
    assert_eq!(docs[0]["document_id"], "doc-new-0002");
    assert_eq!(docs[0]["pdf_filename"], "rice_yield.pdf");
    assert_eq!(docs[1]["document_id"], "doc-old-0001");
}

#[tokio::test]
async fn test_traits_report() {
    let (_mirror, app) = seeded_app().await;

    let response = app.oneshot(get("/api/documents/doc-new-0002/traits")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["completeness"]["found_count"], 3);
    assert_eq!(body["completeness"]["total"], 15);
    assert_eq!(body["completeness"]["accuracy_pct"], 20.0);

    let fields = body["fields"].as_array().unwrap();
    assert_eq!(fields.len(), 15);
    assert_eq!(fields[1]["field"], "germplasm_name");
    assert_eq!(fields[1]["status"], "found");
    assert_eq!(fields[1]["value"], "Nipponbare");
    assert_eq!(fields[5]["status"], "not_found");

    assert_eq!(body["accuracy"]["reported_pct"], 60.0);
    assert_eq!(body["accuracy"]["diverges"], true);

    let sources = body["sources"].as_array().unwrap();
    assert_eq!(sources[0]["count"], 2);
    assert_eq!(sources[1]["count"], 1);
    assert_eq!(sources[2]["count"], 1);
    assert_eq!(body["pipeline_label"], "Multimodal Pipeline");
}

#[tokio::test]
async fn test_unknown_document_is_404() {
    let (_mirror, app) = seeded_app().await;

    let response = app.oneshot(get("/api/documents/nope/traits")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_document_without_traits_is_404() {
    let (_mirror, app) = seeded_app().await;

    let response = app.oneshot(get("/api/documents/doc-old-0001/traits")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_pages_ordered() {
    let (_mirror, app) = seeded_app().await;

    let response = app.oneshot(get("/api/documents/doc-new-0002/pages")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    let numbers: Vec<i64> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["page_number"].as_i64().unwrap())
        .collect();
    assert_eq!(numbers, [1, 2, 3]);
    assert_eq!(body[0]["has_image"], false);
}

#[tokio::test]
async fn test_analytics_counts() {
    let (_mirror, app) = seeded_app().await;

    let response = app.oneshot(get("/api/documents/doc-new-0002/analytics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["page_counts"]["total_pages"], 3);
    assert_eq!(body["page_counts"]["text_pages"], 3);
    assert_eq!(body["page_counts"]["image_pages"], 2);
    assert_eq!(body["page_counts"]["multimodal_pages"], 3);
    assert_eq!(body["text_lengths"][2]["text_length"], 10);
}

#[tokio::test]
async fn test_warehouse_failure_is_502() {
    let app = {
        let warehouse: Arc<dyn Warehouse> = Arc::new(OfflineWarehouse);
        let chat = ChatService::new(
            Arc::new(KeywordPageSearch::new(warehouse.clone())),
            Arc::new(UnconfiguredCompletion),
            None,
            vec!["mistral-large2".to_string()],
        );
        build_router(AppState::new(warehouse, Arc::new(chat), ViewSettings::default()))
    };

    let response = app.clone().oneshot(get("/api/documents")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "WAREHOUSE_ERROR");

    let response = app.oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let html = extract_text(response.into_body()).await;
    assert!(html.contains("warehouse offline"));
}

// =============================================================================
// Chat
// =============================================================================

#[tokio::test]
async fn test_chat_models() {
    let (_mirror, app) = seeded_app().await;

    let response = app.oneshot(get("/api/chat/models")).await.unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["default_model"], "mistral-large2");
    assert_eq!(body["models"].as_array().unwrap().len(), 3);
    assert_eq!(body["min_context_pages"], 1);
    assert_eq!(body["max_context_pages"], 10);
}

#[tokio::test]
async fn test_chat_answers_with_sources() {
    let (_mirror, app) = seeded_app().await;

    let request = post_json(
        "/api/chat",
        json!({
            "document_id": "doc-new-0002",
            "question": "Where is the grain yield QTL?",
            "history": [
                {"role": "user", "content": "Hello"},
                {"role": "assistant", "content": "Hi! Ask me about the paper."}
            ]
        }),
    );
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(
        body["answer"],
        "The grain yield QTL is on chromosome 3.\n\n**Sources:** Page 1, Page 2"
    );
    assert!(!body["session_id"].as_str().unwrap().is_empty());

    let history = body["history"].as_array().unwrap();
    assert_eq!(history.len(), 4);
    assert_eq!(history[2]["role"], "user");
    assert_eq!(history[2]["content"], "Where is the grain yield QTL?");
    assert_eq!(history[3]["role"], "assistant");
}

#[tokio::test]
async fn test_chat_context_pages_limit_and_session_kept() {
    let (_mirror, app) = seeded_app().await;

    let request = post_json(
        "/api/chat",
        json!({
            "session_id": "browser-session-7",
            "document_id": "doc-new-0002",
            "question": "Where is the grain yield QTL?",
            "model": "llama3.1-8b",
            "context_pages": 1,
            "history": []
        }),
    );
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["session_id"], "browser-session-7");
    assert!(body["answer"].as_str().unwrap().ends_with("**Sources:** Page 2"));
}

#[tokio::test]
async fn test_chat_rejects_empty_question() {
    let (_mirror, app) = seeded_app().await;

    let request = post_json(
        "/api/chat",
        json!({"document_id": "doc-new-0002", "question": "   ", "history": []}),
    );
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_chat_rejects_unknown_model() {
    let (_mirror, app) = seeded_app().await;

    let request = post_json(
        "/api/chat",
        json!({"document_id": "doc-new-0002", "question": "Which gene?", "model": "gpt-4"}),
    );
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = extract_json(response.into_body()).await;
    assert!(body["error"]["message"].as_str().unwrap().contains("gpt-4"));
}

#[tokio::test]
async fn test_chat_unknown_document_is_404() {
    let (_mirror, app) = seeded_app().await;

    let request = post_json("/api/chat", json!({"document_id": "missing", "question": "Which gene?"}));
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_chat_without_completion_service_is_502() {
    let mirror = setup_mirror(SEED).await;
    let app = setup_app(mirror.pool.clone(), Arc::new(UnconfiguredCompletion));

    let request = post_json(
        "/api/chat",
        json!({"document_id": "doc-new-0002", "question": "Which gene?"}),
    );
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "SERVICE_ERROR");
}

// =============================================================================
// HTML views
// =============================================================================

#[tokio::test]
async fn test_traits_view_defaults_to_most_recent() {
    let (_mirror, app) = seeded_app().await;

    let response = app.oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let html = extract_text(response.into_body()).await;
    assert!(html.contains("rice_yield.pdf (doc-new-...)"));
    assert!(html.contains("3/15"));
    assert!(html.contains("20.0%"));
    assert!(html.contains("Nipponbare"));
    assert!(html.contains("2025-02-10"));
    assert!(html.contains("GET @GWAS.PDF_RAW.PDF_STAGE/rice_yield.pdf file:///local/path/"));
}

#[tokio::test]
async fn test_unknown_doc_falls_back() {
    let (_mirror, app) = seeded_app().await;

    let response = app.oneshot(get("/?doc=does-not-exist")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let html = extract_text(response.into_body()).await;
    assert!(html.contains(r#"<option value="doc-new-0002" selected>"#));
}

#[tokio::test]
async fn test_document_without_traits_view() {
    let (_mirror, app) = seeded_app().await;

    let response = app.oneshot(get("/?doc=doc-old-0001")).await.unwrap();
    let html = extract_text(response.into_body()).await;
    assert!(html.contains("No trait data found for this document."));
    assert!(html.contains("maize_flowering.pdf"));
}

#[tokio::test]
async fn test_pages_view_selects_page() {
    let (_mirror, app) = seeded_app().await;

    let response = app.oneshot(get("/pages?doc=doc-new-0002&page=2")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let html = extract_text(response.into_body()).await;
    assert!(html.contains("Results: a major QTL"));
    assert!(html.contains("pages/rice_p2.png"));
    assert!(html.contains("✓ Complete"));
}

#[tokio::test]
async fn test_analytics_view_flags_divergence() {
    let (_mirror, app) = seeded_app().await;

    let response = app.oneshot(get("/analytics?doc=doc-new-0002")).await.unwrap();
    let html = extract_text(response.into_body()).await;
    assert!(html.contains("60.0%"));
    assert!(html.contains("points apart"));
    assert!(html.contains("Phase 2 (Multimodal)"));
}

#[tokio::test]
async fn test_raw_and_chat_views() {
    let (_mirror, app) = seeded_app().await;

    let response = app.clone().oneshot(get("/raw?doc=doc-new-0002")).await.unwrap();
    let html = extract_text(response.into_body()).await;
    assert!(html.contains("<td>trait</td><td>Grain yield</td>"));
    assert!(html.contains("Document Metadata"));

    let response = app.oneshot(get("/chat?doc=doc-new-0002")).await.unwrap();
    let html = extract_text(response.into_body()).await;
    assert!(html.contains(r#"data-document="doc-new-0002""#));
    assert!(html.contains(r#"<option value="mistral-large2" selected>"#));
}

#[tokio::test]
async fn test_no_documents_page() {
    let mirror = setup_mirror("").await;
    let app = setup_app(mirror.pool.clone(), Arc::new(FixedCompletion));

    let response = app.oneshot(get("/analytics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let html = extract_text(response.into_body()).await;
    assert!(html.contains("No documents found in the database."));
    assert!(html.contains("Please run the GWAS extraction pipeline first."));
}
