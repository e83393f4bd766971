//! gwas-viewer - read-only viewer for GWAS trait extraction results
//!
//! Reads from the SQLite warehouse mirror or the Snowflake SQL API and
//! serves HTML views plus a JSON API.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use gwas_common::config::{self, ConfigOverrides, ViewerConfig, WarehouseBackend};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter};

use gwas_viewer::chat::ChatService;
use gwas_viewer::cortex::{
    CompletionService, EmbeddingService, KeywordPageSearch, SearchService, SnowflakeCompletion,
    SnowflakeEmbedding, SnowflakeSearch, UnconfiguredCompletion,
};
use gwas_viewer::warehouse::{
    sqlite, CachedWarehouse, SnowflakeClient, SnowflakeWarehouse, SqliteWarehouse, Warehouse,
};
use gwas_viewer::{build_router, AppState, ViewSettings};

/// Command-line arguments for gwas-viewer
#[derive(Parser, Debug)]
#[command(name = "gwas-viewer")]
#[command(about = "Read-only viewer for GWAS trait extraction results")]
#[command(version)]
struct Args {
    /// TOML config file
    #[arg(short, long, env = "GWAS_VIEWER_CONFIG")]
    config: Option<PathBuf>,

    /// Address to bind
    #[arg(long, env = "GWAS_VIEWER_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "GWAS_VIEWER_PORT")]
    port: Option<u16>,

    /// SQLite warehouse mirror
    #[arg(short, long, env = "GWAS_VIEWER_DATABASE")]
    database: Option<PathBuf>,

    /// Log filter when RUST_LOG is unset (e.g. "debug", "gwas_viewer=trace")
    #[arg(long, env = "GWAS_VIEWER_LOG_LEVEL")]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // RUST_LOG wins; otherwise start at info and switch to the configured level below
    let rust_log_set = std::env::var("RUST_LOG").is_ok();
    let initial_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let (filter_layer, filter_handle) = reload::Layer::new(initial_filter);
    tracing_subscriber::registry()
        .with(filter_layer)
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Log build identification immediately after tracing init
    info!(
        "Starting GWAS Trait Viewer (gwas-viewer) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let config_path = config::resolve_config_path(args.config.as_deref());
    let mut config = config::load_or_default(config_path.as_deref())?;
    config.apply_overrides(ConfigOverrides {
        host: args.host,
        port: args.port,
        database_path: args.database,
        log_level: args.log_level,
    });
    config.validate()?;

    if !rust_log_set {
        let level = config.logging.level.clone();
        match EnvFilter::try_new(&level) {
            Ok(filter) => {
                filter_handle
                    .modify(|f| *f = filter)
                    .context("Failed to apply log level")?;
            }
            Err(e) => error!("Ignoring invalid log level '{}': {}", level, e),
        }
    }

    let (warehouse, chat) = build_services(&config).await?;
    let state = AppState::new(warehouse, Arc::new(chat), ViewSettings::from_config(&config));
    let app = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("gwas-viewer listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Warehouse and chat service for the configured backend
async fn build_services(config: &ViewerConfig) -> Result<(Arc<dyn Warehouse>, ChatService)> {
    let ttl = Duration::from_secs(config.warehouse.cache_ttl_secs);
    let models = config.chat.models.clone();

    match config.warehouse.backend {
        WarehouseBackend::Sqlite => {
            let db_path = config.warehouse.resolved_database_path();
            info!("Warehouse mirror: {}", db_path.display());

            let pool = match sqlite::connect_readonly(&db_path).await {
                Ok(pool) => {
                    info!("✓ Connected to warehouse mirror (read-only)");
                    pool
                }
                Err(e) => {
                    error!("Failed to connect to warehouse mirror: {}", e);
                    return Err(e);
                }
            };

            let warehouse: Arc<dyn Warehouse> =
                Arc::new(CachedWarehouse::new(Arc::new(SqliteWarehouse::new(pool)), ttl));
            let search: Arc<dyn SearchService> = Arc::new(KeywordPageSearch::new(warehouse.clone()));
            let completion: Arc<dyn CompletionService> = Arc::new(UnconfiguredCompletion);
            info!("Chat uses keyword page search; completion is not configured for the SQLite backend");

            Ok((warehouse, ChatService::new(search, completion, None, models)))
        }
        WarehouseBackend::Snowflake => {
            let client = Arc::new(
                SnowflakeClient::from_config(&config.snowflake)
                    .context("Failed to configure Snowflake client")?,
            );
            info!(
                "Warehouse: Snowflake SQL API at {}",
                config.snowflake.account_url.as_deref().unwrap_or_default()
            );

            let warehouse: Arc<dyn Warehouse> = Arc::new(CachedWarehouse::new(
                Arc::new(SnowflakeWarehouse::new(client.clone())),
                ttl,
            ));
            let search: Arc<dyn SearchService> =
                Arc::new(SnowflakeSearch::new(client.clone(), config.chat.search_service.clone()));
            let completion: Arc<dyn CompletionService> = Arc::new(SnowflakeCompletion::new(client.clone()));
            let embedding: Arc<dyn EmbeddingService> =
                Arc::new(SnowflakeEmbedding::new(client, config.chat.embed_model.clone()));

            Ok((warehouse, ChatService::new(search, completion, Some(embedding), models)))
        }
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
