// ABOUTME: Server bootstrap and maintenance commands for Tasklane
// ABOUTME: Opens the store, converges the schema, and serves the API with CORS and tracing

use std::net::SocketAddr;

use anyhow::Context;
use axum::http::{HeaderValue, Method};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tasklane_api::{create_router, DbState};
use tasklane_files::FileStorage;
use tasklane_storage::{connect, ensure_schema, SchemaReport, StorageConfig};

pub mod config;

pub use config::{Config, ConfigError};

/// Install the global tracing subscriber (`RUST_LOG`, default `info`)
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

/// Open the store, converge it, and serve until Ctrl-C
pub async fn run_server(config: Config) -> anyhow::Result<()> {
    let pool = connect(&StorageConfig::new(&config.database_path))
        .await
        .context("Failed to open database")?;

    let report = ensure_schema(&pool)
        .await
        .context("Failed to converge database schema")?;
    if !report.is_noop() {
        info!("Schema converged: {:?}", report);
    }

    FileStorage::new(pool.clone(), &config.upload_dir)
        .ensure_upload_dir()
        .await
        .with_context(|| format!("Failed to create {}", config.upload_dir.display()))?;

    let cors = CorsLayer::new()
        .allow_origin(
            config
                .cors_origin
                .parse::<HeaderValue>()
                .context("Invalid CORS origin")?,
        )
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers(Any);

    let state = DbState::new(pool, &config.database_path, &config.upload_dir);
    let app = create_router(state, config.max_upload_bytes)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::new(config.host, config.port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Database: {}", config.database_path.display());
    info!("Uploads: {}", config.upload_dir.display());
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Converge the store without serving and report what changed
pub async fn run_migrate(config: &Config) -> anyhow::Result<SchemaReport> {
    let pool = connect(&StorageConfig::new(&config.database_path))
        .await
        .context("Failed to open database")?;

    let report = ensure_schema(&pool).await?;
    pool.close().await;
    Ok(report)
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}
