//! SalesPGM upload server implementation
//!
//! HTTP front end for the pipeline: a sheet is uploaded, processed, and the
//! result is offered for download by name.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use super::handlers;
use crate::config::PipelineConfig;
use crate::core::Pipeline;

/// API Server configuration
#[derive(Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    /// Where uploads are staged and processed files are served from
    pub download_dir: PathBuf,
    pub max_upload_bytes: usize,
    /// Fixed seed for the random source (reproducible runs)
    pub seed: Option<u64>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            download_dir: PathBuf::from("downloads"),
            max_upload_bytes: 25 * 1024 * 1024,
            seed: None,
        }
    }
}

/// Shared application state
pub struct AppState {
    pub version: String,
    pub download_dir: PathBuf,
    pub pipeline: Pipeline,
    pub seed: Option<u64>,
}

impl AppState {
    pub fn new(download_dir: PathBuf, pipeline: Pipeline, seed: Option<u64>) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            download_dir,
            pipeline,
            seed,
        }
    }
}

/// Routes, without the network listener
pub fn router(state: Arc<AppState>, max_upload_bytes: usize) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/version", get(handlers::version))
        .route("/upload", post(handlers::upload))
        .route("/download/:filename", get(handlers::download))
        .with_state(state)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Run the API server
pub async fn run_api_server(config: ApiConfig, pipeline_config: PipelineConfig) -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "salespgm=info,tower_http=info".into()),
        )
        .init();

    std::fs::create_dir_all(&config.download_dir)?;
    let variant = pipeline_config.variant;
    let pipeline = Pipeline::new(pipeline_config)?;
    let state = Arc::new(AppState::new(config.download_dir.clone(), pipeline, config.seed));
    let app = router(state, config.max_upload_bytes);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("🧾 SalesPGM server starting on http://{}", addr);
    info!("   Variant: {}, downloads: {}", variant.name(), config.download_dir.display());
    info!("   Endpoints: POST /upload, GET /download/:filename, GET /health");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("SalesPGM server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, stopping server...");
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== ApiConfig Tests ====================

    #[test]
    fn test_default_config() {
        let config = ApiConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8000);
        assert_eq!(config.download_dir, PathBuf::from("downloads"));
        assert!(config.seed.is_none());
    }

    #[test]
    fn test_config_address_format() {
        let config = ApiConfig {
            host: "192.168.1.100".to_string(),
            port: 9090,
            ..ApiConfig::default()
        };
        let addr_str = format!("{}:{}", config.host, config.port);
        let addr: SocketAddr = addr_str.parse().unwrap();
        assert_eq!(addr.port(), 9090);
    }

    // ==================== AppState Tests ====================

    #[test]
    fn test_app_state_version() {
        let pipeline = Pipeline::new(PipelineConfig::standard()).unwrap();
        let state = AppState::new(PathBuf::from("out"), pipeline, Some(3));
        assert_eq!(state.version, env!("CARGO_PKG_VERSION"));
        assert_eq!(state.seed, Some(3));
    }
}
