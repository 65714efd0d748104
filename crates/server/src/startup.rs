use std::sync::Arc;

use axum::Router;
use common::utils::logging::init_logging;
use configs::AppConfig;
use dotenvy::dotenv;
use service::{DocumentService, InMemoryStore};
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::errors::StartupError;
use crate::routes::{self, AppState};

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Construct the process-wide store once and hand it to the document service.
pub fn build_state(cfg: &AppConfig) -> AppState {
    let store = Arc::new(InMemoryStore::new());
    AppState { documents: DocumentService::new(store, &cfg.store) }
}

pub fn build_app(cfg: &AppConfig) -> Router {
    routes::build_router(build_state(cfg), build_cors())
}

/// Public entry: load config, build the app and run the HTTP server
pub async fn run() -> anyhow::Result<()> {
    dotenv().ok();

    let cfg = AppConfig::load_and_validate()
        .map_err(|e| StartupError::InvalidConfig(e.to_string()))?;
    init_logging(cfg.logging.format.as_str());

    let app = build_app(&cfg);

    let listener = tokio::net::TcpListener::bind(cfg.bind_addr()).await?;
    let addr = listener.local_addr()?;
    info!(%addr, patch_mode = ?cfg.store.patch_mode, "starting document cache");
    axum::serve(listener, app).await?;
    Ok(())
}
