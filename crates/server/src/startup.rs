use std::{net::SocketAddr, path::Path, sync::Arc};

use anyhow::Context as _;
use axum::Router;
use configs::{AppConfig, StorageBackend};
use migration::MigratorTrait;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use service::storage::memory::InMemoryStore;

use crate::errors::StartupError;
use crate::routes;
use crate::state::AppState;

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// `config.toml` (or `CONFIG_PATH`) when present, environment otherwise.
pub fn load_config() -> Result<AppConfig, StartupError> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    if Path::new(&path).exists() {
        let mut cfg = configs::load_from_file(&path).map_err(|e| StartupError::InvalidConfig(format!("{path}: {e}")))?;
        cfg.normalize_and_validate().map_err(|e| StartupError::InvalidConfig(e.to_string()))?;
        Ok(cfg)
    } else {
        warn!(%path, "config file not found, using environment");
        AppConfig::from_env().map_err(|e| StartupError::InvalidConfig(e.to_string()))
    }
}

/// Build the state for the configured backend. Postgres runs pending
/// migrations first; the memory backend starts with the default catalog.
pub async fn build_state(cfg: &AppConfig) -> anyhow::Result<AppState> {
    match cfg.database.backend {
        StorageBackend::Postgres => {
            let db = models::db::connect_with_config(&cfg.database).await?;
            migration::Migrator::up(&db, None).await.context("running migrations")?;
            Ok(AppState::postgres(db, cfg))
        }
        StorageBackend::Memory => {
            let store = Arc::new(InMemoryStore::new());
            store.seed_default_catalog();
            info!("using in-memory storage; data is lost on restart");
            Ok(AppState::in_memory(store, cfg))
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl_c");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

/// Public entry: load config, build the app and serve until Ctrl+C.
pub async fn run() -> anyhow::Result<()> {
    let cfg = load_config()?;
    run_with_config(cfg).await
}

pub async fn run_with_config(cfg: AppConfig) -> anyhow::Result<()> {
    let state = build_state(&cfg).await?;
    let app: Router = routes::build_router(state, build_cors());

    let addr: SocketAddr = format!("{}:{}", cfg.server.host, cfg.server.port)
        .parse()
        .map_err(|e| StartupError::InvalidConfig(format!("bind address: {e}")))?;
    info!(%addr, backend = ?cfg.database.backend, "starting server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    info!("server stopped");
    Ok(())
}
