use std::sync::Arc;

use anyhow::Context;
use common::storage::filesystem::FilesystemBlobStore;
use tokio::signal;
use tracing::info;

use hunt_server::config::AppConfig;
use hunt_server::database::{ensure_indexes, init_db, prepare_sqlite_dir};
use hunt_server::feed::ChangeFeed;
use hunt_server::service::HuntService;
use hunt_server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    prepare_sqlite_dir(&config.database.url)
        .await
        .context("Failed to create database directory")?;
    let db = init_db(&config.database.url)
        .await
        .context("Failed to connect to database")?;
    ensure_indexes(&db)
        .await
        .context("Failed to create database indexes")?;

    let blob_store = FilesystemBlobStore::new(
        config.storage.media_dir.clone(),
        config.storage.max_blob_size,
    )
    .await
    .context("Failed to initialize media storage")?;
    info!(dir = %config.storage.media_dir.display(), "Media storage ready");

    let hunts = HuntService::new(db, Arc::new(blob_store), ChangeFeed::default());
    let state = AppState {
        hunts: hunts.clone(),
        config: config.clone(),
    };
    let app = hunt_server::build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Server running at http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Waiting for background media cleanup");
    hunts.drain_background_tasks().await;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
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
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
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
    info!("Shutdown signal received");
}
