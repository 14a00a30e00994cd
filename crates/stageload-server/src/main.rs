//! Stageload Server - Main entry point

use anyhow::Result;
use stageload_common::logging::{init_logging, LogConfig};
use stageload_ingest::IngestionOrchestrator;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::{signal, sync::oneshot};
use tracing::{info, warn};

use stageload_server::{
    api::{self, AppState},
    config::Config,
    db::{self, PgTableLoader},
    storage::Storage,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Environment variables take precedence over these defaults
    let log_config = LogConfig::builder()
        .log_file_prefix("stageload-server")
        .filter_directives("stageload_server=debug,stageload_ingest=info,tower_http=info,sqlx=warn")
        .build()
        .overlay_env()?;

    let _guard = init_logging(&log_config)?;

    info!("Starting Stageload Server");

    let config = Config::load()?;
    info!(
        "Configuration loaded - server will bind to {}:{}",
        config.server.host, config.server.port
    );

    let registry = config.ingest.load_registry()?;
    info!(
        tables = registry.len(),
        source = config
            .ingest
            .registry_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "builtin".to_string()),
        "Schema registry ready"
    );

    let db_pool = db::create_pool(&config.database)?;

    let storage = Storage::new(config.storage.clone()).await?;

    let loader = PgTableLoader::new(db_pool.clone()).with_chunk_rows(config.ingest.load_chunk_rows);

    let orchestrator = IngestionOrchestrator::new(
        Arc::new(registry),
        Arc::new(storage),
        Arc::new(loader),
        config.ingest.orchestrator_config(),
    );

    let state = AppState {
        orchestrator: Arc::new(orchestrator),
        db: db_pool,
    };

    let app = api::create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                stop_rx.await.ok();
            })
            .await
    });

    shutdown_signal().await;
    stop_tx.send(()).ok();

    let timeout_secs = config.server.shutdown_timeout_secs;
    info!("Waiting up to {} seconds for connections to close", timeout_secs);
    match tokio::time::timeout(Duration::from_secs(timeout_secs), server).await {
        Ok(joined) => {
            joined??;
            info!("Server shut down gracefully");
        },
        Err(_) => warn!("Connections still open after {} seconds, exiting", timeout_secs),
    }

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        },
    }
}
