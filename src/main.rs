use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use atendimentos_api::app::{router, AppState};
use atendimentos_api::config::AppConfig;
use atendimentos_api::database::{DatabaseManager, MongoRepository};
use atendimentos_api::storage::{ObjectStore, S3ObjectStore, UnavailableStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so local runs pick up MONGODB_URI, MINIO_*, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env().context("invalid configuration")?;
    info!("Starting atendimentos API in {:?} mode", config.environment);

    let database = DatabaseManager::connect(&config.database)
        .await
        .context("failed to connect to the document store")?;

    let storage: Arc<dyn ObjectStore> = match S3ObjectStore::connect(&config.storage).await {
        Ok(store) => {
            if !store.reachable() {
                warn!("Object store unreachable at startup, /arquivos requests will fail");
            }
            Arc::new(store)
        }
        Err(e) => {
            warn!(error = %e, "Object store could not be configured, file routes disabled");
            Arc::new(UnavailableStore::new(&config.storage, e.to_string()))
        }
    };

    let repository = Arc::new(MongoRepository::new(database.database()));
    let port = config.server.port;
    let state = AppState::new(config, repository, storage);
    let app = router(state);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    info!("Listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    database.shutdown().await;
    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
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
