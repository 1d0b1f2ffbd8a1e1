use std::sync::Arc;

use checkin_server::blob::LocalBlobStore;
use checkin_server::config::Config;
use checkin_server::state::AppState;
use checkin_server::{build_router, db, metrics, tasks};
use tokio::net::TcpListener;
use tokio::signal;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("checkin_server=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;
    tracing::info!("Config loaded: port={}", config.port);

    let pool = db::connect(&config).await?;
    db::migrate(&pool).await?;
    tracing::info!("Database migrations applied");

    tasks::seed_admin(&pool, &config).await?;

    tracing::info!("Storing images under {}", config.blob_dir.display());
    let blobs = Arc::new(LocalBlobStore::new(config.blob_dir.clone()));

    tasks::spawn_maintenance(pool.clone());

    let port = config.port;
    let metrics_enabled = config.metrics_enabled;
    let mut state = AppState::new(pool, blobs, config);
    if metrics_enabled {
        state = state.with_metrics(metrics::install_recorder()?);
        tracing::info!("Prometheus metrics enabled at /metrics");
    }

    let app = build_router(state);

    let address = format!("0.0.0.0:{}", port);
    let listener = TcpListener::bind(&address).await?;
    tracing::info!("Server running on {}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
        tracing::info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
                tracing::info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
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
}
