use std::sync::Arc;

use anyhow::Result;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::broadcast;

use campaign_messaging_service::config::Settings;
use campaign_messaging_service::delivery::delivery_channel;
use campaign_messaging_service::postgres::PostgresPool;
use campaign_messaging_service::server::{create_app, AppState};
use campaign_messaging_service::store::create_store;
use campaign_messaging_service::tasks::DeliveryWorker;
use campaign_messaging_service::telemetry::init_telemetry;

#[tokio::main]
async fn main() -> Result<()> {
    // Load and validate configuration
    let settings = Settings::new()?;

    // Initialize tracing
    let _telemetry = init_telemetry(&settings.otel)?;
    tracing::info!(
        store_backend = %settings.store.backend,
        max_concurrency = settings.dispatch.max_concurrency,
        "Configuration loaded"
    );

    // PostgreSQL pool, only when the store needs it
    let postgres_pool = if settings.store.uses_postgres() {
        Some(Arc::new(PostgresPool::new(&settings.database).await?))
    } else {
        None
    };

    let store = create_store(&settings.store, postgres_pool.clone());

    // Delivery hand-off worker
    let (shutdown_tx, _) = broadcast::channel::<()>(1);
    let (notifier, receiver) = delivery_channel(settings.dispatch.delivery_buffer);
    let worker = DeliveryWorker::new(receiver, shutdown_tx.subscribe());
    let worker_handle = tokio::spawn(worker.run());

    // Create application state
    let state = AppState::new(
        settings.clone(),
        store,
        Arc::new(notifier),
        postgres_pool.clone(),
    );
    tracing::info!("Application state initialized");

    let app = create_app(state);

    // Start server
    let addr = settings.server_addr();
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal_handler(shutdown_tx))
        .await?;

    tracing::info!("Waiting for delivery worker to finish...");
    let _ = worker_handle.await;

    if let Some(pool) = postgres_pool {
        pool.close().await;
    }

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal_handler(shutdown_tx: broadcast::Sender<()>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        }
    }

    // Stop background tasks
    let _ = shutdown_tx.send(());
}
