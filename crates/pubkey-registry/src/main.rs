//! Key Registry Server Binary
//!
//! Runs the HTTP server in front of the key registry.

use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::FmtSubscriber;

use pubkey_registry::{create_router, AppState, KeyRegistry, RedbStore, ServerConfig};

#[tokio::main]
async fn main() {
    // Configuration
    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            std::process::exit(2);
        }
    };

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level)
        .with_target(true)
        .with_thread_ids(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    // Open storage; the handle lives as long as the app state
    let store = match RedbStore::open(&config.database_path) {
        Ok(store) => store,
        Err(e) => {
            error!(path = %config.database_path.display(), error = %e, "Cannot open key database");
            std::process::exit(1);
        }
    };

    let registry = KeyRegistry::new(Arc::new(store), config.key_policy);
    let state = Arc::new(AppState::new(registry));

    // Build router
    let app = create_router(state);

    // Start server
    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    info!(addr = %addr, database = %config.database_path.display(), "Key registry listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    info!("Key registry stopped");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
        }
    };

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down"),
                }
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                ctrl_c.await;
                info!("Received Ctrl+C, shutting down");
            }
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c.await;
        info!("Received Ctrl+C, shutting down");
    }
}
