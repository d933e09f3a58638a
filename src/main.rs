//! JSON Drop - A minimal anonymous JSON drop service
//!
//! Serves uploads and downloads over HTTP and sweeps stale entries in the
//! background.

use std::net::SocketAddr;

use anyhow::Context;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use json_drop::{create_router, spawn_sweep_task, AppState, Config};

/// Main entry point for the drop service.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Open the configured storage backend
/// 4. Start background expiry sweep
/// 5. Create Axum router with all endpoints
/// 6. Start HTTP server on configured port
/// 7. Drain connections on SIGINT/SIGTERM, then stop the sweep
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "json_drop=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting JSON Drop server");

    let config = Config::from_env();
    info!(
        "Configuration loaded: storage={:?}, data_dir={}, port={}, sweep_interval={}s, retention={}d, max_upload={}B",
        config.storage,
        config.data_dir.display(),
        config.server_port,
        config.sweep_interval,
        config.retention_days,
        config.max_upload_bytes
    );

    let state = AppState::from_config(&config)
        .await
        .context("failed to open storage backend")?;
    info!("Storage backend initialized");

    let sweep_handle = spawn_sweep_task(
        state.store.clone(),
        config.sweep_interval,
        config.retention(),
    );
    info!("Background expiry sweep started");

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let received = shutdown_signal().await;
            info!(signal = received, "Draining connections before shutdown");
        })
        .await
        .context("server error")?;

    // Connections are drained; nothing reads the store any more
    sweep_handle.abort();
    info!("Expiry sweep: stopped");

    info!("Server shutdown complete");
    Ok(())
}

/// Resolves with the name of the first termination signal received.
///
/// A signal whose handler cannot be installed is logged and never fires, so
/// the other one still shuts the server down.
async fn shutdown_signal() -> &'static str {
    let interrupted = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Cannot listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        _ = interrupted => "SIGINT",
        _ = terminated() => "SIGTERM",
    }
}

#[cfg(unix)]
async fn terminated() {
    use signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut stream) => {
            stream.recv().await;
        }
        Err(e) => {
            error!("Cannot listen for SIGTERM: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn terminated() {
    std::future::pending::<()>().await;
}
