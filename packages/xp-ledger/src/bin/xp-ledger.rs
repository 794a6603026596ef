//! XP ledger service binary.

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use xp_ledger::config::StorageBackend;
use xp_ledger::{create_router, store, AppState, Config};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting XP ledger");

    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "FATAL: Config error, fix env vars or xp-ledger.toml");
            std::process::exit(1);
        }
    };

    if config.api_key.is_some() {
        info!("API key auth enabled");
    } else {
        warn!("LEDGER_API_KEY not set, award routes are unprotected (dev mode)");
    }

    info!(
        backend = ?config.storage.backend,
        path = %config.storage.path,
        debounce_ms = config.debounce_ms,
        sbt_capacity = config.sbt_capacity,
        "Configuration loaded"
    );

    let bind_address = config.bind_address.clone();
    let flush_every = (config.storage.backend == StorageBackend::File
        && config.storage.flush_interval_secs > 0)
        .then(|| std::time::Duration::from_secs(config.storage.flush_interval_secs));

    let state = Arc::new(AppState::new(config)?);

    let cancel = CancellationToken::new();
    let flusher = flush_every.map(|interval| {
        let store = Arc::clone(state.ledger.store());
        let cancel_bg = cancel.clone();
        tokio::spawn(store::run_flusher(store, interval, cancel_bg))
    });

    let app = create_router(state.clone());

    info!(address = %bind_address, "Listening");

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // --- Graceful shutdown: stop flusher, write final snapshot ---
    info!("HTTP server stopped, flushing ledger state...");
    cancel.cancel();
    if let Some(handle) = flusher {
        if let Err(e) = handle.await {
            warn!(error = %e, "Snapshot flusher task ended abnormally");
        }
    }

    if let Err(e) = state.ledger.store().flush() {
        error!(error = %e, "Failed to flush ledger store on shutdown");
    } else {
        info!("Ledger store flushed");
    }

    info!("XP ledger shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT, shutting down..."),
        _ = terminate => info!("Received SIGTERM, shutting down..."),
    }
}
