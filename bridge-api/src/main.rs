//! bridge-api - Bridge sensor data query service
//!
//! Serves `GET /bridge-data/` over the configured SQLite table.

use std::sync::Arc;

use anyhow::{Context, Result};
use bridge_api::cli::{init_tracing, SettingsArgs};
use bridge_api::db::SqliteRowSource;
use bridge_api::{build_router, AppState};
use bridge_common::config::Settings;
use clap::Parser;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn};

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "bridge-api")]
#[command(about = "Bridge health sensor data query service", long_about = None)]
#[command(version)]
struct Args {
    #[command(flatten)]
    settings: SettingsArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    info!("Starting bridge-api v{}", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();

    let settings = Settings::load(args.settings.to_partial(), args.settings.config.as_deref())
        .context("Failed to resolve settings")?;
    let settings = Arc::new(settings);

    let source = SqliteRowSource::new(&settings).context("Failed to configure row source")?;
    info!(
        "Reading table '{}' from {}",
        source.table_name(),
        source.db_path().display()
    );
    if !source.db_path().exists() {
        warn!(
            "Database not found at {}; queries will fail until it is created (see bridge-load)",
            source.db_path().display()
        );
    }
    if settings.enable_debug_endpoint {
        warn!("Debug endpoint enabled at /debug/config");
    }

    let state = AppState::new(Arc::new(source), settings.clone());
    let app = build_router(state);

    let addr = settings.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("bridge-api listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
