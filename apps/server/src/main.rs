//! # OrderDesk Server
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  browser / client ───► HTTP (3000) ───► handlers ───► SQLite            │
//! │                                             │                           │
//! │                                             ▼                           │
//! │                                   receipts/*.pdf ───► lp / PowerShell   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use orderdesk_db::{Database, DbConfig};
use orderdesk_server::api::create_router;
use orderdesk_server::printing::system_printer;
use orderdesk_server::{AppConfig, AppState};

// Target prefixes: `orderdesk` covers orderdesk_server and orderdesk_db.
const DEFAULT_LOG_FILTER: &str = "info,orderdesk=debug,sqlx=warn,tower_http=info";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Failed to load .env: {e}");
        }
    }

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_target(true)
        .init();

    info!("Starting OrderDesk server...");

    // Load configuration
    let config = AppConfig::load()?;
    info!(
        address = %config.bind_address(),
        prefix = %config.route_prefix(),
        database = %config.database_path.display(),
        receipts = %config.receipt_storage_path.display(),
        retention = config.receipt_retention_limit,
        "Configuration loaded"
    );
    if config.api_key().is_none() {
        warn!("No API key configured, only bearer tokens are checked");
    }

    tokio::fs::create_dir_all(&config.receipt_storage_path).await?;
    tokio::fs::create_dir_all(&config.settings_path).await?;

    // Connect to database (runs migrations)
    let db = Database::new(DbConfig::new(config.database_path.clone())).await?;

    let address = config.bind_address();
    let state = Arc::new(AppState::new(db.clone(), config, system_printer())?);
    let router = create_router(state);

    let listener = TcpListener::bind(&address).await?;
    info!(%address, "Listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
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

    info!("Shutdown signal received, draining connections");
}
