//! # Lapak Purchase API
//!
//! Purchase orchestration service behind the API gateway.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Purchase API Server                              │
//! │                                                                         │
//! │  Gateway ───► HTTP (3004) ───► PurchaseService ───► SQLite             │
//! │                                      │                                  │
//! │                                      ▼                                  │
//! │                          catalog (3003) / identity (3002)              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use lapak_core::PurchaseValidator;
use lapak_db::Database;
use lapak_purchase_api::auth::GatewayTrust;
use lapak_purchase_api::config::{AppConfig, LogFormat};
use lapak_purchase_api::routes::router;
use lapak_purchase_api::services::{PurchaseService, ServiceOptions};
use lapak_purchase_api::AppState;
use lapak_upstream::{CatalogClient, IdentityClient, InternalCredentials};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = AppConfig::load()?;

    init_tracing(config.log_format);

    info!("Starting Lapak purchase service...");
    info!(
        addr = %config.bind_address(),
        database = %config.database_path,
        catalog = %config.product_service_url,
        identity = %config.user_service_url,
        decrement_stock_on_proof = config.decrement_stock_on_proof,
        "Configuration loaded"
    );
    if config.uses_dev_secret() {
        warn!("INTERNAL_SECRET not set, using the development secret");
    }

    // Connect to database (runs migrations)
    let db = Database::new(config.db_config())
        .await
        .context("failed to open purchase database")?;

    // Outbound clients share one connection pool and credential set
    let upstream = config.upstream_config()?;
    let http = upstream
        .http_client()
        .context("failed to build upstream HTTP client")?;
    let credentials = Arc::new(InternalCredentials::from_config(&upstream));
    let catalog = CatalogClient::with_parts(http.clone(), &upstream, credentials.clone());
    let identity = IdentityClient::with_parts(http, &upstream, credentials);

    let validator = PurchaseValidator::new(config.validation_rules())?;
    let purchases = PurchaseService::new(
        db.clone(),
        Arc::new(catalog),
        Arc::new(identity),
        validator,
        ServiceOptions {
            decrement_stock_on_proof: config.decrement_stock_on_proof,
        },
    );

    // Create shared state
    let state = Arc::new(AppState {
        db: db.clone(),
        purchases,
        trust: Arc::new(GatewayTrust::new(
            config.internal_secret.clone(),
            config.gateway_name.clone(),
        )),
    });

    let listener = tokio::net::TcpListener::bind(config.bind_address())
        .await
        .with_context(|| format!("failed to bind {}", config.bind_address()))?;
    info!(addr = %config.bind_address(), "Starting HTTP server");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.pretty().init(),
    }
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
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

    info!("Shutdown signal received, starting graceful shutdown...");
}
