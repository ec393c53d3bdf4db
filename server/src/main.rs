//! Warden Server - Main Entry Point

use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};

use warden_server::{
    api, config, permissions::SystemClock, service::PermissionService, settings::SettingsStore,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warden_server=debug,tower_http=debug".into()),
        )
        .json()
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Arc::new(config::Config::from_env()?);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        data_dir = %config.data_dir.display(),
        "Starting Warden Server"
    );

    let settings = SettingsStore::load(&config.settings_path);
    if !settings.config().has_owner() {
        warn!(
            path = %config.settings_path.display(),
            "No bot owner configured; owner-only commands are unavailable"
        );
    }
    if !settings.path().exists() {
        // Write defaults so the owner field can be filled in by hand.
        if let Err(e) = settings.save() {
            warn!(error = %e, "Could not write default settings file");
        }
    }

    let service = PermissionService::new(Arc::clone(&config), settings, Arc::new(SystemClock));

    // Build application state
    let state = api::AppState::new(service, Arc::clone(&config));

    // Build router
    let app = api::create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    info!(address = %config.bind_address, "Server listening");

    // Graceful shutdown handler
    let shutdown_signal = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install CTRL+C signal handler");
        info!("Received shutdown signal, cleaning up...");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("Server shutdown complete");

    Ok(())
}
