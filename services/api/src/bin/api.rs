//! services/api/src/bin/api.rs

use smartstock_api::{
    adapters::{
        BackendClient, HttpAuthAdapter, HttpCatalogAdapter, HttpClassifierAdapter,
        HttpPricingAdapter, HttpProductTypeAdapter, HttpTrainingAdapter,
    },
    config::Config,
    error::ApiError,
    web::{
        router,
        state::{AppState, Ports},
    },
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to the Backend ---
    let backend = BackendClient::new(&config.backend_url, config.request_timeout)?;
    info!(backend = %config.backend_url, "Backend client ready");

    // --- 3. Initialize Service Adapters ---
    let ports = Ports {
        auth: Arc::new(HttpAuthAdapter::new(backend.clone())),
        classifier: Arc::new(HttpClassifierAdapter::new(backend.clone())),
        pricer: Arc::new(HttpPricingAdapter::new(backend.clone())),
        catalog: Arc::new(HttpCatalogAdapter::new(backend.clone())),
        product_types: Arc::new(HttpProductTypeAdapter::new(backend.clone())),
        training: Arc::new(HttpTrainingAdapter::new(backend)),
    };

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState::new(config.clone(), ports));

    // --- 5. Create the Web Router ---
    let app = router(app_state.clone())?;

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(app_state))
        .await?;

    Ok(())
}

/// Waits for Ctrl-C, then stops the training poller before the server drains.
async fn shutdown_signal(app_state: Arc<AppState>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    info!("Shutdown signal received");
    app_state.stop_training_monitor().await;
}
