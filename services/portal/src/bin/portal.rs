//! services/portal/src/bin/portal.rs

use portal_lib::{
    adapters::{
        GatewayClient, HttpAttendanceService, HttpAuthService, HttpIncidentsService,
        HttpReservationsService,
    },
    config::Config,
    error::PortalError,
    web::{build_router, rest::ApiDoc, state::AppState},
};
use axum::Router;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), PortalError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Initialize Service Adapters ---
    // One pooled HTTP client is shared by every backend adapter.
    let gateway = GatewayClient::new(&config.gateway_url, config.gateway_timeout)
        .map_err(|e| PortalError::Internal(format!("Failed to build the gateway client: {e}")))?;
    info!(gateway_url = %gateway.base_url(), "Gateway client ready.");

    let auth = Arc::new(HttpAuthService::new(gateway.clone()));
    let attendance = Arc::new(HttpAttendanceService::new(gateway.clone()));
    let reservations = Arc::new(HttpReservationsService::new(gateway.clone()));
    let incidents = Arc::new(HttpIncidentsService::new(gateway));

    // --- 3. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        config: config.clone(),
        auth,
        attendance,
        reservations,
        incidents,
    });

    // --- 4. Create the Web Router ---
    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(build_router(app_state)?)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 5. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
