// Tuukaa auth gateway server
// Decision: Configuration comes from the environment (with .env support); AUTH_SECRET is mandatory

use anyhow::{Context, Result};
use tuukaa_gateway::auth::{AuthState, GatewayConfig};
use tuukaa_gateway::telemetry::{init_telemetry, TelemetryConfig};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Configure via environment variables:
    // - RUST_LOG / LOG_LEVEL: Log filter (default: "info")
    init_telemetry(TelemetryConfig::from_env());

    tracing::info!("tuukaa-gateway starting...");

    let config = match GatewayConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            return Err(e);
        }
    };
    config.log_startup_checks();

    let bind_addr = config.bind_addr.clone();
    let state = AuthState::new(config).context("Failed to create auth state")?;
    let app = tuukaa_gateway::app(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;
    tracing::info!(address = %bind_addr, "tuukaa-gateway listening");

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
