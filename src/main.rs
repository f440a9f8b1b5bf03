//! Kurier webhook relay.
//!
//! Main entry point for the relay server. Loads configuration, starts the
//! HTTP server and coordinates graceful shutdown.

use std::time::Duration;

use anyhow::{Context, Result};
use kurier_api::{AppState, Config};
use tracing::{info, warn};

/// Time allowed for in-flight requests after a shutdown signal.
const SHUTDOWN_GRACE_SECONDS: u64 = 30;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration from environment
    let config = Config::load()?;

    init_tracing(&config.rust_log)?;

    info!("Starting Kurier webhook relay");
    info!(
        server_addr = %format!("{}:{}", config.host, config.port),
        relay_path = %config.relay_path,
        webhook_url = %config.webhook_url_masked().unwrap_or_else(|| "<unset>".to_string()),
        allowed_origins = ?config.allowed_origins,
        delivery_timeout_seconds = config.delivery_timeout_seconds,
        "Configuration loaded"
    );

    if config.webhook_url().is_none() {
        warn!("Webhook URL is not set; relay requests will fail until WEBHOOK_URL is configured");
    }
    if config.allowed_origins.is_empty() {
        warn!("No allowed origins configured; accepting submissions from any origin");
    }

    let addr = config.parse_server_addr()?;
    let state = AppState::from_config(&config).context("Failed to build delivery client")?;

    info!(addr = %addr, path = %config.relay_path, "Kurier is ready to relay messages");

    kurier_api::run_server(
        state,
        addr,
        kurier_api::shutdown_signal(),
        Duration::from_secs(SHUTDOWN_GRACE_SECONDS),
    )
    .await?;

    info!("Kurier shutdown complete");
    Ok(())
}

/// Initializes tracing with the configured filter directives.
fn init_tracing(directives: &str) -> Result<()> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_new(directives).context("Invalid RUST_LOG directives")?;

    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry().with(filter).with(fmt_layer).try_init()?;
    Ok(())
}
