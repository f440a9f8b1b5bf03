//! HTTP server configuration and request routing.
//!
//! Requests flow through middleware in order:
//! 1. Request ID generation
//! 2. Request/response logging
//! 3. Timeout enforcement (`request_timeout`, 30s default)
//! 4. Handler execution
//!
//! # Graceful Shutdown
//!
//! On CTRL+C or SIGTERM the server stops accepting connections and lets
//! in-flight relays finish.

use std::{future::Future, net::SocketAddr, time::Duration};

use axum::{
    extract::Request,
    middleware::{self, Next},
    response::Response,
    routing::{any, get},
    Router,
};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{handlers, state::AppState};

/// Creates the Axum router with all routes and middleware.
///
/// The relay handler is mounted on `state.relay.relay_path` for every
/// method so it can answer pre-flights and reject other methods itself.
///
/// # Example
///
/// ```no_run
/// use kurier_api::{create_router, AppState, RelaySettings};
/// use kurier_delivery::DeliveryClient;
///
/// let client = DeliveryClient::with_defaults().expect("client builds");
/// let settings = RelaySettings::default().with_webhook_url("https://hooks.example.com/1/t");
/// let app = create_router(AppState::new(settings, client));
/// // Serve the app...
/// ```
pub fn create_router(state: AppState) -> Router {
    let health_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/live", get(handlers::liveness_check));

    let relay_routes =
        Router::new().route(&state.relay.relay_path, any(handlers::relay_message));

    Router::new()
        .merge(health_routes)
        .merge(relay_routes)
        .layer(TimeoutLayer::new(state.relay.request_timeout))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(inject_request_id))
        .with_state(state)
}

/// Middleware to inject request ID into all responses.
///
/// Adds X-Request-Id header for tracing requests across services.
async fn inject_request_id(req: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4().to_string();

    let mut req = req;
    req.extensions_mut().insert(request_id.clone());

    let mut response = next.run(req).await;

    if let Ok(header_value) = request_id.parse() {
        response.headers_mut().insert("X-Request-Id", header_value);
    }

    response
}

/// Starts the HTTP server with graceful shutdown support.
///
/// # Errors
///
/// Returns `std::io::Error` if:
/// - Port is already in use
/// - Network interface unavailable
pub async fn start_server(state: AppState, addr: SocketAddr) -> Result<(), std::io::Error> {
    let app = create_router(state);

    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let actual_addr = listener.local_addr()?;

    info!("HTTP server listening on {}", actual_addr);

    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    info!("HTTP server stopped gracefully");
    Ok(())
}

/// Runs the server until `shutdown` resolves, then allows `grace` for
/// in-flight requests to drain.
///
/// # Errors
///
/// Returns an error when the server fails before shutdown is requested,
/// for example when the address is already in use.
pub async fn run_server<F>(
    state: AppState,
    addr: SocketAddr,
    shutdown: F,
    grace: Duration,
) -> anyhow::Result<()>
where
    F: Future<Output = ()>,
{
    let mut server_handle = tokio::spawn(start_server(state, addr));

    tokio::select! {
        result = &mut server_handle => {
            return match result {
                Ok(Ok(())) => {
                    info!("Server stopped");
                    Ok(())
                },
                Ok(Err(e)) => Err(anyhow::Error::new(e).context(format!("HTTP server on {addr} failed"))),
                Err(e) => Err(anyhow::Error::new(e).context("HTTP server task aborted")),
            };
        },
        () = shutdown => {
            info!("Shutdown signal received, starting graceful shutdown");
        },
    }

    tokio::select! {
        _ = tokio::time::sleep(grace) => {
            info!("Shutdown grace period expired");
        },
        _ = server_handle => {
            info!("Server stopped");
        },
    }

    Ok(())
}

/// Waits for shutdown signal (CTRL+C or SIGTERM).
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received CTRL+C, starting graceful shutdown");
        },
        () = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        },
    }

    warn!("Waiting for in-flight relay requests to complete");
}
