//! Health check handlers for service monitoring.
//!
//! The relay has no database, so health reflects configuration: without a
//! webhook URL the service is up but every relay request fails.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, instrument};

use crate::state::{AppState, RelaySettings};

/// Health check response structure.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Overall service health status
    pub status: HealthStatus,
    /// Timestamp when health check was performed
    pub timestamp: DateTime<Utc>,
    /// Individual component health checks
    pub checks: HealthChecks,
    /// Service version information
    pub version: String,
}

/// Overall health status enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Ready to relay messages
    Healthy,
    /// Serving, but relay requests will fail
    Degraded,
}

/// Individual component health check results.
#[derive(Debug, Serialize)]
pub struct HealthChecks {
    /// Downstream webhook configuration
    pub webhook: ComponentHealth,
}

/// Health status for individual components.
#[derive(Debug, Serialize)]
pub struct ComponentHealth {
    /// Component status
    pub status: ComponentStatus,
    /// Optional explanation when the component is down
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Component-level health status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    /// Component is usable
    Up,
    /// Component is missing or unusable
    Down,
}

/// Builds the health report for the given settings.
pub fn health_report(settings: &RelaySettings) -> HealthResponse {
    let webhook = if settings.webhook_url().is_some() {
        ComponentHealth { status: ComponentStatus::Up, message: None }
    } else {
        ComponentHealth {
            status: ComponentStatus::Down,
            message: Some("webhook URL not configured".to_string()),
        }
    };

    let status = match webhook.status {
        ComponentStatus::Up => HealthStatus::Healthy,
        ComponentStatus::Down => HealthStatus::Degraded,
    };

    HealthResponse {
        status,
        timestamp: Utc::now(),
        checks: HealthChecks { webhook },
        version: env!("CARGO_PKG_VERSION").to_string(),
    }
}

/// Health check endpoint handler.
///
/// Degraded still answers 200: the process is serving and reports the
/// configuration problem on every relay request.
#[instrument(name = "health_check", skip(app_state))]
pub async fn health_check(State(app_state): State<AppState>) -> Response {
    let response = health_report(&app_state.relay);

    debug!(
        status = ?response.status,
        webhook_status = ?response.checks.webhook.status,
        "Health check completed"
    );

    (StatusCode::OK, Json(response)).into_response()
}

/// Readiness check endpoint.
#[instrument(name = "readiness_check", skip(app_state))]
pub async fn readiness_check(State(app_state): State<AppState>) -> Response {
    health_check(State(app_state)).await
}

/// Liveness check endpoint.
///
/// Only proves the HTTP server responds.
pub async fn liveness_check() -> Response {
    let response = serde_json::json!({
        "status": "alive",
        "timestamp": Utc::now(),
        "service": "kurier-api"
    });

    (StatusCode::OK, Json(response)).into_response()
}
