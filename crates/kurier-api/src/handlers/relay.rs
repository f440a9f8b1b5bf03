//! Message relay handler.
//!
//! Accepts a chat message from a browser or script, forwards it to the
//! configured webhook in one attempt, and tells the caller how it went.
//! The pipeline stops at the first failing step:
//!
//! 1. Method gate (`OPTIONS` answered here, anything but `POST` rejected)
//! 2. Origin gate
//! 3. Webhook URL lookup
//! 4. Body parsing
//! 5. Content check
//! 6. Re-encoding
//! 7. Downstream dispatch
//!
//! A non-2xx answer from the webhook is only logged; the caller still sees
//! success once the exchange completed.

use axum::{
    extract::State,
    http::{
        header::{
            ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
            ACCESS_CONTROL_ALLOW_ORIGIN, ALLOW, ORIGIN, VARY,
        },
        HeaderMap, HeaderValue, Method, StatusCode,
    },
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use kurier_core::{AllowedOrigin, MessagePayload, RelayError};
use kurier_delivery::DeliveryRequest;
use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};

use crate::state::AppState;

/// Methods advertised to pre-flight requests.
pub const ALLOWED_METHODS: &str = "POST, OPTIONS";

/// Request headers advertised to pre-flight requests.
pub const ALLOWED_HEADERS: &str = "Content-Type";

/// Header carrying the error code on failed requests.
pub const ERROR_CODE_HEADER: &str = "x-error-code";

/// Response from a successful relay.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayResponse {
    /// Always `success`
    pub status: &'static str,
    /// The message content that was forwarded
    pub received_message: String,
}

/// Relays a chat message to the downstream webhook.
///
/// # Errors
///
/// Returns plain-text error responses:
/// - 400: Malformed body or empty content
/// - 403: Origin not in the allow-list
/// - 405: Method other than `POST` or `OPTIONS`
/// - 500: Webhook URL unset, encoding failure, or downstream unreachable
#[instrument(
    name = "relay_message",
    skip(state, headers, body),
    fields(
        origin = headers.get(ORIGIN).and_then(|v| v.to_str().ok()).unwrap_or("none"),
        content_length = body.len(),
    )
)]
pub async fn relay_message(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let origin = headers.get(ORIGIN).and_then(|v| v.to_str().ok());

    if method == Method::OPTIONS {
        debug!("Answering pre-flight request");
        let allowed = state.relay.origin_policy.check(origin).ok();
        return preflight_response(allowed.as_ref());
    }

    if method != Method::POST {
        debug!("Rejecting unsupported method");
        return create_error_response(
            &RelayError::MethodNotAllowed { method: method.to_string() },
            None,
        );
    }

    let allowed = match state.relay.origin_policy.check(origin) {
        Ok(allowed) => allowed,
        Err(e) => {
            warn!(error = %e, "Rejecting request from unlisted origin");
            return create_error_response(&e, None);
        },
    };

    match forward(&state, &body).await {
        Ok(received_message) => {
            info!("Message relayed");
            let mut response = (
                StatusCode::OK,
                Json(RelayResponse { status: "success", received_message }),
            )
                .into_response();
            apply_cors_headers(response.headers_mut(), Some(&allowed));
            response
        },
        Err(e) => {
            if e.is_client_error() {
                warn!(error = %e, code = e.code(), "Rejecting relay request");
            } else {
                error!(error = %e, code = e.code(), "Relay request failed");
            }
            create_error_response(&e, Some(&allowed))
        },
    }
}

/// Runs the relay steps after the method and origin gates.
///
/// Returns the forwarded content on success.
async fn forward(state: &AppState, body: &[u8]) -> Result<String, RelayError> {
    let Some(webhook_url) = state.relay.webhook_url() else {
        error!("FATAL: webhook URL is not configured");
        return Err(RelayError::MissingWebhookUrl);
    };

    let payload = MessagePayload::from_json(body)?;
    let content = payload.require_content()?.to_string();

    debug!(
        content_chars = content.chars().count(),
        username = payload.username.as_deref().unwrap_or("none"),
        "Received message"
    );

    let wire_body = payload.to_wire()?;

    // Non-2xx answers are logged by the client and still count as relayed.
    let response = state.client.deliver(DeliveryRequest::new(webhook_url, wire_body)).await?;

    debug!(
        status = response.status_code,
        duration_ms = response.duration.as_millis(),
        "Webhook exchange completed"
    );

    Ok(content)
}

/// Builds the empty pre-flight acknowledgement.
fn preflight_response(allowed: Option<&AllowedOrigin>) -> Response {
    let mut response = StatusCode::OK.into_response();
    apply_cors_headers(response.headers_mut(), allowed);
    response
}

/// Creates a plain-text error response carrying the error code.
fn create_error_response(error: &RelayError, allowed: Option<&AllowedOrigin>) -> Response {
    let status =
        StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    let mut response = (status, error.public_message()).into_response();
    let headers = response.headers_mut();

    headers.insert(ERROR_CODE_HEADER, HeaderValue::from_static(error.code()));
    if status == StatusCode::METHOD_NOT_ALLOWED {
        headers.insert(ALLOW, HeaderValue::from_static(ALLOWED_METHODS));
    }
    apply_cors_headers(headers, allowed);

    response
}

/// Adds the cross-origin headers, echoing the origin when one was allowed.
fn apply_cors_headers(headers: &mut HeaderMap, allowed: Option<&AllowedOrigin>) {
    headers.insert(ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static(ALLOWED_METHODS));
    headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static(ALLOWED_HEADERS));

    let Some(allowed) = allowed else { return };

    if let Ok(value) = HeaderValue::from_str(allowed.header_value()) {
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, value);
    }
    if matches!(allowed, AllowedOrigin::Exact(_)) {
        headers.insert(VARY, HeaderValue::from_static("Origin"));
    }
}
