//! HTTP client for forwarding messages to the downstream webhook.
//!
//! Each delivery is one POST with a fixed timeout. Transport failures come
//! back as categorized errors; any HTTP response, successful or not, comes
//! back as a `DeliveryResponse` for the caller to judge.

use std::time::{Duration, Instant};

use bytes::Bytes;
use reqwest::Response;
use serde::{Deserialize, Serialize};
use tracing::{info_span, Instrument};
use uuid::Uuid;

use crate::error::{DeliveryError, ErrorCategory, Result};

/// Content type of every forwarded body.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Longest prefix of a downstream response body kept for logging.
pub const MAX_LOGGED_BODY: usize = 1024;

/// Configuration for the webhook delivery client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Timeout for the whole downstream exchange.
    pub timeout: Duration,
    /// User agent string for requests.
    pub user_agent: String,
    /// Maximum number of redirects to follow.
    pub max_redirects: u32,
    /// Whether to verify TLS certificates.
    pub verify_tls: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(crate::DEFAULT_TIMEOUT_SECONDS),
            user_agent: concat!("Kurier/", env!("CARGO_PKG_VERSION")).to_string(),
            max_redirects: 3,
            verify_tls: true,
        }
    }
}

/// HTTP client for webhook delivery.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct DeliveryClient {
    client: reqwest::Client,
    config: ClientConfig,
}

/// A single forwarding attempt.
#[derive(Debug, Clone)]
pub struct DeliveryRequest {
    /// Identifier for log correlation.
    pub delivery_id: Uuid,
    /// Destination webhook URL.
    pub url: String,
    /// Encoded JSON body.
    pub body: Bytes,
}

impl DeliveryRequest {
    /// Creates a request with a fresh delivery ID.
    pub fn new(url: impl Into<String>, body: Bytes) -> Self {
        Self { delivery_id: Uuid::new_v4(), url: url.into(), body }
    }
}

/// Outcome of a completed downstream exchange.
#[derive(Debug, Clone)]
pub struct DeliveryResponse {
    /// HTTP status code.
    pub status_code: u16,
    /// Response body, truncated for logging.
    pub body: String,
    /// Total duration of the exchange.
    pub duration: Duration,
    /// Whether the status was 2xx.
    pub is_success: bool,
}

impl DeliveryClient {
    /// Creates a new delivery client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns `DeliveryError::ConfigurationError` if the HTTP client cannot
    /// be configured with the provided settings.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects as usize))
            .danger_accept_invalid_certs(!config.verify_tls)
            .build()
            .map_err(|e| {
                DeliveryError::configuration(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self { client, config })
    }

    /// Creates a new delivery client with default configuration.
    pub fn with_defaults() -> Result<Self> {
        Self::new(ClientConfig::default())
    }

    /// Forwards a body to the downstream webhook.
    ///
    /// Makes exactly one attempt. A non-2xx status is logged and returned as
    /// a response, not an error.
    ///
    /// # Errors
    ///
    /// - `Timeout` when the exchange exceeds the configured timeout
    /// - `NetworkError` for connection and transport failures
    /// - `ConfigurationError` when the request cannot be built
    pub async fn deliver(&self, request: DeliveryRequest) -> Result<DeliveryResponse> {
        let start_time = Instant::now();

        let span = info_span!(
            "webhook_delivery",
            delivery_id = %request.delivery_id,
            body_bytes = request.body.len(),
        );

        async move {
            tracing::debug!("Starting webhook delivery");

            let http_request = self
                .client
                .post(&request.url)
                .header(reqwest::header::CONTENT_TYPE, JSON_CONTENT_TYPE)
                .body(request.body);

            let response = match http_request.send().await {
                Ok(response) => response,
                Err(e) => {
                    let error = self.classify_send_error(&e);
                    tracing::warn!(
                        duration_ms = start_time.elapsed().as_millis(),
                        category = %ErrorCategory::from(&error),
                        "Request failed: {}",
                        e
                    );
                    return Err(error);
                },
            };

            let delivery_response = Self::parse_response(response, start_time).await;

            match delivery_response.status_code {
                200..=299 => {
                    tracing::info!(
                        status = delivery_response.status_code,
                        duration_ms = delivery_response.duration.as_millis(),
                        "Webhook delivered successfully"
                    );
                },
                _ => {
                    tracing::warn!(
                        status = delivery_response.status_code,
                        duration_ms = delivery_response.duration.as_millis(),
                        body = %delivery_response.body,
                        "Webhook returned a non-success status"
                    );
                },
            }

            Ok(delivery_response)
        }
        .instrument(span)
        .await
    }

    /// Maps a failed send onto the delivery error taxonomy.
    fn classify_send_error(&self, e: &reqwest::Error) -> DeliveryError {
        if e.is_timeout() {
            DeliveryError::timeout(timeout_millis(self.config.timeout))
        } else if e.is_builder() {
            DeliveryError::configuration(format!("invalid webhook request: {e}"))
        } else if e.is_connect() {
            DeliveryError::network(format!("connection failed: {e}"))
        } else {
            DeliveryError::network(e.to_string())
        }
    }

    /// Reads at most `MAX_LOGGED_BODY` bytes of the body, then drops the rest.
    async fn parse_response(mut response: Response, start_time: Instant) -> DeliveryResponse {
        let status_code = response.status().as_u16();
        let is_success = response.status().is_success();

        let mut prefix = Vec::new();
        let mut truncated = false;

        let body = loop {
            match response.chunk().await {
                Ok(Some(chunk)) => {
                    let room = MAX_LOGGED_BODY - prefix.len();
                    if chunk.len() > room {
                        prefix.extend_from_slice(&chunk[..room]);
                        truncated = true;
                        break String::from_utf8_lossy(&prefix).into_owned();
                    }
                    prefix.extend_from_slice(&chunk);
                },
                Ok(None) => break String::from_utf8_lossy(&prefix).into_owned(),
                Err(e) => {
                    tracing::warn!("Failed to read response body: {}", e);
                    break format!("[Failed to read response body: {e}]");
                },
            }
        };

        let body = if truncated { format!("{body}... (truncated)") } else { body };

        DeliveryResponse { status_code, body, duration: start_time.elapsed(), is_success }
    }
}

fn timeout_millis(timeout: Duration) -> u64 {
    u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use wiremock::{matchers, Mock, MockServer, ResponseTemplate};

    use super::*;

    fn short_timeout_client() -> DeliveryClient {
        DeliveryClient::new(ClientConfig {
            timeout: Duration::from_millis(200),
            ..ClientConfig::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn successful_delivery() {
        let mock_server = MockServer::start().await;

        Mock::given(matchers::method("POST"))
            .and(matchers::path("/webhook"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = DeliveryClient::with_defaults().unwrap();
        let request = DeliveryRequest::new(
            format!("{}/webhook", mock_server.uri()),
            Bytes::from_static(br#"{"content":"hello"}"#),
        );

        let response = client.deliver(request).await.unwrap();

        assert_eq!(response.status_code, 204);
        assert!(response.is_success);
        assert!(response.body.is_empty());
    }

    #[tokio::test]
    async fn body_and_content_type_forwarded() {
        let mock_server = MockServer::start().await;

        Mock::given(matchers::method("POST"))
            .and(matchers::header("content-type", "application/json"))
            .and(matchers::body_string(r#"{"content":"hello","username":"bot"}"#))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = DeliveryClient::with_defaults().unwrap();
        let request = DeliveryRequest::new(
            mock_server.uri(),
            Bytes::from_static(br#"{"content":"hello","username":"bot"}"#),
        );

        let response = client.deliver(request).await.unwrap();
        assert!(response.is_success);
    }

    #[tokio::test]
    async fn user_agent_identifies_relay() {
        let mock_server = MockServer::start().await;

        Mock::given(matchers::method("POST"))
            .and(matchers::header("user-agent", concat!("Kurier/", env!("CARGO_PKG_VERSION"))))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = DeliveryClient::with_defaults().unwrap();
        let request = DeliveryRequest::new(mock_server.uri(), Bytes::from_static(b"{}"));

        assert!(client.deliver(request).await.is_ok());
    }

    #[tokio::test]
    async fn non_success_status_is_not_an_error() {
        let mock_server = MockServer::start().await;

        Mock::given(matchers::method("POST"))
            .respond_with(ResponseTemplate::new(404).set_body_string("Unknown Webhook"))
            .mount(&mock_server)
            .await;

        let client = DeliveryClient::with_defaults().unwrap();
        let request = DeliveryRequest::new(mock_server.uri(), Bytes::from_static(b"{}"));

        let response = client.deliver(request).await.unwrap();

        assert_eq!(response.status_code, 404);
        assert_eq!(response.body, "Unknown Webhook");
        assert!(!response.is_success);
    }

    #[tokio::test]
    async fn oversized_response_body_is_truncated() {
        let mock_server = MockServer::start().await;

        Mock::given(matchers::method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("x".repeat(4096)))
            .mount(&mock_server)
            .await;

        let client = DeliveryClient::with_defaults().unwrap();
        let request = DeliveryRequest::new(mock_server.uri(), Bytes::from_static(b"{}"));

        let response = client.deliver(request).await.unwrap();

        assert!(response.body.ends_with("... (truncated)"));
        assert_eq!(response.body.len(), MAX_LOGGED_BODY + "... (truncated)".len());
    }

    #[tokio::test]
    async fn body_at_limit_is_kept_whole() {
        let mock_server = MockServer::start().await;

        Mock::given(matchers::method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("y".repeat(MAX_LOGGED_BODY)))
            .mount(&mock_server)
            .await;

        let client = DeliveryClient::with_defaults().unwrap();
        let request = DeliveryRequest::new(mock_server.uri(), Bytes::from_static(b"{}"));

        let response = client.deliver(request).await.unwrap();

        assert_eq!(response.body, "y".repeat(MAX_LOGGED_BODY));
    }

    #[tokio::test]
    async fn slow_downstream_times_out() {
        let mock_server = MockServer::start().await;

        Mock::given(matchers::method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&mock_server)
            .await;

        let client = short_timeout_client();
        let request = DeliveryRequest::new(mock_server.uri(), Bytes::from_static(b"{}"));

        let error = client.deliver(request).await.unwrap_err();

        assert_eq!(error, DeliveryError::timeout(200));
    }

    #[tokio::test]
    async fn unreachable_downstream_is_network_error() {
        let client = short_timeout_client();
        let request = DeliveryRequest::new("http://127.0.0.1:1/webhook", Bytes::from_static(b"{}"));

        let error = client.deliver(request).await.unwrap_err();

        assert!(matches!(error, DeliveryError::NetworkError { .. }), "got {error:?}");
    }

    #[tokio::test]
    async fn malformed_url_is_configuration_error() {
        let client = DeliveryClient::with_defaults().unwrap();
        let request = DeliveryRequest::new("not a url", Bytes::from_static(b"{}"));

        let error = client.deliver(request).await.unwrap_err();

        assert!(matches!(error, DeliveryError::ConfigurationError { .. }), "got {error:?}");
    }

    #[test]
    fn default_timeout_is_ten_seconds() {
        assert_eq!(ClientConfig::default().timeout, Duration::from_secs(10));
    }
}
