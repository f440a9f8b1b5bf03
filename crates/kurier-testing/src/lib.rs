//! Test infrastructure for the Kurier relay.
//!
//! Runs a mock downstream webhook and builds routers pointed at it, so
//! tests can drive the relay end to end without network access beyond
//! localhost.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

use std::time::Duration;

use axum::Router;
use kurier_api::{create_router, AppState, RelaySettings};
use kurier_delivery::{ClientConfig, DeliveryClient};

pub mod http;
pub mod requests;

pub use http::{MockWebhook, WEBHOOK_PATH};
pub use kurier_api::DEFAULT_RELAY_PATH;

/// Test environment wired to a mock downstream webhook.
pub struct TestEnv {
    /// Mock downstream webhook
    pub webhook: MockWebhook,
    /// Settings the router is built with
    pub settings: RelaySettings,
    client: DeliveryClient,
}

impl TestEnv {
    /// Creates an environment with the webhook configured and any origin
    /// allowed.
    pub async fn new() -> Self {
        TestEnvBuilder::new().build().await
    }

    /// Starts building a customised environment.
    pub fn builder() -> TestEnvBuilder {
        TestEnvBuilder::new()
    }

    /// Builds a fresh router over this environment's settings.
    pub fn router(&self) -> Router {
        create_router(AppState::new(self.settings.clone(), self.client.clone()))
    }

    /// Path the relay handler is mounted on.
    pub fn relay_path(&self) -> &str {
        &self.settings.relay_path
    }
}

/// Builder for configuring a [`TestEnv`].
pub struct TestEnvBuilder {
    configure_webhook: bool,
    allowed_origins: Vec<String>,
    delivery_timeout: Duration,
    relay_path: String,
}

impl Default for TestEnvBuilder {
    fn default() -> Self {
        Self {
            configure_webhook: true,
            allowed_origins: Vec::new(),
            delivery_timeout: Duration::from_secs(2),
            relay_path: DEFAULT_RELAY_PATH.to_string(),
        }
    }
}

impl TestEnvBuilder {
    /// Creates a new builder with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Leaves the webhook URL unset.
    #[must_use]
    pub fn without_webhook_url(mut self) -> Self {
        self.configure_webhook = false;
        self
    }

    /// Restricts submissions to the given origins.
    #[must_use]
    pub fn allowed_origins<I, S>(mut self, origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_origins = origins.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the downstream timeout (default: 2s).
    #[must_use]
    pub fn delivery_timeout(mut self, timeout: Duration) -> Self {
        self.delivery_timeout = timeout;
        self
    }

    /// Mounts the relay on a different path.
    #[must_use]
    pub fn relay_path(mut self, path: impl Into<String>) -> Self {
        self.relay_path = path.into();
        self
    }

    /// Starts the mock webhook and assembles the environment.
    pub async fn build(self) -> TestEnv {
        let webhook = MockWebhook::start().await;

        let mut settings = RelaySettings::default()
            .with_relay_path(self.relay_path)
            .with_allowed_origins(&self.allowed_origins);
        if self.configure_webhook {
            settings = settings.with_webhook_url(webhook.url());
        }

        let client = DeliveryClient::new(ClientConfig {
            timeout: self.delivery_timeout,
            ..ClientConfig::default()
        })
        .expect("test delivery client builds");

        TestEnv { webhook, settings, client }
    }
}
