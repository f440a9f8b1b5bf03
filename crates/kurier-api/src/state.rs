//! Shared, read-only state handed to every request.

use std::{sync::Arc, time::Duration};

use kurier_core::OriginPolicy;
use kurier_delivery::{DeliveryClient, DeliveryError};

use crate::config::Config;

/// Settings the relay route reads on every request.
#[derive(Debug, Clone)]
pub struct RelaySettings {
    /// Path the relay handler is mounted on.
    pub relay_path: String,
    /// Downstream webhook URL; requests fail while it is unset.
    pub webhook_url: Option<String>,
    /// Browser origins allowed to submit.
    pub origin_policy: OriginPolicy,
    /// Upper bound for handling one inbound request.
    pub request_timeout: Duration,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            relay_path: crate::DEFAULT_RELAY_PATH.to_string(),
            webhook_url: None,
            origin_policy: OriginPolicy::Any,
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl RelaySettings {
    /// Sets the downstream webhook URL.
    #[must_use]
    pub fn with_webhook_url(mut self, url: impl Into<String>) -> Self {
        self.webhook_url = Some(url.into());
        self
    }

    /// Restricts submissions to the given origins.
    #[must_use]
    pub fn with_allowed_origins<I, S>(mut self, origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.origin_policy = OriginPolicy::from_origins(origins);
        self
    }

    /// Mounts the relay handler on a different path.
    #[must_use]
    pub fn with_relay_path(mut self, path: impl Into<String>) -> Self {
        self.relay_path = path.into();
        self
    }

    /// Returns the webhook URL when it is set and not blank.
    pub fn webhook_url(&self) -> Option<&str> {
        self.webhook_url.as_deref().map(str::trim).filter(|url| !url.is_empty())
    }
}

/// Application state shared across handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Relay route settings.
    pub relay: Arc<RelaySettings>,
    /// Downstream delivery client.
    pub client: DeliveryClient,
}

impl AppState {
    /// Creates state from settings and a delivery client.
    pub fn new(relay: RelaySettings, client: DeliveryClient) -> Self {
        Self { relay: Arc::new(relay), client }
    }

    /// Builds state from loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns `DeliveryError::ConfigurationError` if the HTTP client cannot
    /// be built.
    pub fn from_config(config: &Config) -> Result<Self, DeliveryError> {
        let client = DeliveryClient::new(config.to_client_config())?;
        Ok(Self::new(config.relay_settings(), client))
    }
}
