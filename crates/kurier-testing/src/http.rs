//! Downstream webhook mock for relay testing.

use std::time::Duration;

use bytes::Bytes;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, Request, ResponseTemplate,
};

/// Path the mock webhook listens on.
pub const WEBHOOK_PATH: &str = "/api/webhooks/1234/test-token";

/// Mock chat webhook that records what the relay forwards.
pub struct MockWebhook {
    server: MockServer,
}

impl MockWebhook {
    /// Starts a new mock webhook on a random port.
    pub async fn start() -> Self {
        Self { server: MockServer::start().await }
    }

    /// Returns the full webhook URL to configure the relay with.
    pub fn url(&self) -> String {
        format!("{}{}", self.server.uri(), WEBHOOK_PATH)
    }

    /// Answers every POST with the given status.
    pub async fn respond_with_status(&self, status: u16) {
        self.mount(ResponseTemplate::new(status)).await;
    }

    /// Answers every POST with the given status after a delay.
    pub async fn respond_after(&self, status: u16, delay: Duration) {
        self.mount(ResponseTemplate::new(status).set_delay(delay)).await;
    }

    /// Answers every POST with the given status and body.
    pub async fn respond_with_body(&self, status: u16, body: impl Into<String>) {
        self.mount(ResponseTemplate::new(status).set_body_string(body.into())).await;
    }

    async fn mount(&self, response: ResponseTemplate) {
        Mock::given(method("POST"))
            .and(path(WEBHOOK_PATH))
            .respond_with(response)
            .mount(&self.server)
            .await;
    }

    /// Returns all requests received by the webhook.
    pub async fn received_requests(&self) -> Vec<Request> {
        self.server.received_requests().await.unwrap_or_default()
    }

    /// Returns the bodies of all requests received by the webhook.
    pub async fn received_bodies(&self) -> Vec<Bytes> {
        self.received_requests().await.into_iter().map(|request| Bytes::from(request.body)).collect()
    }

    /// Asserts that exactly n requests were received.
    pub async fn assert_request_count(&self, expected: usize) {
        let requests = self.received_requests().await;
        assert_eq!(
            requests.len(),
            expected,
            "Expected {} webhook requests, received {}",
            expected,
            requests.len()
        );
    }
}
