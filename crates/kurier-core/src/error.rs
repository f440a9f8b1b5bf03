//! Error taxonomy for relay operations.
//!
//! Every failure a relay request can hit maps onto one `RelayError` variant
//! with a stable code, an HTTP status and a short caller-facing message.
//! Client errors echo their reason back; server errors keep details in the
//! logs and hand the caller a generic message.

use thiserror::Error;

/// Result type alias using `RelayError`.
pub type Result<T> = std::result::Result<T, RelayError>;

/// Relay error types with stable codes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    // Client Errors (E1001-E1004)
    /// Request method is neither the submission method nor a pre-flight
    /// (E1001).
    #[error("[E1001] Method not allowed: {method}")]
    MethodNotAllowed {
        /// The rejected request method
        method: String,
    },

    /// Request origin is not in the configured allow-list (E1002).
    #[error("[E1002] Forbidden origin: {origin}")]
    ForbiddenOrigin {
        /// The origin the request declared, or `<none>`
        origin: String,
    },

    /// Request body is not a valid message payload (E1003).
    #[error("[E1003] Invalid payload: {reason}")]
    InvalidPayload {
        /// Parser error text
        reason: String,
    },

    /// Message content is missing or empty (E1004).
    #[error("[E1004] Empty content: the 'content' field cannot be empty")]
    EmptyContent,

    // Delivery Errors (E2001-E2002)
    /// Downstream webhook could not be reached (E2001).
    #[error("[E2001] Downstream unavailable: {reason}")]
    DownstreamUnavailable {
        /// Transport error description
        reason: String,
    },

    /// Downstream webhook did not answer within the timeout (E2002).
    #[error("[E2002] Downstream timeout: exceeded {timeout_ms}ms")]
    DownstreamTimeout {
        /// Timeout that was exceeded in milliseconds
        timeout_ms: u64,
    },

    // System Errors (E3001-E3002)
    /// Downstream webhook URL is not configured (E3001).
    #[error("[E3001] Missing configuration: webhook URL not set")]
    MissingWebhookUrl,

    /// Payload could not be encoded for forwarding (E3002).
    #[error("[E3002] Serialization failed: {reason}")]
    Serialization {
        /// Encoder error text
        reason: String,
    },
}

impl RelayError {
    /// Creates a forbidden-origin error from the declared request origin.
    pub fn forbidden_origin(origin: Option<&str>) -> Self {
        Self::ForbiddenOrigin { origin: origin.unwrap_or("<none>").to_string() }
    }

    /// Creates an invalid-payload error.
    pub fn invalid_payload(reason: impl Into<String>) -> Self {
        Self::InvalidPayload { reason: reason.into() }
    }

    /// Creates a downstream-unavailable error.
    pub fn downstream_unavailable(reason: impl Into<String>) -> Self {
        Self::DownstreamUnavailable { reason: reason.into() }
    }

    /// Returns the error code (E1001-E3002).
    pub const fn code(&self) -> &'static str {
        match self {
            Self::MethodNotAllowed { .. } => "E1001",
            Self::ForbiddenOrigin { .. } => "E1002",
            Self::InvalidPayload { .. } => "E1003",
            Self::EmptyContent => "E1004",
            Self::DownstreamUnavailable { .. } => "E2001",
            Self::DownstreamTimeout { .. } => "E2002",
            Self::MissingWebhookUrl => "E3001",
            Self::Serialization { .. } => "E3002",
        }
    }

    /// Returns the HTTP status code the caller receives.
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::MethodNotAllowed { .. } => 405,
            Self::ForbiddenOrigin { .. } => 403,
            Self::InvalidPayload { .. } | Self::EmptyContent => 400,
            Self::DownstreamUnavailable { .. }
            | Self::DownstreamTimeout { .. }
            | Self::MissingWebhookUrl
            | Self::Serialization { .. } => 500,
        }
    }

    /// Returns whether the caller caused this error.
    pub const fn is_client_error(&self) -> bool {
        self.status_code() < 500
    }

    /// Returns the message sent back to the caller.
    ///
    /// Server errors never leak transport or encoder details.
    pub fn public_message(&self) -> String {
        match self {
            Self::MethodNotAllowed { .. } => "Method not allowed".to_string(),
            Self::ForbiddenOrigin { .. } => "Forbidden: Invalid origin".to_string(),
            Self::InvalidPayload { reason } => format!("Error decoding JSON body: {reason}"),
            Self::EmptyContent => "The 'content' field cannot be empty.".to_string(),
            Self::DownstreamUnavailable { .. } | Self::DownstreamTimeout { .. } => {
                "Error sending webhook".to_string()
            },
            Self::MissingWebhookUrl => {
                "Server configuration error: webhook URL not set".to_string()
            },
            Self::Serialization { .. } => "Error preparing message for webhook".to_string(),
        }
    }
}
