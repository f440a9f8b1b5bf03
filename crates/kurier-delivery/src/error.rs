//! Error types for webhook delivery.
//!
//! A delivery attempt either gets an HTTP response back (any status) or
//! fails at the transport level. Only transport failures are errors here;
//! the status of a completed exchange is reported on the response.

use std::fmt;

use kurier_core::RelayError;
use thiserror::Error;

/// Result type alias for delivery operations.
pub type Result<T> = std::result::Result<T, DeliveryError>;

/// Transport-level failures of a delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    /// Network-level connectivity failure.
    #[error("network connection failed: {message}")]
    NetworkError {
        /// Error message describing the network failure
        message: String,
    },

    /// HTTP request timeout exceeded.
    #[error("request timeout after {timeout_ms}ms")]
    Timeout {
        /// Timeout that was exceeded in milliseconds
        timeout_ms: u64,
    },

    /// Client or request could not be built.
    #[error("invalid delivery configuration: {message}")]
    ConfigurationError {
        /// Configuration error message
        message: String,
    },
}

impl DeliveryError {
    /// Creates a network error from a message.
    pub fn network(message: impl Into<String>) -> Self {
        Self::NetworkError { message: message.into() }
    }

    /// Creates a timeout error.
    pub fn timeout(timeout_ms: u64) -> Self {
        Self::Timeout { timeout_ms }
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::ConfigurationError { message: message.into() }
    }
}

impl From<DeliveryError> for RelayError {
    fn from(error: DeliveryError) -> Self {
        match error {
            DeliveryError::Timeout { timeout_ms } => Self::DownstreamTimeout { timeout_ms },
            DeliveryError::NetworkError { .. } | DeliveryError::ConfigurationError { .. } => {
                Self::downstream_unavailable(error.to_string())
            },
        }
    }
}

/// Category of delivery error for log fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Connectivity issues and timeouts.
    Network,
    /// Client or request construction problems.
    Configuration,
}

impl From<&DeliveryError> for ErrorCategory {
    fn from(error: &DeliveryError) -> Self {
        match error {
            DeliveryError::NetworkError { .. } | DeliveryError::Timeout { .. } => Self::Network,
            DeliveryError::ConfigurationError { .. } => Self::Configuration,
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network => write!(f, "network"),
            Self::Configuration => write!(f, "configuration"),
        }
    }
}
