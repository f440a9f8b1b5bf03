//! The chat message record relayed from caller to webhook.
//!
//! A payload is parsed from the inbound body, checked, encoded back to the
//! same JSON shape and forwarded. Only `content` and `username` survive the
//! trip; anything else in the inbound object is dropped by parsing.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{RelayError, Result};

/// Message forwarded to the downstream chat webhook.
///
/// Absent and empty fields are both left out of the encoded form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagePayload {
    /// Chat message body
    #[serde(default, skip_serializing_if = "is_blank")]
    pub content: Option<String>,
    /// Display name override
    #[serde(default, skip_serializing_if = "is_blank")]
    pub username: Option<String>,
}

impl MessagePayload {
    /// Creates a payload with the given content and no username override.
    pub fn new(content: impl Into<String>) -> Self {
        Self { content: Some(content.into()), username: None }
    }

    /// Sets the display name override.
    #[must_use]
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Parses a payload from a raw request body.
    ///
    /// # Errors
    ///
    /// Returns `RelayError::InvalidPayload` carrying the parser message when
    /// the body is not a JSON object with optional string fields.
    pub fn from_json(body: &[u8]) -> Result<Self> {
        // Derived struct visitors also take sequences; only objects are payloads.
        let object: Map<String, Value> =
            serde_json::from_slice(body).map_err(|e| RelayError::invalid_payload(e.to_string()))?;

        serde_json::from_value(Value::Object(object))
            .map_err(|e| RelayError::invalid_payload(e.to_string()))
    }

    /// Returns the message body, or `EmptyContent` when there is none.
    pub fn require_content(&self) -> Result<&str> {
        match self.content.as_deref() {
            Some(content) if !content.is_empty() => Ok(content),
            _ => Err(RelayError::EmptyContent),
        }
    }

    /// Encodes the payload into the JSON body sent downstream.
    ///
    /// # Errors
    ///
    /// Returns `RelayError::Serialization` if encoding fails.
    pub fn to_wire(&self) -> Result<Bytes> {
        serde_json::to_vec(self)
            .map(Bytes::from)
            .map_err(|e| RelayError::Serialization { reason: e.to_string() })
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, str::is_empty)
}
