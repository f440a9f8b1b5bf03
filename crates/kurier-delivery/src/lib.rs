//! Webhook delivery for the Kurier relay.
//!
//! Forwards an encoded message to the downstream chat webhook in a single
//! bounded attempt. There is no retry, queue or backoff: the caller waits
//! for the one exchange and learns its outcome.
//!
//! # Example
//!
//! ```no_run
//! use bytes::Bytes;
//! use kurier_delivery::{DeliveryClient, DeliveryRequest, DeliveryError};
//!
//! # async fn example() -> std::result::Result<(), DeliveryError> {
//! let client = DeliveryClient::with_defaults()?;
//! let request = DeliveryRequest::new(
//!     "https://discord.com/api/webhooks/123/token",
//!     Bytes::from_static(br#"{"content":"hello"}"#),
//! );
//!
//! let response = client.deliver(request).await?;
//! println!("downstream answered {}", response.status_code);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod client;
pub mod error;

pub use client::{ClientConfig, DeliveryClient, DeliveryRequest, DeliveryResponse};
pub use error::{DeliveryError, ErrorCategory, Result};

/// Default downstream timeout in seconds.
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 10;
