//! Core domain types for the Kurier webhook relay.
//!
//! Holds the relayed message payload, the browser origin policy and the
//! error taxonomy shared by the delivery client and the HTTP API.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod origin;
pub mod payload;

pub use error::{RelayError, Result};
pub use origin::{AllowedOrigin, OriginPolicy};
pub use payload::MessagePayload;
