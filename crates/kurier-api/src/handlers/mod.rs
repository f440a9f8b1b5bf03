//! HTTP request handlers for the Kurier API.
//!
//! - `relay` - Message relay endpoint
//! - `health` - Health, readiness and liveness probes
//!
//! # Error Handling
//!
//! Relay failures answer with a short plain-text reason, the matching HTTP
//! status and an `X-Error-Code` header from the taxonomy (E1001-E3002).
//! Server-side failures are logged with their full detail.

pub mod health;
pub mod relay;

pub use health::{health_check, liveness_check, readiness_check};
pub use relay::relay_message;
