//! Kurier HTTP API.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod handlers;
pub mod server;
pub mod state;

pub use config::Config;
pub use server::{create_router, run_server, shutdown_signal, start_server};
pub use state::{AppState, RelaySettings};

/// Path the relay handler is mounted on unless configured otherwise.
pub const DEFAULT_RELAY_PATH: &str = "/api/receive";
