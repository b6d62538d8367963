//! Bot server for volley
//!
//! A bot is a remote worker node: it accepts a scenario over HTTP, runs it on
//! the local generator, and streams the response records back as NDJSON. At
//! most one scenario is in flight per bot, so measurements are never skewed
//! by a concurrent run.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod server;

pub use error::ServerError;
pub use server::{router, AppState, BotServer};

/// Version string served on `GET /`
pub fn version_string() -> String {
    format!("volley {}", env!("CARGO_PKG_VERSION"))
}
