//! Shared HTTP transport for volley
//!
//! This crate provides the single tuned `reqwest` client handle every request
//! in the process is dispatched through, both by the executor pool and by the
//! distributed bot dispatcher.

pub mod config;
pub mod errors;
pub mod transport;

// Re-export main types for convenience
pub use config::TransportConfig;
pub use errors::HttpError;
pub use transport::Transport;
