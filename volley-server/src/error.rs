//! Bot server error types

use thiserror::Error;

/// Bot server errors
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid server configuration: {0}")]
    Config(String),

    #[error(transparent)]
    ConfigDomain(#[from] volley_config::ConfigError),

    #[error(transparent)]
    Http(#[from] volley_http::HttpError),

    #[error("failed to serve: {0}")]
    Io(#[from] std::io::Error),
}
