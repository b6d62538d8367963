//! Error types for scenario execution

use thiserror::Error;
use volley_core::CaptureError;

/// Scenario execution errors
#[derive(Debug, Error)]
pub enum EngineError {
    /// The request could not be constructed (bad URL, method, or header)
    #[error("invalid request: {0}")]
    RequestBuild(String),

    /// Credentials did not match the expected `user:pass` shape
    #[error("invalid auth credentials: expected <username>:<password>")]
    AuthFormat,

    /// Transport-level failure that survived all retry attempts
    #[error("transport failure after {attempts} attempts: {source}")]
    Transport {
        attempts: u32,
        #[source]
        source: reqwest::Error,
    },

    /// The response body could not be read or decoded
    #[error("failed to read response: {0}")]
    ResponseParse(String),

    /// A capture expression did not resolve
    #[error(transparent)]
    Capture(#[from] CaptureError),

    /// Template render or post-render decode failure
    #[error("template render error: {0}")]
    TemplateRender(String),

    /// A bot request failed or its stream was malformed
    #[error("bot {url} failed: {message}")]
    Bot { url: String, message: String },

    /// The executor pool lost a worker or a channel
    #[error("executor pool failure: {0}")]
    Pool(String),

    #[error(transparent)]
    Http(#[from] volley_http::HttpError),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("output error: {0}")]
    Io(#[from] std::io::Error),
}
