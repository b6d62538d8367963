//! Domain-specific configuration modules

pub mod http;
pub mod logging;
pub mod output;
pub mod server;
pub mod utils;

use crate::error::ConfigResult;
use crate::validation::Validatable;
use serde::{Deserialize, Serialize};

/// Complete volley configuration, assembled from the per-domain sections
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VolleyConfig {
    /// HTTP client configuration
    pub http: http::HttpConfig,

    /// Logging configuration
    pub logging: logging::LoggingConfig,

    /// Output configuration
    pub output: output::OutputConfig,

    /// Bot server configuration (only needed when running as a bot)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<server::ServerConfig>,
}

impl VolleyConfig {
    /// Validate all configured domains
    pub fn validate_all(&self) -> ConfigResult<()> {
        self.http.validate()?;
        self.logging.validate()?;
        self.output.validate()?;

        if let Some(server) = &self.server {
            server.validate()?;
        }

        Ok(())
    }
}
