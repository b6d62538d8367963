//! Transport configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;
use volley_config::HttpConfig as DomainHttpConfig;

/// Configuration for the shared HTTP transport
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Connection establishment timeout
    pub connect_timeout: Duration,

    /// How long an idle pooled connection is kept alive
    pub pool_idle_timeout: Duration,

    /// Maximum idle connections kept per host
    pub pool_max_idle_per_host: usize,

    /// User agent string
    pub user_agent: String,

    /// Whether to accept invalid TLS certificates
    pub accept_invalid_certs: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            pool_idle_timeout: Duration::from_secs(30),
            pool_max_idle_per_host: 512,
            user_agent: format!("volley/{}", env!("CARGO_PKG_VERSION")),
            accept_invalid_certs: false,
        }
    }
}

impl TransportConfig {
    /// Disable TLS certificate verification
    pub fn insecure(mut self, insecure: bool) -> Self {
        self.accept_invalid_certs = insecure;
        self
    }
}

impl From<DomainHttpConfig> for TransportConfig {
    fn from(config: DomainHttpConfig) -> Self {
        Self {
            connect_timeout: config.connect_timeout,
            pool_idle_timeout: config.pool_idle_timeout,
            pool_max_idle_per_host: config.pool_max_idle_per_host,
            user_agent: config.user_agent,
            accept_invalid_certs: !config.verify_tls,
        }
    }
}
