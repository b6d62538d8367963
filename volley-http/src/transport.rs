//! The process-wide HTTP client handle

use crate::config::TransportConfig;
use crate::errors::HttpError;
use reqwest::Client;
use tracing::debug;

/// Shared HTTP transport.
///
/// Wraps one pooled `reqwest::Client`; cloning is cheap and hands out the
/// same connection pool. Standard proxy environment variables are honored by
/// the underlying client.
#[derive(Debug, Clone)]
pub struct Transport {
    client: Client,
}

impl Transport {
    /// Build a transport from the given configuration
    pub fn new(config: TransportConfig) -> Result<Self, HttpError> {
        debug!(
            connect_timeout = config.connect_timeout.as_secs(),
            pool_max_idle_per_host = config.pool_max_idle_per_host,
            accept_invalid_certs = config.accept_invalid_certs,
            "creating HTTP transport"
        );

        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .user_agent(&config.user_agent)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(HttpError::ClientBuild)?;

        Ok(Self { client })
    }

    /// The underlying pooled client
    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_construction() {
        let transport = Transport::new(TransportConfig::default());
        assert!(transport.is_ok());
    }

    #[test]
    fn test_insecure_transport_construction() {
        let config = TransportConfig::default().insecure(true);
        assert!(config.accept_invalid_certs);
        assert!(Transport::new(config).is_ok());
    }
}
