//! HTTP client configuration

use crate::error::ConfigResult;
use crate::validation::{validate_positive, validate_required_string, Validatable};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Connection establishment timeout
    #[serde(
        with = "crate::domains::utils::serde_duration",
        default = "default_connect_timeout"
    )]
    pub connect_timeout: Duration,

    /// How long an idle pooled connection is kept alive
    #[serde(
        with = "crate::domains::utils::serde_duration",
        default = "default_pool_idle_timeout"
    )]
    pub pool_idle_timeout: Duration,

    /// Maximum idle connections kept per host
    #[serde(default = "default_pool_max_idle_per_host")]
    pub pool_max_idle_per_host: usize,

    /// User agent string
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Whether to verify TLS certificates
    #[serde(default = "crate::domains::utils::default_true")]
    pub verify_tls: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout: default_connect_timeout(),
            pool_idle_timeout: default_pool_idle_timeout(),
            pool_max_idle_per_host: default_pool_max_idle_per_host(),
            user_agent: default_user_agent(),
            verify_tls: true,
        }
    }
}

impl Validatable for HttpConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_positive(
            self.connect_timeout.as_secs(),
            "connect_timeout",
            self.domain_name(),
        )?;

        validate_positive(
            self.pool_idle_timeout.as_secs(),
            "pool_idle_timeout",
            self.domain_name(),
        )?;

        validate_positive(
            self.pool_max_idle_per_host,
            "pool_max_idle_per_host",
            self.domain_name(),
        )?;

        validate_required_string(&self.user_agent, "user_agent", self.domain_name())?;

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "http"
    }
}

// Default value functions
fn default_connect_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_pool_idle_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_pool_max_idle_per_host() -> usize {
    512
}

fn default_user_agent() -> String {
    format!("volley/{}", env!("CARGO_PKG_VERSION"))
}
