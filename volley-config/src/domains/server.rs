//! Bot server configuration

use crate::error::ConfigResult;
use crate::validation::{validate_port_range, validate_required_string, Validatable};
use serde::{Deserialize, Serialize};

/// Bot server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server bind address
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// API key remote orchestrators must present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            api_key: None,
        }
    }
}

impl Validatable for ServerConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_required_string(&self.bind_address, "bind_address", self.domain_name())?;
        validate_port_range(self.port, "port", self.domain_name())?;

        if let Some(api_key) = &self.api_key {
            validate_required_string(api_key, "api_key", self.domain_name())?;
        }

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "server"
    }
}

// Default value functions
fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3210
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_config_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_address, "0.0.0.0");
        assert_eq!(config.port, 3210);
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_server_config_validation() {
        let mut config = ServerConfig::default();
        assert!(config.validate().is_ok());

        // Test zero port
        config.port = 0;
        assert!(config.validate().is_err());

        // Test empty api key
        config = ServerConfig::default();
        config.api_key = Some(String::new());
        assert!(config.validate().is_err());
    }
}
