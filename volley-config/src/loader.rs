//! Configuration loading and environment variable handling

use crate::domains::VolleyConfig;
use crate::error::{ConfigError, ConfigResult};
use std::path::Path;
use std::str::FromStr;

/// Configuration loader with environment variable support
pub struct ConfigLoader {
    /// Environment variable prefix
    prefix: String,
}

impl ConfigLoader {
    /// Create a new config loader with default prefix
    pub fn new() -> Self {
        Self {
            prefix: "VOLLEY".to_string(),
        }
    }

    /// Create a new config loader with custom prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Load configuration from a YAML file with environment overrides
    pub fn from_file(&self, path: impl AsRef<Path>) -> ConfigResult<VolleyConfig> {
        let content = std::fs::read_to_string(path)?;
        let mut config: VolleyConfig = serde_yaml::from_str(&content)?;

        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env(&self) -> ConfigResult<VolleyConfig> {
        let mut config = VolleyConfig::default();
        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;
        Ok(config)
    }

    /// Load configuration with fallback chain
    pub fn load(&self, config_path: Option<impl AsRef<Path>>) -> ConfigResult<VolleyConfig> {
        match config_path {
            Some(path) => self.from_file(path),
            None => self.from_env(),
        }
    }

    /// Apply environment variable overrides to configuration
    fn apply_env_overrides(&self, config: &mut VolleyConfig) -> ConfigResult<()> {
        self.apply_http_overrides(&mut config.http)?;
        self.apply_logging_overrides(&mut config.logging)?;
        self.apply_output_overrides(&mut config.output)?;
        self.apply_server_overrides(&mut config.server)?;

        Ok(())
    }

    /// Apply HTTP config overrides
    fn apply_http_overrides(
        &self,
        config: &mut crate::domains::http::HttpConfig,
    ) -> ConfigResult<()> {
        if let Ok(timeout) = self.get_env_var("HTTP_CONNECT_TIMEOUT") {
            let seconds: u64 = timeout
                .parse()
                .map_err(|e| ConfigError::EnvError(format!("Invalid HTTP_CONNECT_TIMEOUT: {}", e)))?;
            config.connect_timeout = std::time::Duration::from_secs(seconds);
        }

        if let Ok(user_agent) = self.get_env_var("HTTP_USER_AGENT") {
            config.user_agent = user_agent;
        }

        if let Ok(verify_tls) = self.get_env_var("HTTP_VERIFY_TLS") {
            config.verify_tls = verify_tls
                .parse()
                .map_err(|e| ConfigError::EnvError(format!("Invalid HTTP_VERIFY_TLS: {}", e)))?;
        }

        Ok(())
    }

    /// Apply logging config overrides
    fn apply_logging_overrides(
        &self,
        config: &mut crate::domains::logging::LoggingConfig,
    ) -> ConfigResult<()> {
        if let Ok(log_level) = self.get_env_var("LOG_LEVEL") {
            config.level = crate::domains::logging::LogLevel::from_str(&log_level)
                .map_err(|_| ConfigError::EnvError(format!("Invalid LOG_LEVEL: {}", log_level)))?;
        }

        Ok(())
    }

    /// Apply output config overrides
    fn apply_output_overrides(
        &self,
        config: &mut crate::domains::output::OutputConfig,
    ) -> ConfigResult<()> {
        if let Ok(pretty) = self.get_env_var("OUTPUT_PRETTY") {
            config.pretty = pretty
                .parse()
                .map_err(|e| ConfigError::EnvError(format!("Invalid OUTPUT_PRETTY: {}", e)))?;
        }

        Ok(())
    }

    /// Apply server config overrides.
    ///
    /// The server section is materialized when an override is present, so
    /// the variables work even without a config file.
    fn apply_server_overrides(
        &self,
        config: &mut Option<crate::domains::server::ServerConfig>,
    ) -> ConfigResult<()> {
        let bind = self.get_env_var("SERVER_BIND_ADDRESS").ok();
        let port = self.get_env_var("SERVER_PORT").ok();
        let api_key = self.get_env_var("API_KEY").ok();

        if bind.is_none() && port.is_none() && api_key.is_none() {
            return Ok(());
        }

        let server = config.get_or_insert_with(Default::default);

        if let Some(bind) = bind {
            server.bind_address = bind;
        }

        if let Some(port) = port {
            server.port = port
                .parse()
                .map_err(|e| ConfigError::EnvError(format!("Invalid SERVER_PORT: {}", e)))?;
        }

        if let Some(api_key) = api_key {
            server.api_key = Some(api_key);
        }

        Ok(())
    }

    /// Get environment variable with prefix
    fn get_env_var(&self, name: &str) -> Result<String, std::env::VarError> {
        std::env::var(format!("{}_{}", self.prefix, name))
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "http:\n  connect_timeout: 5\nserver:\n  port: 4000\n  api_key: secret"
        )
        .unwrap();

        let loader = ConfigLoader::with_prefix("VOLLEY_TEST_UNSET");
        let config = loader.from_file(file.path()).unwrap();

        assert_eq!(config.http.connect_timeout.as_secs(), 5);
        let server = config.server.expect("server section");
        assert_eq!(server.port, 4000);
        assert_eq!(server.api_key.as_deref(), Some("secret"));
    }

    #[test]
    fn test_defaults_when_no_file() {
        let loader = ConfigLoader::with_prefix("VOLLEY_TEST_UNSET");
        let config = loader.from_env().unwrap();

        assert_eq!(config.http.pool_max_idle_per_host, 512);
        assert!(!config.output.pretty);
        assert!(config.server.is_none());
    }

    #[test]
    fn test_server_env_overrides_without_file() {
        // Unique prefix so parallel tests never see these variables
        std::env::set_var("VOLLEY_ENVTEST_SERVER_PORT", "4321");
        std::env::set_var("VOLLEY_ENVTEST_API_KEY", "from-env");

        let loader = ConfigLoader::with_prefix("VOLLEY_ENVTEST");
        let config = loader.from_env().unwrap();

        let server = config.server.expect("server section materialized");
        assert_eq!(server.port, 4321);
        assert_eq!(server.api_key.as_deref(), Some("from-env"));
        assert_eq!(server.bind_address, "0.0.0.0");
    }
}
