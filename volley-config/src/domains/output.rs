//! Output configuration

use crate::error::ConfigResult;
use crate::validation::Validatable;
use serde::{Deserialize, Serialize};

/// Output configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Pretty-print emitted response records instead of compact JSON lines
    #[serde(default = "crate::domains::utils::default_false")]
    pub pretty: bool,
}

impl Validatable for OutputConfig {
    fn validate(&self) -> ConfigResult<()> {
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "output"
    }
}
