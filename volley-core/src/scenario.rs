//! The scenario document and its request templates

use crate::record::Variables;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Header defaults applied to every template unless overridden
const DEFAULT_HEADERS: [(&str, &str); 2] = [
    ("accept", "application/json"),
    ("content-type", "application/json"),
];

/// A complete executable plan: initial variables, optional bot list, ordered
/// request templates, and run options.
///
/// Scenario documents use PascalCase field names on the wire.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct RequestScenario {
    /// Initial variable bindings
    pub init: Variables,

    /// Remote worker nodes; empty means local execution
    pub bots: Vec<BotInfo>,

    /// Ordered request templates
    pub requests: Vec<RequestTemplate>,

    /// Run options
    pub options: ScenarioOptions,

    /// Offset used by a worker to derive a disjoint request index space;
    /// 0 for the orchestrator in local mode
    pub worker_idx: usize,
}

/// A remote worker node
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct BotInfo {
    pub url: String,
    pub api_key: String,
}

/// Run options
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ScenarioOptions {
    /// Log the scenario and per-request details
    pub debug: bool,

    /// Skip TLS certificate verification
    pub insecure: bool,

    /// Pretty-print emitted response records
    pub pretty: bool,
}

/// One step of the plan, expanded into many concrete requests.
///
/// Every string-valued field may contain `{{name}}` placeholders that are
/// substituted per iteration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct RequestTemplate {
    pub url: String,

    pub method: String,

    /// Credentials in `user:pass` form; empty means unauthenticated
    pub auth: String,

    pub auth_scheme: AuthScheme,

    pub headers: HashMap<String, String>,

    pub body: String,

    /// Rules extracting variables from each response
    pub captures: Vec<ResponseCapture>,

    /// Number of batches to run; an explicit 0 means unbounded
    pub count: u64,

    /// Requests dispatched in parallel per batch
    pub concurrency: usize,

    /// Wall-clock cap for this template, in milliseconds on the wire;
    /// zero means unbounded
    #[serde(with = "serde_millis")]
    pub max_duration: Duration,

    /// Average request rate cap; zero means uncapped
    pub max_req_sec: f64,

    /// Insert a bounded random sleep between batches
    pub randomize: bool,
}

impl Default for RequestTemplate {
    fn default() -> Self {
        Self {
            url: String::new(),
            method: "GET".to_string(),
            auth: String::new(),
            auth_scheme: AuthScheme::Basic,
            headers: HashMap::new(),
            body: String::new(),
            captures: Vec::new(),
            count: 1,
            concurrency: 1,
            max_duration: Duration::ZERO,
            max_req_sec: 0.0,
            randomize: false,
        }
    }
}

impl RequestTemplate {
    /// Merge the template with engine defaults; explicit fields win.
    pub fn with_defaults(mut self) -> Self {
        for (name, value) in DEFAULT_HEADERS {
            self.headers
                .entry(name.to_string())
                .or_insert_with(|| value.to_string());
        }
        if self.method.is_empty() {
            self.method = "GET".to_string();
        }
        if self.concurrency == 0 {
            self.concurrency = 1;
        }
        self
    }
}

/// Authentication scheme applied to a template's credentials
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthScheme {
    #[default]
    Basic,
}

/// Where a capture reads its value from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureSource {
    Header,
    Body,
}

/// A rule extracting a named value from a response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResponseCapture {
    pub source: CaptureSource,

    /// Variable name the value is bound to; for header captures this is also
    /// the header name
    pub name: String,

    /// Dot-path over the decoded body; unused for header captures
    #[serde(default)]
    pub expression: String,
}

/// Serde helper carrying a Duration as integer milliseconds
mod serde_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
