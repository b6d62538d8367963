//! Concrete request and response records

use crate::scenario::{AuthScheme, ResponseCapture};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Variable bindings available to template rendering.
///
/// Values keep their JSON type so that a numeric capture substituted into a
/// JSON number position stays a number.
pub type Variables = HashMap<String, Value>;

/// One concrete, fully rendered request.
///
/// Deserialized from the rendered template text; template-only fields such as
/// `Count` and `Concurrency` are ignored, and `Idx` is stamped afterwards.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct RequestInfo {
    #[serde(rename = "idx")]
    pub idx: u64,
    pub url: String,
    pub method: String,
    pub auth: String,
    pub auth_scheme: AuthScheme,
    pub headers: HashMap<String, String>,
    pub body: String,
    pub captures: Vec<ResponseCapture>,
}

/// One completed response, emitted as a single NDJSON line.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponseInfo {
    /// Global index echoed from the request
    pub idx: u64,

    pub url: String,

    /// Unix seconds at request start
    pub timestamp: i64,

    /// Round-trip plus body parse time, in milliseconds
    pub elapsed: f64,

    /// Body bytes read
    pub length: u64,

    #[serde(rename = "statusCode")]
    pub status_code: u16,

    /// Failure message; omitted from output when empty
    #[serde(skip_serializing_if = "String::is_empty")]
    pub error: String,

    /// Captures extracted from this response; never emitted
    #[serde(skip)]
    pub variables: Variables,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_info_output_fields() {
        let record = ResponseInfo {
            idx: 7,
            url: "http://svc.local/a".to_string(),
            timestamp: 1_700_000_000,
            elapsed: 12.5,
            length: 42,
            status_code: 200,
            error: String::new(),
            variables: Variables::from([("tok".to_string(), Value::from("T"))]),
        };

        let line = serde_json::to_value(&record).unwrap();
        assert_eq!(line["idx"], 7);
        assert_eq!(line["statusCode"], 200);
        assert_eq!(line["length"], 42);
        // Captures and empty errors never reach the output
        assert!(line.get("variables").is_none());
        assert!(line.get("Variables").is_none());
        assert!(line.get("error").is_none());
    }

    #[test]
    fn test_response_info_error_field() {
        let record = ResponseInfo {
            url: "http://svc.local/a".to_string(),
            timestamp: 1_700_000_000,
            error: "connection refused".to_string(),
            ..Default::default()
        };

        let line = serde_json::to_value(&record).unwrap();
        assert_eq!(line["error"], "connection refused");
        assert_eq!(line["statusCode"], 0);
    }

    #[test]
    fn test_request_info_ignores_template_fields() {
        // The renderer re-parses the rendered template text, which still
        // carries scheduling fields; they must not break deserialization.
        let rendered = r#"{
            "Url": "http://svc.local/a",
            "Method": "POST",
            "Count": 4,
            "Concurrency": 2,
            "MaxReqSec": 1.5
        }"#;

        let request: RequestInfo = serde_json::from_str(rendered).unwrap();
        assert_eq!(request.method, "POST");
        assert_eq!(request.idx, 0);
    }
}
