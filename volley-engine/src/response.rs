//! Response body reading and capture extraction

use crate::error::EngineError;
use serde_json::Value;
use std::time::{Duration, Instant};
use volley_core::{resolve_path, CaptureSource, ResponseCapture, Variables};

/// What reading a response body produced
#[derive(Debug)]
pub struct BodyInfo {
    /// Body bytes read
    pub length: u64,

    /// Time spent reading and decoding the body
    pub elapsed: Duration,

    /// Variables extracted by the template's captures
    pub variables: Variables,
}

/// Read a response body and resolve the template's captures.
///
/// When no capture targets the body, the body is only drained to count its
/// length. Otherwise it is buffered and decoded; only `application/json`
/// bodies are decodable.
pub async fn parse_response(
    mut response: reqwest::Response,
    captures: &[ResponseCapture],
) -> Result<BodyInfo, EngineError> {
    let started = Instant::now();
    let mut variables = Variables::new();

    // Header captures resolve before the body is consumed
    for capture in captures {
        if capture.source == CaptureSource::Header {
            let value = response
                .headers()
                .get(&capture.name)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string();
            variables.insert(capture.name.clone(), Value::String(value));
        }
    }

    let wants_body = captures.iter().any(|c| c.source == CaptureSource::Body);

    let length = if wants_body {
        let media_type = media_type(&response)?;
        if media_type != "application/json" {
            return Err(EngineError::ResponseParse(format!(
                "unsupported media type '{}'",
                media_type
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| EngineError::ResponseParse(format!("body read failed: {}", e)))?;
        let decoded: Value = serde_json::from_slice(&body).map_err(|e| {
            EngineError::ResponseParse(format!("invalid application/json body: {}", e))
        })?;

        for capture in captures {
            if capture.source == CaptureSource::Body {
                let value = resolve_path(&decoded, &capture.expression)?;
                variables.insert(capture.name.clone(), value.clone());
            }
        }

        body.len() as u64
    } else {
        // Drain to a sink, counting only
        let mut drained = 0u64;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| EngineError::ResponseParse(format!("body read failed: {}", e)))?
        {
            drained += chunk.len() as u64;
        }
        drained
    };

    Ok(BodyInfo {
        length,
        elapsed: started.elapsed(),
        variables,
    })
}

/// Extract the media type from the Content-Type header, dropping parameters.
fn media_type(response: &reqwest::Response) -> Result<String, EngineError> {
    let header = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            EngineError::ResponseParse("response carries no content type".to_string())
        })?;

    let media = header
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    if media.is_empty() {
        return Err(EngineError::ResponseParse(format!(
            "unable to parse content type '{}'",
            header
        )));
    }

    Ok(media)
}
