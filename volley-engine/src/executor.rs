//! Single-request execution with retries and timing

use crate::error::EngineError;
use crate::response::parse_response;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, RequestBuilder, Url};
use std::str::FromStr;
use std::time::Instant;
use tracing::{debug, warn};
use volley_core::{AuthScheme, RequestInfo, ResponseInfo};
use volley_http::Transport;

/// Attempts made for transport-level failures; HTTP status codes are never
/// retried.
const MAX_RETRIES: u32 = 3;

/// Executes one concrete request and produces one response record.
#[derive(Debug, Clone)]
pub struct RequestExecutor {
    transport: Transport,
}

impl RequestExecutor {
    pub fn new(transport: Transport) -> Self {
        Self { transport }
    }

    /// Execute one request.
    ///
    /// Build and transport failures are recorded on the returned response and
    /// are not fatal; response parse and capture failures are returned as
    /// errors and stop the run.
    pub async fn execute(&self, request: &RequestInfo) -> Result<ResponseInfo, EngineError> {
        let timestamp = chrono::Utc::now().timestamp();
        let started = Instant::now();

        let builder = match self.build_request(request) {
            Ok(builder) => builder,
            Err(err) => {
                warn!(idx = request.idx, url = %request.url, error = %err, "unable to build request");
                return Ok(error_response(request, timestamp, &err));
            }
        };

        let response = match self.send_with_retries(builder).await {
            Ok(response) => response,
            Err(err) => {
                warn!(idx = request.idx, url = %request.url, error = %err, "unable to execute request");
                return Ok(error_response(request, timestamp, &err));
            }
        };

        let status = response.status();
        let round_trip = started.elapsed();
        let body = parse_response(response, &request.captures).await?;

        Ok(ResponseInfo {
            idx: request.idx,
            url: request.url.clone(),
            timestamp,
            elapsed: (round_trip + body.elapsed).as_secs_f64() * 1000.0,
            length: body.length,
            status_code: status.as_u16(),
            error: String::new(),
            variables: body.variables,
        })
    }

    fn build_request(&self, request: &RequestInfo) -> Result<RequestBuilder, EngineError> {
        let method = Method::from_str(&request.method)
            .map_err(|_| EngineError::RequestBuild(format!("invalid method '{}'", request.method)))?;
        let url = Url::parse(&request.url)
            .map_err(|e| EngineError::RequestBuild(format!("invalid url '{}': {}", request.url, e)))?;

        let mut headers = HeaderMap::new();
        for (name, value) in &request.headers {
            let name = HeaderName::from_str(name)
                .map_err(|_| EngineError::RequestBuild(format!("invalid header name '{}'", name)))?;
            let value = HeaderValue::from_str(value).map_err(|_| {
                EngineError::RequestBuild(format!("invalid value for header '{}'", name))
            })?;
            headers.insert(name, value);
        }

        let mut builder = self.transport.client().request(method, url).headers(headers);

        if !request.auth.is_empty() {
            builder = match request.auth_scheme {
                AuthScheme::Basic => {
                    let (user, pass) =
                        request.auth.split_once(':').ok_or(EngineError::AuthFormat)?;
                    builder.basic_auth(user, Some(pass))
                }
            };
        }

        if !request.body.is_empty() {
            builder = builder.body(request.body.clone());
        }

        Ok(builder)
    }

    async fn send_with_retries(
        &self,
        builder: RequestBuilder,
    ) -> Result<reqwest::Response, EngineError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let request = builder.try_clone().ok_or_else(|| {
                EngineError::RequestBuild("request body is not retryable".to_string())
            })?;

            match request.send().await {
                Ok(response) => return Ok(response),
                Err(err) if attempt < MAX_RETRIES => {
                    debug!(attempt, error = %err, "retrying after transport failure");
                }
                Err(err) => {
                    return Err(EngineError::Transport {
                        attempts: attempt,
                        source: err,
                    })
                }
            }
        }
    }
}

/// Record shape for a request that never produced a response
fn error_response(request: &RequestInfo, timestamp: i64, err: &EngineError) -> ResponseInfo {
    ResponseInfo {
        idx: request.idx,
        url: request.url.clone(),
        timestamp,
        error: err.to_string(),
        ..Default::default()
    }
}
