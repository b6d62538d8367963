//! Request handlers for the bot endpoint

use crate::auth::ApiKeyAuth;
use crate::server::AppState;
use crate::version_string;
use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use tracing::{error, info};
use volley_core::RequestScenario;
use volley_engine::execute_scenario_with;
use volley_http::{Transport, TransportConfig};

/// NDJSON content type of the scenario response stream
const JSON_ROW_CONTENT_TYPE: &str = "application/json-row";

/// Size of the pipe between the running scenario and the HTTP response
const STREAM_BUFFER_SIZE: usize = 64 * 1024;

/// `GET /` — version probe
pub async fn get_version() -> impl IntoResponse {
    version_string()
}

/// `POST /` — execute a scenario, streaming records back as they complete.
///
/// Rejected with 503 while another scenario is running; the execution guard
/// travels with the streaming task and is released on every exit path.
pub async fn post_scenario(
    State(state): State<AppState>,
    _auth: ApiKeyAuth,
    body: Bytes,
) -> Response {
    let Ok(exec_guard) = state.exec_lock.clone().try_lock_owned() else {
        info!("rejecting scenario: already serving one");
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            "Service Unavailable: already serving a scenario",
        )
            .into_response();
    };

    let scenario: RequestScenario = match serde_json::from_slice(&body) {
        Ok(scenario) => scenario,
        Err(err) => {
            error!(error = %err, "unable to parse body as request scenario");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Unable to parse body as request scenario",
            )
                .into_response();
        }
    };

    info!(
        templates = scenario.requests.len(),
        worker_idx = scenario.worker_idx,
        "accepted scenario"
    );

    // The shared transport verifies TLS; an insecure scenario gets its own
    let transport = if scenario.options.insecure {
        match Transport::new(TransportConfig::default().insecure(true)) {
            Ok(transport) => transport,
            Err(err) => {
                error!(error = %err, "failed to build insecure transport");
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Unable to prepare transport",
                )
                    .into_response();
            }
        }
    } else {
        state.transport.clone()
    };
    let (mut writer, reader) = tokio::io::duplex(STREAM_BUFFER_SIZE);
    tokio::spawn(async move {
        let _exec_guard = exec_guard;

        if let Err(err) = execute_scenario_with(&scenario, transport, &mut writer).await {
            error!(error = %err, "scenario failed mid-stream");
            // The failure sentinel is the last object on the stream
            let sentinel = serde_json::json!({ "fatalError": err.to_string() });
            if let Ok(data) = serde_json::to_vec(&sentinel) {
                let _ = writer.write_all(&data).await;
            }
        }
        // Dropping the writer ends the chunked response body
    });

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, JSON_ROW_CONTENT_TYPE)
        .body(Body::from_stream(ReaderStream::new(reader)))
        .unwrap_or_else(|err| {
            error!(error = %err, "failed to build streaming response");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        })
}

/// Fallback for unknown routes
pub async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "Not Found")
}
