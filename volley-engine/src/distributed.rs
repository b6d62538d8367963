//! Distributed scenario execution across bot nodes

use crate::error::EngineError;
use crate::generator::ScenarioGenerator;
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;
use volley_core::{BotInfo, RequestScenario, ResponseInfo};
use volley_http::Transport;

/// Header carrying the bot credential
pub const API_KEY_HEADER: &str = "API-KEY";

/// In-flight records buffered between the bot tasks and the orchestrator
const CHANNEL_DEPTH: usize = 256;

/// Longest bot error body quoted back to the operator
const BODY_SNIPPET_LEN: usize = 512;

/// The mid-stream failure sentinel a bot appends to its NDJSON stream
#[derive(Debug, Deserialize)]
struct FatalLine {
    #[serde(rename = "fatalError")]
    fatal_error: String,
}

/// Fans a scenario out to its bots and multiplexes their NDJSON streams.
///
/// Each bot receives the scenario with the bot list cleared and a unique
/// `WorkerIdx`, which keeps per-template index ranges disjoint across bots.
/// Ordering across bots is not guaranteed; within one bot it matches the
/// bot's emission order. The first bot error terminates the run.
pub struct DistributedGenerator {
    records: mpsc::Receiver<Result<ResponseInfo, EngineError>>,
    tasks: Vec<JoinHandle<()>>,
    pending_error: Option<EngineError>,
}

impl DistributedGenerator {
    pub fn new(scenario: &RequestScenario, transport: Transport) -> Self {
        let (tx, records) = mpsc::channel(CHANNEL_DEPTH);

        let mut tasks = Vec::with_capacity(scenario.bots.len());
        for (bot_idx, bot) in scenario.bots.iter().enumerate() {
            let tx = tx.clone();
            let transport = transport.clone();
            let bot = bot.clone();
            let bot_scenario = scenario_for_bot(scenario, bot_idx);

            tasks.push(tokio::spawn(async move {
                if let Err(err) = stream_from_bot(&transport, &bot, bot_scenario, &tx).await {
                    let _ = tx.send(Err(err)).await;
                }
            }));
        }

        Self {
            records,
            tasks,
            pending_error: None,
        }
    }
}

#[async_trait]
impl ScenarioGenerator for DistributedGenerator {
    async fn next_batch(&mut self) -> Result<Option<Vec<ResponseInfo>>, EngineError> {
        // An error buffered behind an earlier batch surfaces once that batch
        // has been emitted
        if let Some(err) = self.pending_error.take() {
            return Err(err);
        }

        let first = match self.records.recv().await {
            Some(Ok(record)) => record,
            Some(Err(err)) => return Err(err),
            // All bot tasks completed and drained
            None => return Ok(None),
        };

        // Opportunistically drain whatever else has already arrived; records
        // a bot already produced still reach the output ahead of any failure
        let mut batch = vec![first];
        while let Ok(next) = self.records.try_recv() {
            match next {
                Ok(record) => batch.push(record),
                Err(err) => {
                    self.pending_error = Some(err);
                    break;
                }
            }
        }

        Ok(Some(batch))
    }
}

impl Drop for DistributedGenerator {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

/// The per-bot scenario: same plan, no bot list (a bot must not fan out
/// again), and the bot's slot as its worker index.
fn scenario_for_bot(scenario: &RequestScenario, worker_idx: usize) -> RequestScenario {
    let mut bot_scenario = scenario.clone();
    bot_scenario.bots = Vec::new();
    bot_scenario.worker_idx = worker_idx;
    bot_scenario
}

async fn stream_from_bot(
    transport: &Transport,
    bot: &BotInfo,
    scenario: RequestScenario,
    records: &mpsc::Sender<Result<ResponseInfo, EngineError>>,
) -> Result<(), EngineError> {
    let payload = serde_json::to_vec(&scenario)?;

    debug!(url = %bot.url, worker_idx = scenario.worker_idx, "dispatching scenario to bot");
    let response = transport
        .client()
        .post(&bot.url)
        .header(API_KEY_HEADER, &bot.api_key)
        .header(CONTENT_TYPE, "application/json")
        .body(payload)
        .send()
        .await
        .map_err(|e| bot_error(bot, format!("failed to reach bot: {}", e)))?;

    let status = response.status();
    if status != StatusCode::OK {
        let body = response.text().await.unwrap_or_default();
        let snippet: String = body.chars().take(BODY_SNIPPET_LEN).collect();
        return Err(bot_error(
            bot,
            format!("unexpected response status {}, body: {}", status, snippet),
        ));
    }

    // Reassemble NDJSON lines from the chunked body
    let mut stream = response.bytes_stream();
    let mut buffer: Vec<u8> = Vec::new();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| bot_error(bot, format!("stream read failed: {}", e)))?;
        buffer.extend_from_slice(&chunk);

        while let Some(newline) = buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = buffer.drain(..=newline).collect();
            forward_line(bot, &line[..line.len() - 1], records).await?;
        }
    }
    // The failure sentinel arrives without a trailing newline
    let rest = std::mem::take(&mut buffer);
    forward_line(bot, &rest, records).await?;

    debug!(url = %bot.url, "bot stream drained");
    Ok(())
}

async fn forward_line(
    bot: &BotInfo,
    line: &[u8],
    records: &mpsc::Sender<Result<ResponseInfo, EngineError>>,
) -> Result<(), EngineError> {
    if line.iter().all(u8::is_ascii_whitespace) {
        return Ok(());
    }

    // The sentinel shape is checked first: response records parse leniently
    if let Ok(fatal) = serde_json::from_slice::<FatalLine>(line) {
        return Err(bot_error(bot, fatal.fatal_error));
    }

    let record: ResponseInfo = serde_json::from_slice(line).map_err(|e| {
        bot_error(
            bot,
            format!(
                "invalid response line '{}': {}",
                String::from_utf8_lossy(line),
                e
            ),
        )
    })?;

    // A closed receiver means the run is already over; not an error here
    let _ = records.send(Ok(record)).await;
    Ok(())
}

fn bot_error(bot: &BotInfo, message: String) -> EngineError {
    EngineError::Bot {
        url: bot.url.clone(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use volley_core::RequestTemplate;

    #[test]
    fn test_scenario_for_bot_clears_bots_and_offsets_index() {
        let scenario = RequestScenario {
            bots: vec![
                BotInfo {
                    url: "http://bot0:3210/".to_string(),
                    api_key: "k".to_string(),
                },
                BotInfo {
                    url: "http://bot1:3210/".to_string(),
                    api_key: "k".to_string(),
                },
            ],
            requests: vec![RequestTemplate {
                url: "http://svc.local/".to_string(),
                count: 3,
                ..Default::default()
            }],
            ..Default::default()
        };

        let second = scenario_for_bot(&scenario, 1);
        assert!(second.bots.is_empty());
        assert_eq!(second.worker_idx, 1);
        assert_eq!(second.requests.len(), 1);
    }
}
