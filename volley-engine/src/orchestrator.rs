//! Scenario orchestration and NDJSON emission

use crate::error::EngineError;
use crate::generator::generator_for;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, info};
use volley_core::RequestScenario;
use volley_http::{Transport, TransportConfig};

/// Execute a scenario end to end, writing one response record per line.
///
/// Builds the process transport from the scenario options, then drives the
/// appropriate generator to exhaustion. The first fatal error aborts the run.
pub async fn execute_scenario<W>(
    scenario: &RequestScenario,
    writer: &mut W,
) -> Result<(), EngineError>
where
    W: AsyncWrite + Unpin + Send,
{
    let config = TransportConfig::default().insecure(scenario.options.insecure);
    let transport = Transport::new(config)?;
    execute_scenario_with(scenario, transport, writer).await
}

/// Execute a scenario over an existing transport.
pub async fn execute_scenario_with<W>(
    scenario: &RequestScenario,
    transport: Transport,
    writer: &mut W,
) -> Result<(), EngineError>
where
    W: AsyncWrite + Unpin + Send,
{
    if scenario.options.debug {
        debug!(
            "executing scenario:\n{}",
            serde_json::to_string_pretty(scenario)?
        );
    }
    info!(
        templates = scenario.requests.len(),
        bots = scenario.bots.len(),
        worker_idx = scenario.worker_idx,
        "executing scenario"
    );

    let mut generator = generator_for(scenario, transport);
    let mut emitted = 0u64;
    while let Some(batch) = generator.next_batch().await? {
        for record in &batch {
            let line = if scenario.options.pretty {
                serde_json::to_vec_pretty(record)?
            } else {
                serde_json::to_vec(record)?
            };
            writer.write_all(&line).await?;
            writer.write_all(b"\n").await?;
        }
        emitted += batch.len() as u64;
        writer.flush().await?;
    }

    info!(emitted, "scenario complete");
    Ok(())
}
